//! Cooperative first-come-first-serve placement.

use crate::core::placement::{PlacementOutcome, PlacementPolicy};
use crate::core::placement_algorithms::cloud_fallback;
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

/// Tries up to the two nearest edge nodes before falling through to the cloud
/// tier, so neighboring edge nodes cooperate on overflow.
///
/// Each edge attempt is gated by an explicit admission check before the
/// reservation is tried. Cloud-only categories skip the edge attempts.
#[derive(Clone)]
pub struct CooperativeFcfs {
    queue_capacity: usize,
}

impl CooperativeFcfs {
    pub fn new(queue_capacity: usize) -> Self {
        Self { queue_capacity }
    }
}

impl PlacementPolicy for CooperativeFcfs {
    fn select_and_assign(&self, task: Task, registry: &NodeRegistry) -> PlacementOutcome {
        if !task.category.cloud_only() {
            for edge in registry.edge_by_distance(&task.location).iter().take(2) {
                if edge.can_admit(&task) {
                    if edge.try_admit(task.clone()).is_some() {
                        return PlacementOutcome::Assigned {
                            node: edge.name().to_string(),
                        };
                    }
                }
            }
        }
        cloud_fallback(task, registry, self.queue_capacity)
    }
}
