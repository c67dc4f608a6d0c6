//! First-come-first-serve placement.

use crate::core::placement::{PlacementOutcome, PlacementPolicy};
use crate::core::placement_algorithms::cloud_fallback;
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

/// Tries the single nearest edge node, then falls through to the cloud tier.
///
/// The caller is expected to dispatch tasks in arrival order. Cloud-only
/// categories skip the edge attempt entirely.
#[derive(Clone)]
pub struct Fcfs {
    queue_capacity: usize,
}

impl Fcfs {
    pub fn new(queue_capacity: usize) -> Self {
        Self { queue_capacity }
    }
}

impl PlacementPolicy for Fcfs {
    fn select_and_assign(&self, task: Task, registry: &NodeRegistry) -> PlacementOutcome {
        if !task.category.cloud_only() {
            if let Some(edge) = registry.edge_by_distance(&task.location).first() {
                if edge.try_admit(task.clone()).is_some() {
                    return PlacementOutcome::Assigned {
                        node: edge.name().to_string(),
                    };
                }
            }
        }
        cloud_fallback(task, registry, self.queue_capacity)
    }
}
