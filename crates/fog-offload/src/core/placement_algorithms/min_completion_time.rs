//! Minimum completion time placement.

use std::cmp::Ordering;
use std::sync::Arc;

use log::error;

use crate::core::node::ResourceNode;
use crate::core::placement::{PlacementOutcome, PlacementPolicy};
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

// Relative weights of the edge scoring components. Resource availability
// dominates, then expected processing time, then expected transmission time.
const RESOURCE_WEIGHT: f64 = 0.5;
const PROCESSING_WEIGHT: f64 = 0.3;
const TRANSMISSION_WEIGHT: f64 = 0.2;

/// Scores every edge node by a weighted blend of resource availability and
/// expected timing, predicts completion time on every cloud node, and assigns
/// the task to whichever of the two winners completes sooner.
///
/// All estimates use expected (deterministic) overhead fractions. On admission
/// failure at the chosen node the task is queued there.
#[derive(Clone)]
pub struct MinCompletionTime;

impl MinCompletionTime {
    pub fn new() -> Self {
        Self {}
    }

    fn edge_score(node: &ResourceNode, task: &Task) -> f64 {
        let status = node.status();
        let availability = 1. - status.capacity.used_fraction(&status.available);
        let timing = node.expected_timing(task);
        RESOURCE_WEIGHT * availability
            + PROCESSING_WEIGHT / (1. + timing.processing_time)
            + TRANSMISSION_WEIGHT / (1. + timing.transmission_time)
    }
}

impl Default for MinCompletionTime {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementPolicy for MinCompletionTime {
    fn select_and_assign(&self, task: Task, registry: &NodeRegistry) -> PlacementOutcome {
        // Candidates are nearest-first, so strict comparisons keep the nearer
        // node on score ties.
        let mut best_edge: Option<(Arc<ResourceNode>, f64)> = None;
        if !task.category.cloud_only() {
            for node in registry.edge_by_distance(&task.location) {
                let score = Self::edge_score(&node, &task);
                if best_edge
                    .as_ref()
                    .map_or(true, |(_, best)| score.partial_cmp(best) == Some(Ordering::Greater))
                {
                    best_edge = Some((node, score));
                }
            }
        }

        let mut best_cloud: Option<(Arc<ResourceNode>, f64)> = None;
        for node in registry.cloud_by_distance(&task.location) {
            let predicted = node.predicted_completion(&task);
            if best_cloud
                .as_ref()
                .map_or(true, |(_, best)| predicted.partial_cmp(best) == Some(Ordering::Less))
            {
                best_cloud = Some((node, predicted));
            }
        }

        let chosen = match (&best_edge, &best_cloud) {
            (Some((edge, _)), Some((cloud, cloud_time))) => {
                if edge.predicted_completion(&task) <= *cloud_time {
                    Arc::clone(edge)
                } else {
                    Arc::clone(cloud)
                }
            }
            (Some((edge, _)), None) => Arc::clone(edge),
            (None, Some((cloud, _))) => Arc::clone(cloud),
            (None, None) => {
                error!("no candidate nodes for task {} ({})", task.id, task.name);
                return PlacementOutcome::Failed;
            }
        };

        let name = chosen.name().to_string();
        if chosen.try_admit(task.clone()).is_some() {
            PlacementOutcome::Assigned { node: name }
        } else {
            chosen.enqueue(task);
            PlacementOutcome::Queued { node: name }
        }
    }
}
