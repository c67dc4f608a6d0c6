//! Placement policy implementations.

pub mod cooperative_fcfs;
pub mod fcfs;
pub mod min_completion_time;
pub mod randomized;

use log::error;

use crate::core::placement::PlacementOutcome;
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

/// Shared cloud fallback: try every cloud node nearest-first, then queue at
/// the first cloud whose wait queue is below `queue_capacity`, then at the
/// nearest cloud regardless of fullness. An edge-eligible task with no clouds
/// available queues at its nearest edge node instead.
///
/// Returns `Failed` only when the applicable candidate set is empty.
pub(crate) fn cloud_fallback(task: Task, registry: &NodeRegistry, queue_capacity: usize) -> PlacementOutcome {
    let clouds = registry.cloud_by_distance(&task.location);

    for node in &clouds {
        if node.try_admit(task.clone()).is_some() {
            return PlacementOutcome::Assigned {
                node: node.name().to_string(),
            };
        }
    }
    for node in &clouds {
        if node.status().queue_len < queue_capacity {
            let name = node.name().to_string();
            node.enqueue(task);
            return PlacementOutcome::Queued { node: name };
        }
    }
    if let Some(node) = clouds.first() {
        let name = node.name().to_string();
        node.enqueue(task);
        return PlacementOutcome::Queued { node: name };
    }

    if !task.category.cloud_only() {
        if let Some(node) = registry.edge_by_distance(&task.location).first() {
            let name = node.name().to_string();
            node.enqueue(task);
            return PlacementOutcome::Queued { node: name };
        }
    }

    error!("no candidate nodes for task {} ({})", task.id, task.name);
    PlacementOutcome::Failed
}
