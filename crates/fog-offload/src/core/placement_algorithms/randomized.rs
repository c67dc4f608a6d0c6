//! Randomized-variance placement.

use crate::core::placement::{PlacementOutcome, PlacementPolicy};
use crate::core::placement_algorithms::fcfs::Fcfs;
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

/// Same control flow as [`Fcfs`], run against per-task sampled execution
/// overheads, so identical tasks on identical nodes yield different timings.
///
/// Exists to exercise the engine under non-deterministic timing; the placement
/// search itself is not randomized.
#[derive(Clone)]
pub struct Randomized {
    inner: Fcfs,
}

impl Randomized {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Fcfs::new(queue_capacity),
        }
    }
}

impl PlacementPolicy for Randomized {
    fn select_and_assign(&self, task: Task, registry: &NodeRegistry) -> PlacementOutcome {
        self.inner.select_and_assign(task, registry)
    }
}
