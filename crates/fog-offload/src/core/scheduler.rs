//! Orchestrator driving placement and completion bookkeeping for task batches.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::core::clock::SimClock;
use crate::core::common::CompletionRecord;
use crate::core::placement::{PlacementOutcome, PlacementPolicy};
use crate::core::registry::NodeRegistry;
use crate::core::stats::RunStats;
use crate::core::task::{Task, TaskRequest, TaskStatus};

/// Ingests a batch of tasks, applies the placement policy to each in arrival
/// order and waits for completion reports from the nodes.
///
/// A single completion channel is subscribed to every node; records are
/// de-duplicated by the synthesized task identity, so a node reporting the
/// same task twice is counted once. The wait for batch completion is bounded
/// by the configured timeout, after which the remaining tasks are reported as
/// unresolved instead of hanging the run.
pub struct OffloadScheduler {
    registry: Arc<NodeRegistry>,
    policy: Box<dyn PlacementPolicy>,
    clock: SimClock,
    /// Bound in simulated seconds on waiting for batch completion.
    completion_timeout: f64,
    completion_rx: Option<Receiver<CompletionRecord>>,
    next_task_id: u64,
}

impl OffloadScheduler {
    /// Creates scheduler with the specified placement policy.
    pub fn new(
        registry: Arc<NodeRegistry>,
        policy: Box<dyn PlacementPolicy>,
        clock: SimClock,
        completion_timeout: f64,
    ) -> Self {
        Self {
            registry,
            policy,
            clock,
            completion_timeout,
            completion_rx: None,
            next_task_id: 1,
        }
    }

    /// Runs the batch to completion and returns aggregated statistics.
    pub fn run(&mut self, batch: Vec<TaskRequest>) -> RunStats {
        let tasks = self.ingest(batch);
        let mut statuses: BTreeMap<u64, TaskStatus> = BTreeMap::new();
        let mut failed: Vec<String> = Vec::new();
        let mut expected = 0usize;

        // Subscribe before dispatching so no completion can be missed.
        if self.completion_rx.is_none() {
            self.completion_rx = Some(self.registry.subscribe_all());
        }

        for task in tasks {
            let task_id = task.id;
            let task_name = task.name.clone();
            match self.policy.select_and_assign(task, &self.registry) {
                PlacementOutcome::Assigned { node } => {
                    info!("task {} ({}) assigned to node {}", task_id, task_name, node);
                    statuses.insert(task_id, TaskStatus::Admitted);
                    expected += 1;
                }
                PlacementOutcome::Queued { node } => {
                    info!("task {} ({}) queued at node {}", task_id, task_name, node);
                    statuses.insert(task_id, TaskStatus::Queued);
                    expected += 1;
                }
                PlacementOutcome::Failed => {
                    warn!("task {} ({}) could not be placed anywhere", task_id, task_name);
                    statuses.insert(task_id, TaskStatus::Failed);
                    failed.push(task_name);
                }
            }
        }

        let records = self.await_completions(expected, &mut statuses);
        let unresolved = expected - records.len();
        if unresolved > 0 {
            warn!(
                "batch finished with {} of {} tasks unresolved",
                unresolved, expected
            );
        }
        RunStats::build(records.into_values(), failed, unresolved, &self.registry)
    }

    /// Assigns synthesized identities and sorts the batch by arrival time.
    fn ingest(&mut self, batch: Vec<TaskRequest>) -> Vec<Task> {
        let mut tasks: Vec<Task> = batch
            .into_iter()
            .map(|request| {
                let id = self.next_task_id;
                self.next_task_id += 1;
                request.into_task(id)
            })
            .collect();
        tasks.sort_by(|a, b| {
            a.arrival_time
                .partial_cmp(&b.arrival_time)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    /// Collects completion records until the expected count is reached or the
    /// deadline expires.
    fn await_completions(
        &mut self,
        expected: usize,
        statuses: &mut BTreeMap<u64, TaskStatus>,
    ) -> BTreeMap<u64, CompletionRecord> {
        let mut records: BTreeMap<u64, CompletionRecord> = BTreeMap::new();
        let rx = match &self.completion_rx {
            Some(rx) => rx,
            None => return records,
        };
        let deadline = Instant::now() + self.clock.to_wall(self.completion_timeout);

        while records.len() < expected {
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) => remaining,
                None => {
                    warn!("completion wait deadline expired");
                    break;
                }
            };
            match rx.recv_timeout(remaining) {
                Ok(record) => {
                    if records.contains_key(&record.task_id) {
                        warn!(
                            "duplicate completion report for task {} from node {}, ignored",
                            record.task_id, record.node
                        );
                        continue;
                    }
                    statuses.insert(record.task_id, TaskStatus::Completed);
                    records.insert(record.task_id, record);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("completion wait deadline expired");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        records
    }
}
