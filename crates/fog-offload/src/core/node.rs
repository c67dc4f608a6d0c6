//! Resource node: admission, wait queue, release and completion reporting.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use crate::core::clock::SimClock;
use crate::core::common::{admission_verdict, AdmissionVerdict, CompletionRecord, ResourceBundle};
use crate::core::execution::{ExecutionSimulator, TaskTiming};
use crate::core::geo::{self, GeoPoint};
use crate::core::task::Task;

/// Distance within which an edge node is considered to serve its own region.
const EDGE_REGION_RADIUS_KM: f64 = 300.;

/// Distance up to which cloud connectivity is assumed to be backbone-grade.
const CLOUD_BACKBONE_RADIUS_KM: f64 = 2000.;

/// Tier of a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTier {
    Edge,
    Cloud,
}

impl NodeTier {
    /// Connectivity factor applied to the base transmission delay.
    ///
    /// Edge nodes are favored within their own region and penalized beyond it.
    /// Cloud nodes sit on backbone links and degrade only mildly with distance.
    pub fn network_factor(&self, distance_km: f64) -> f64 {
        match self {
            NodeTier::Edge => {
                if distance_km <= EDGE_REGION_RADIUS_KM {
                    0.8
                } else {
                    1.3
                }
            }
            NodeTier::Cloud => {
                if distance_km <= CLOUD_BACKBONE_RADIUS_KM {
                    1.0
                } else {
                    1.15
                }
            }
        }
    }
}

impl Display for NodeTier {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NodeTier::Edge => write!(f, "edge"),
            NodeTier::Cloud => write!(f, "cloud"),
        }
    }
}

/// Static properties of a node.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub tier: NodeTier,
    pub capacity: ResourceBundle,
    pub location: GeoPoint,
}

/// An in-flight task together with its reservation and timing.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub task: Task,
    pub reserved: ResourceBundle,
    pub start_time: f64,
    pub processing_time: f64,
    pub transmission_time: f64,
    pub queue_time: f64,
}

struct QueuedTask {
    task: Task,
    enqueued_at: f64,
}

struct NodeState {
    available: ResourceBundle,
    allocations: BTreeMap<u64, Allocation>,
    queue: VecDeque<QueuedTask>,
}

/// Read-only snapshot of a node's runtime state.
#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub capacity: ResourceBundle,
    pub available: ResourceBundle,
    pub used: ResourceBundle,
    pub queue_len: usize,
    pub active_tasks: usize,
}

/// A compute node with a fixed capacity vector, a set of running tasks and a
/// FIFO wait queue.
///
/// The admission check-and-reserve, the release path and the queue drain all
/// execute under the same internal lock, so concurrent callers never observe a
/// stale availability snapshot. Different nodes are fully independent.
///
/// Each admitted task is handed to a worker from the shared thread pool which
/// sleeps for the scaled processing duration and then releases the
/// reservation. Completions are reported through registered channel senders.
pub struct ResourceNode {
    spec: NodeSpec,
    state: Mutex<NodeState>,
    listeners: Mutex<Vec<Sender<CompletionRecord>>>,
    simulator: ExecutionSimulator,
    clock: SimClock,
    pool: Mutex<ThreadPool>,
}

impl ResourceNode {
    /// Creates a node with the given capacity, backed by the shared worker pool.
    pub fn new(spec: NodeSpec, simulator: ExecutionSimulator, clock: SimClock, pool: ThreadPool) -> Arc<Self> {
        let available = spec.capacity;
        Arc::new(Self {
            spec,
            state: Mutex::new(NodeState {
                available,
                allocations: BTreeMap::new(),
                queue: VecDeque::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            simulator,
            clock,
            pool: Mutex::new(pool),
        })
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn tier(&self) -> NodeTier {
        self.spec.tier
    }

    pub fn location(&self) -> &GeoPoint {
        &self.spec.location
    }

    /// Great-circle distance from the given point to this node in kilometers.
    pub fn distance_to(&self, point: &GeoPoint) -> f64 {
        geo::distance(point, &self.spec.location)
    }

    /// Checks whether the task currently fits into the available resources.
    /// The answer may be stale by the time an admission is attempted.
    pub fn can_admit(&self, task: &Task) -> bool {
        self.admission_check(task) == AdmissionVerdict::Success
    }

    /// Returns the first insufficient resource dimension, if any.
    pub fn admission_check(&self, task: &Task) -> AdmissionVerdict {
        let state = self.state.lock().unwrap();
        admission_verdict(&task.required, &state.available)
    }

    /// Atomically checks and reserves resources for the task.
    ///
    /// On success the task starts running immediately and `Some` computed
    /// timing is returned. On failure the node is left untouched and the task
    /// is not queued, so the caller may try other nodes.
    pub fn try_admit(self: &Arc<Self>, task: Task) -> Option<TaskTiming> {
        let mut state = self.state.lock().unwrap();
        if admission_verdict(&task.required, &state.available) != AdmissionVerdict::Success {
            return None;
        }
        let timing = self.simulator.compute_timing(&task, &self.spec);
        self.start_allocation(&mut state, task, timing, 0.);
        Some(timing)
    }

    /// Admits the task if it fits, otherwise appends it to the wait queue.
    ///
    /// Returns whether the task was accepted immediately and, if so, its
    /// estimated processing time.
    pub fn admit(self: &Arc<Self>, task: Task) -> (bool, f64) {
        let mut state = self.state.lock().unwrap();
        if admission_verdict(&task.required, &state.available) == AdmissionVerdict::Success {
            let timing = self.simulator.compute_timing(&task, &self.spec);
            self.start_allocation(&mut state, task, timing, 0.);
            (true, timing.processing_time)
        } else {
            debug!("node {}: queueing task {} ({})", self.spec.name, task.id, task.name);
            state.queue.push_back(QueuedTask {
                task,
                enqueued_at: self.clock.now(),
            });
            (false, 0.)
        }
    }

    /// Appends the task to the wait queue without an admission attempt.
    pub fn enqueue(&self, task: Task) {
        let mut state = self.state.lock().unwrap();
        debug!("node {}: queueing task {} ({})", self.spec.name, task.id, task.name);
        state.queue.push_back(QueuedTask {
            task,
            enqueued_at: self.clock.now(),
        });
    }

    /// Returns the reserved resources of the task, drains the wait queue in
    /// FIFO order and reports the completion to all listeners.
    ///
    /// Draining stops at the first queue head that still does not fit; the
    /// queue is never reordered.
    pub fn release(self: &Arc<Self>, task_id: u64) {
        let record = {
            let mut state = self.state.lock().unwrap();
            let alloc = match state.allocations.remove(&task_id) {
                Some(alloc) => alloc,
                None => {
                    warn!("node {}: release of unknown task {}", self.spec.name, task_id);
                    return;
                }
            };
            state.available.add(&alloc.reserved);
            debug!(
                "node {}: task {} ({}) finished, {} tasks still active",
                self.spec.name,
                alloc.task.id,
                alloc.task.name,
                state.allocations.len()
            );

            let now = self.clock.now();
            while let Some(head) = state.queue.front() {
                if admission_verdict(&head.task.required, &state.available) != AdmissionVerdict::Success {
                    break;
                }
                let queued = state.queue.pop_front().unwrap();
                let timing = self.simulator.compute_timing(&queued.task, &self.spec);
                let queue_time = (now - queued.enqueued_at).max(0.);
                self.start_allocation(&mut state, queued.task, timing, queue_time);
            }

            let load_factor = self.spec.capacity.used_fraction(&state.available);
            self.completion_record(&alloc, now, load_factor)
        };

        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            // A dropped receiver must not prevent release or draining.
            let _ = listener.send(record.clone());
        }
    }

    /// Registers a completion listener.
    pub fn add_listener(&self, listener: Sender<CompletionRecord>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Creates a dedicated completion channel fed by this node.
    pub fn subscribe(&self) -> Receiver<CompletionRecord> {
        let (tx, rx) = channel();
        self.add_listener(tx);
        rx
    }

    /// Returns a consistent snapshot of the node's runtime state.
    pub fn status(&self) -> NodeStatus {
        let state = self.state.lock().unwrap();
        let mut used = self.spec.capacity;
        used.sub(&state.available);
        NodeStatus {
            capacity: self.spec.capacity,
            available: state.available,
            used,
            queue_len: state.queue.len(),
            active_tasks: state.allocations.len(),
        }
    }

    /// Mean in-use fraction across the four resource dimensions.
    pub fn load_factor(&self) -> f64 {
        let state = self.state.lock().unwrap();
        self.spec.capacity.used_fraction(&state.available)
    }

    /// Deterministic timing estimate for the task on this node, without any
    /// resource reservation.
    pub fn expected_timing(&self, task: &Task) -> TaskTiming {
        self.simulator.expected_timing(task, &self.spec)
    }

    /// Predicts the completion time of the task on this node as the sum of the
    /// expected transmission and execution times, the remaining busy time of
    /// running tasks and the expected execution time of already queued work.
    ///
    /// The busy-until and queue snapshot is taken in a single lock acquisition.
    pub fn predicted_completion(&self, task: &Task) -> f64 {
        let timing = self.simulator.expected_timing(task, &self.spec);
        let state = self.state.lock().unwrap();
        let now = self.clock.now();
        let busy_until = state
            .allocations
            .values()
            .map(|alloc| (alloc.start_time + alloc.processing_time - now).max(0.))
            .fold(0., f64::max);
        let queued_work: f64 = state
            .queue
            .iter()
            .map(|entry| self.simulator.expected_timing(&entry.task, &self.spec).processing_time)
            .sum();
        timing.total() + busy_until + queued_work
    }

    /// Reserves resources and schedules the simulated run.
    /// Must be called under the state lock.
    fn start_allocation(self: &Arc<Self>, state: &mut NodeState, task: Task, timing: TaskTiming, queue_time: f64) {
        state.available.sub(&task.required);
        let task_id = task.id;
        debug!(
            "node {}: task {} ({}) started, processing time {:.3}s",
            self.spec.name, task.id, task.name, timing.processing_time
        );
        state.allocations.insert(
            task_id,
            Allocation {
                reserved: task.required,
                task,
                start_time: self.clock.now(),
                processing_time: timing.processing_time,
                transmission_time: timing.transmission_time,
                queue_time,
            },
        );

        let node = Arc::clone(self);
        let sleep = self.clock.to_wall(timing.processing_time);
        self.pool.lock().unwrap().execute(move || {
            thread::sleep(sleep);
            node.release(task_id);
        });
    }

    fn completion_record(&self, alloc: &Allocation, now: f64, load_factor: f64) -> CompletionRecord {
        let timing = TaskTiming {
            processing_time: alloc.processing_time,
            transmission_time: alloc.transmission_time,
        };
        let power = self
            .simulator
            .power_estimate(&timing, alloc.queue_time, self.spec.tier, load_factor);
        CompletionRecord {
            task_id: alloc.task.id,
            task_name: alloc.task.name.clone(),
            node: self.spec.name.clone(),
            processing_time: alloc.processing_time,
            transmission_time: alloc.transmission_time,
            queue_time: alloc.queue_time,
            total_time: alloc.processing_time + alloc.transmission_time + alloc.queue_time,
            finish_time: now,
            payload_size: alloc.task.size,
            resources: alloc.task.required,
            power,
        }
    }
}
