//! Execution timing and power estimation.

use rand::{thread_rng, Rng};
use serde::Serialize;

use crate::core::common::PowerEstimate;
use crate::core::geo;
use crate::core::node::{NodeSpec, NodeTier};
use crate::core::power_model::{default_cloud_power_model, default_edge_power_model, NodePowerModel};
use crate::core::task::Task;

// Overhead fraction bands applied on top of the base execution time.
const CPU_OVERHEAD: (f64, f64) = (0.20, 0.40);
const MEMORY_OVERHEAD: (f64, f64) = (0.15, 0.30);
const SYSTEM_LOAD_OVERHEAD: (f64, f64) = (0.10, 0.25);
const CACHE_MISS_OVERHEAD: (f64, f64) = (0.05, 0.15);
const IO_WAIT_OVERHEAD: (f64, f64) = (0.05, 0.20);

/// Overall processing time jitter band.
const PROCESSING_JITTER: (f64, f64) = (0.85, 1.15);

/// Transmission jitter magnitude band, applied with a random sign.
const TRANSMISSION_JITTER: (f64, f64) = (0.10, 0.20);

/// Controls how execution overhead fractions are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverheadModel {
    /// Band midpoints, no jitter. Used for deterministic scoring and tests.
    Expected,
    /// Independent uniform draws within each band for every task.
    Sampled,
}

/// Computed timing of a single task execution on a specific node.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TaskTiming {
    pub processing_time: f64,
    pub transmission_time: f64,
}

impl TaskTiming {
    pub fn total(&self) -> f64 {
        self.processing_time + self.transmission_time
    }
}

/// Computes processing and transmission times of tasks on nodes and estimates
/// the resulting power consumption.
///
/// Processing time starts from `size / mips` and is inflated by overhead
/// fractions modelling CPU contention, memory access, background system load,
/// cache misses and I/O waits. Transmission time is derived from the
/// great-circle distance between the task origin and the node.
#[derive(Clone)]
pub struct ExecutionSimulator {
    overheads: OverheadModel,
    edge_power: Box<dyn NodePowerModel>,
    cloud_power: Box<dyn NodePowerModel>,
}

impl ExecutionSimulator {
    /// Creates simulator with default power models.
    pub fn new(overheads: OverheadModel) -> Self {
        Self {
            overheads,
            edge_power: default_edge_power_model(),
            cloud_power: default_cloud_power_model(),
        }
    }

    /// Creates simulator with custom power models per node tier.
    pub fn with_power_models(
        overheads: OverheadModel,
        edge_power: Box<dyn NodePowerModel>,
        cloud_power: Box<dyn NodePowerModel>,
    ) -> Self {
        Self {
            overheads,
            edge_power,
            cloud_power,
        }
    }

    pub fn overhead_model(&self) -> OverheadModel {
        self.overheads
    }

    /// Computes processing and transmission times for the task on the given node.
    pub fn compute_timing(&self, task: &Task, spec: &NodeSpec) -> TaskTiming {
        self.timing_with(task, spec, self.overheads)
    }

    /// Deterministic timing using expected overhead fractions, regardless of
    /// the configured overhead model. Used by scoring policies.
    pub fn expected_timing(&self, task: &Task, spec: &NodeSpec) -> TaskTiming {
        self.timing_with(task, spec, OverheadModel::Expected)
    }

    fn timing_with(&self, task: &Task, spec: &NodeSpec, model: OverheadModel) -> TaskTiming {
        let base = task.size as f64 / spec.capacity.mips.max(1) as f64;
        let overhead = band(model, CPU_OVERHEAD)
            + band(model, MEMORY_OVERHEAD)
            + band(model, SYSTEM_LOAD_OVERHEAD)
            + band(model, CACHE_MISS_OVERHEAD)
            + band(model, IO_WAIT_OVERHEAD);
        let jitter = match model {
            OverheadModel::Expected => 1.,
            OverheadModel::Sampled => thread_rng().gen_range(PROCESSING_JITTER.0..=PROCESSING_JITTER.1),
        };
        let processing_time = base * (1. + overhead) * jitter;

        let dist = geo::distance(&task.location, &spec.location);
        let base_delay = geo::transmission_delay(dist, task.size, spec.capacity.bandwidth);
        let transmission_time = base_delay * spec.tier.network_factor(dist) * transmission_jitter(model);

        TaskTiming {
            processing_time,
            transmission_time,
        }
    }

    /// Estimates the average power draw and total energy consumed by a task.
    ///
    /// The node power model is evaluated at a blend of the node's current load
    /// factor and the fraction of the task's total time spent executing, so
    /// time spent waiting in queue or in transfer weighs less than execution.
    pub fn power_estimate(
        &self,
        timing: &TaskTiming,
        queue_time: f64,
        tier: NodeTier,
        load_factor: f64,
    ) -> PowerEstimate {
        let total_time = timing.total() + queue_time;
        let busy_fraction = if total_time > 0. {
            timing.processing_time / total_time
        } else {
            0.
        };
        let load = (0.5 * load_factor + 0.5 * busy_fraction).clamp(0., 1.);
        let model = match tier {
            NodeTier::Edge => &self.edge_power,
            NodeTier::Cloud => &self.cloud_power,
        };
        let average_watts = model.power(load);
        PowerEstimate {
            average_watts,
            energy_wh: average_watts * total_time / 3600.,
        }
    }
}

fn band(model: OverheadModel, (lo, hi): (f64, f64)) -> f64 {
    match model {
        OverheadModel::Expected => (lo + hi) / 2.,
        OverheadModel::Sampled => thread_rng().gen_range(lo..=hi),
    }
}

fn transmission_jitter(model: OverheadModel) -> f64 {
    match model {
        OverheadModel::Expected => 1.,
        OverheadModel::Sampled => {
            let mut rng = thread_rng();
            let magnitude = rng.gen_range(TRANSMISSION_JITTER.0..=TRANSMISSION_JITTER.1);
            if rng.gen_bool(0.5) {
                1. + magnitude
            } else {
                1. - magnitude
            }
        }
    }
}
