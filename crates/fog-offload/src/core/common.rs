//! Common types shared across the engine.

use serde::{Deserialize, Serialize};

/// Four-dimensional resource vector used both for node capacities and task requirements.
///
/// Compute capacity is expressed in MIPS, the remaining dimensions in abstract
/// units (typically MB and Mbps).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub mips: u64,
    pub memory: u64,
    pub bandwidth: u64,
    pub storage: u64,
}

impl ResourceBundle {
    pub fn new(mips: u64, memory: u64, bandwidth: u64, storage: u64) -> Self {
        Self {
            mips,
            memory,
            bandwidth,
            storage,
        }
    }

    /// Checks whether every dimension of this bundle fits within `other`.
    pub fn fits_within(&self, other: &ResourceBundle) -> bool {
        self.mips <= other.mips
            && self.memory <= other.memory
            && self.bandwidth <= other.bandwidth
            && self.storage <= other.storage
    }

    /// Adds `other` to this bundle in place.
    pub fn add(&mut self, other: &ResourceBundle) {
        self.mips += other.mips;
        self.memory += other.memory;
        self.bandwidth += other.bandwidth;
        self.storage += other.storage;
    }

    /// Subtracts `other` from this bundle in place.
    /// The caller must have checked `other.fits_within(self)` first.
    pub fn sub(&mut self, other: &ResourceBundle) {
        self.mips -= other.mips;
        self.memory -= other.memory;
        self.bandwidth -= other.bandwidth;
        self.storage -= other.storage;
    }

    /// Returns the mean used fraction across all dimensions given the amounts
    /// still available out of this bundle treated as total capacity.
    pub fn used_fraction(&self, available: &ResourceBundle) -> f64 {
        let dim = |total: u64, avail: u64| {
            if total == 0 {
                0.
            } else {
                1. - avail as f64 / total as f64
            }
        };
        (dim(self.mips, available.mips)
            + dim(self.memory, available.memory)
            + dim(self.bandwidth, available.bandwidth)
            + dim(self.storage, available.storage))
            / 4.
    }
}

/// Result of checking a task's requirements against a node's available resources.
#[derive(Debug, PartialEq, Eq)]
pub enum AdmissionVerdict {
    NotEnoughCpu,
    NotEnoughMemory,
    NotEnoughBandwidth,
    NotEnoughStorage,
    Success,
}

/// Returns the admission verdict for the given requirement against the given availability,
/// reporting the first insufficient dimension.
pub fn admission_verdict(required: &ResourceBundle, available: &ResourceBundle) -> AdmissionVerdict {
    if required.mips > available.mips {
        return AdmissionVerdict::NotEnoughCpu;
    }
    if required.memory > available.memory {
        return AdmissionVerdict::NotEnoughMemory;
    }
    if required.bandwidth > available.bandwidth {
        return AdmissionVerdict::NotEnoughBandwidth;
    }
    if required.storage > available.storage {
        return AdmissionVerdict::NotEnoughStorage;
    }
    AdmissionVerdict::Success
}

/// Estimated power consumption of a single task execution.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PowerEstimate {
    /// Average power draw attributed to the task, in watts.
    pub average_watts: f64,
    /// Cumulative energy consumed over the task's total time, in watt-hours.
    pub energy_wh: f64,
}

/// Produced once per completed task and delivered to completion listeners.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRecord {
    pub task_id: u64,
    pub task_name: String,
    pub node: String,
    pub processing_time: f64,
    pub transmission_time: f64,
    pub queue_time: f64,
    pub total_time: f64,
    /// Simulated time at which the task finished.
    pub finish_time: f64,
    pub payload_size: u64,
    pub resources: ResourceBundle,
    pub power: PowerEstimate,
}
