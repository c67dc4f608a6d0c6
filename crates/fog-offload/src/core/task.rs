//! Representations of tasks and their status.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::common::ResourceBundle;
use crate::core::geo::GeoPoint;

/// Category tag of a task. Bulk and large transfers are routed to the cloud tier only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Standard,
    Bulk,
    Large,
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::Standard
    }
}

impl TaskCategory {
    /// Whether tasks of this category must bypass edge nodes entirely.
    pub fn cloud_only(&self) -> bool {
        matches!(self, TaskCategory::Bulk | TaskCategory::Large)
    }
}

/// Status of a task as tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TaskStatus {
    Pending,
    Admitted,
    Queued,
    Running,
    Completed,
    Failed,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Admitted => write!(f, "admitted"),
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Raw task record as supplied by the caller at ingestion.
///
/// Resource requirements are expressed in the same units as node capacities.
/// The storage requirement may be omitted, in which case it is derived from
/// the payload size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    /// Optional externally supplied identifier, kept as display metadata only.
    pub id: Option<u64>,
    #[serde(default)]
    pub arrival_time: f64,
    /// Payload size in million instructions, also used as the transfer volume.
    pub size: u64,
    pub mips: u64,
    pub memory: u64,
    pub bandwidth: u64,
    pub storage: Option<u64>,
    #[serde(default)]
    pub category: TaskCategory,
    pub latitude: f64,
    pub longitude: f64,
}

impl TaskRequest {
    /// Converts the request into an engine task under the given synthesized identity.
    pub fn into_task(self, id: u64) -> Task {
        let storage = self.storage.unwrap_or_else(|| derived_storage(self.size));
        Task {
            id,
            external_id: self.id,
            name: self.name,
            arrival_time: self.arrival_time,
            size: self.size,
            required: ResourceBundle::new(self.mips, self.memory, self.bandwidth, storage),
            category: self.category,
            location: GeoPoint::new(self.latitude, self.longitude),
        }
    }
}

/// Derives the storage requirement from the payload size: the payload itself
/// plus 20% scratch space.
pub fn derived_storage(size: u64) -> u64 {
    size + size / 5
}

/// Task record used throughout the engine.
///
/// The `id` is synthesized at ingestion and unique within a run. It is the only
/// identity used for completion bookkeeping, so tasks with colliding display
/// names are still counted separately.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u64,
    pub external_id: Option<u64>,
    pub name: String,
    pub arrival_time: f64,
    pub size: u64,
    pub required: ResourceBundle,
    pub category: TaskCategory,
    pub location: GeoPoint,
}
