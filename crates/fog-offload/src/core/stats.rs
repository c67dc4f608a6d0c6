//! Aggregation of run statistics.

use std::fs::File;

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::common::CompletionRecord;
use crate::core::registry::NodeRegistry;

/// Accumulated statistics for one node (or for the whole run in `totals`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeStats {
    pub tasks: usize,
    pub transmission_time: f64,
    pub processing_time: f64,
    pub queue_time: f64,
    pub total_time: f64,
    /// Executed work in instructions: node MIPS times processing time.
    pub workload: f64,
    /// Sum of task payload sizes.
    pub data_volume: u64,
    /// Sum of task bandwidth reservations.
    pub bandwidth: u64,
    /// Sum of task storage reservations.
    pub storage: u64,
    pub energy_wh: f64,
}

impl NodeStats {
    fn record(&mut self, record: &CompletionRecord, node_mips: u64) {
        self.tasks += 1;
        self.transmission_time += record.transmission_time;
        self.processing_time += record.processing_time;
        self.queue_time += record.queue_time;
        self.total_time += record.total_time;
        self.workload += node_mips as f64 * record.processing_time;
        self.data_volume += record.payload_size;
        self.bandwidth += record.resources.bandwidth;
        self.storage += record.resources.storage;
        self.energy_wh += record.power.energy_wh;
    }
}

/// Per-task average durations over all completed tasks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeAverages {
    pub transmission_time: f64,
    pub processing_time: f64,
    pub queue_time: f64,
    pub total_time: f64,
}

/// Aggregated results of a scheduling run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Number of tasks with a completion report.
    pub completed: usize,
    /// Names of tasks that could not be placed anywhere.
    pub failed: Vec<String>,
    /// Number of dispatched tasks still unresolved when the wait deadline expired.
    pub unresolved: usize,
    pub per_node: IndexMap<String, NodeStats>,
    pub totals: NodeStats,
    pub averages: TimeAverages,
}

impl RunStats {
    /// Builds run statistics from completion records.
    ///
    /// The registry is consulted for node compute capacities when computing
    /// executed workload.
    pub fn build(
        records: impl IntoIterator<Item = CompletionRecord>,
        failed: Vec<String>,
        unresolved: usize,
        registry: &NodeRegistry,
    ) -> Self {
        let mut per_node: IndexMap<String, NodeStats> = IndexMap::new();
        let mut totals = NodeStats::default();
        for record in records {
            let node_mips = registry
                .lookup(&record.node)
                .map(|node| node.spec().capacity.mips)
                .unwrap_or(0);
            per_node
                .entry(record.node.clone())
                .or_insert_with(NodeStats::default)
                .record(&record, node_mips);
            totals.record(&record, node_mips);
        }

        let averages = if totals.tasks > 0 {
            let count = totals.tasks as f64;
            TimeAverages {
                transmission_time: totals.transmission_time / count,
                processing_time: totals.processing_time / count,
                queue_time: totals.queue_time / count,
                total_time: totals.total_time / count,
            }
        } else {
            TimeAverages::default()
        };

        Self {
            completed: totals.tasks,
            failed,
            unresolved,
            per_node,
            totals,
            averages,
        }
    }

    /// Writes the statistics as pretty-printed JSON.
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::from)
    }
}
