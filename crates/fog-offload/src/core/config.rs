//! Run configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::common::ResourceBundle;

/// Holds raw configuration parsed from YAML.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawOffloadConfig {
    pub time_scale: Option<f64>,
    pub completion_timeout: Option<f64>,
    pub worker_threads: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub policy: Option<String>,
    pub edge_hosts: Option<Vec<HostConfig>>,
    pub cloud_hosts: Option<Vec<HostConfig>>,
}

/// Holds configuration of a single node or a set of identical nodes.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Node name.
    /// Should be set if count = 1.
    pub name: Option<String>,
    /// Node name prefix.
    /// Full name is produced by appending the node instance number to the prefix.
    /// Should be set if count > 1.
    pub name_prefix: Option<String>,
    /// Compute capacity in MIPS.
    pub mips: u64,
    /// Memory capacity.
    pub memory: u64,
    /// Network bandwidth capacity.
    pub bandwidth: u64,
    /// Storage capacity.
    pub storage: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Number of such nodes.
    pub count: Option<u32>,
}

impl HostConfig {
    /// Capacity vector of the configured node.
    pub fn capacity(&self) -> ResourceBundle {
        ResourceBundle::new(self.mips, self.memory, self.bandwidth, self.storage)
    }
}

/// Expands a host config entry into the names of its node instances.
pub fn expand_host_names(host: &HostConfig) -> Vec<String> {
    let count = host.count.unwrap_or(1);
    if count == 1 {
        if let Some(name) = &host.name {
            return vec![name.clone()];
        }
    }
    let prefix = host
        .name_prefix
        .clone()
        .or_else(|| host.name.clone())
        .unwrap_or_else(|| panic!("host config must set name or name_prefix"));
    (1..=count).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Represents the run configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct OffloadConfig {
    /// Wall-clock seconds per simulated second.
    pub time_scale: f64,
    /// Bound in simulated seconds on waiting for batch completion.
    pub completion_timeout: f64,
    /// Size of the shared worker pool executing admitted tasks.
    pub worker_threads: usize,
    /// Wait queue length below which a node counts as non-full for queuing fallbacks.
    pub queue_capacity: usize,
    /// Placement policy, e.g. "FCFS" or "CooperativeFCFS[queue_capacity=16]".
    pub policy: String,
    /// Configurations of edge nodes.
    pub edge_hosts: Vec<HostConfig>,
    /// Configurations of cloud nodes.
    pub cloud_hosts: Vec<HostConfig>,
}

impl OffloadConfig {
    /// Creates config by reading parameter values from a YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        Self::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
    }

    /// Creates config from a YAML string.
    pub fn from_str(content: &str) -> Self {
        let raw: RawOffloadConfig =
            serde_yaml::from_str(content).unwrap_or_else(|err| panic!("Can't parse YAML config: {}", err));

        Self {
            time_scale: raw.time_scale.unwrap_or(1.),
            completion_timeout: raw.completion_timeout.unwrap_or(60.),
            worker_threads: raw.worker_threads.unwrap_or(64),
            queue_capacity: raw.queue_capacity.unwrap_or(32),
            policy: raw.policy.unwrap_or_else(|| "FCFS".to_string()),
            edge_hosts: raw.edge_hosts.unwrap_or_default(),
            cloud_hosts: raw.cloud_hosts.unwrap_or_default(),
        }
    }
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.,
            completion_timeout: 60.,
            worker_threads: 64,
            queue_capacity: 32,
            policy: "FCFS".to_string(),
            edge_hosts: Vec::new(),
            cloud_hosts: Vec::new(),
        }
    }
}

/// Parses config value string, which consists of two parts, a name and an options string.
/// Example: CooperativeFCFS[queue_capacity=16] has name CooperativeFCFS and options
/// string "queue_capacity=16".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.to_string(), Some(r.to_string().replace(']', ""))),
        None => (config_str.to_string(), None),
    }
}

/// Parses options string from a config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.to_string(), value.to_string());
        }
    }
    options
}
