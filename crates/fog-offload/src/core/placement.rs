//! Task placement policies.

use dyn_clone::{clone_trait_object, DynClone};

use crate::core::config::{parse_config_value, parse_options};
use crate::core::placement_algorithms::cooperative_fcfs::CooperativeFcfs;
use crate::core::placement_algorithms::fcfs::Fcfs;
use crate::core::placement_algorithms::min_completion_time::MinCompletionTime;
use crate::core::placement_algorithms::randomized::Randomized;
use crate::core::registry::NodeRegistry;
use crate::core::task::Task;

/// Default wait queue length below which a node counts as non-full.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Terminal outcome of one placement attempt.
///
/// Every call ends in exactly one of these states; a task is never silently
/// dropped. `Failed` is only possible when the applicable candidate set is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Assigned { node: String },
    Queued { node: String },
    Failed,
}

/// Trait for implementation of task placement policies.
///
/// A policy is given the task and the registry of candidate nodes and drives
/// the actual admission or queuing attempt, returning where the task ended up.
/// Variants differ in search order and admission aggressiveness.
pub trait PlacementPolicy: DynClone + Send + Sync {
    fn select_and_assign(&self, task: Task, registry: &NodeRegistry) -> PlacementOutcome;
}

clone_trait_object!(PlacementPolicy);

/// Resolves a policy config string such as `FCFS` or
/// `CooperativeFCFS[queue_capacity=16]` into a policy instance.
///
/// `queue_capacity` falls back to the provided default when the options string
/// does not override it.
pub fn placement_policy_resolver(config_str: &str, default_queue_capacity: usize) -> Box<dyn PlacementPolicy> {
    let (policy_name, options_str) = parse_config_value(config_str);
    let options = options_str.map(|s| parse_options(&s)).unwrap_or_default();
    let queue_capacity = options
        .get("queue_capacity")
        .map(|v| v.parse::<usize>().unwrap_or_else(|_| panic!("Bad queue_capacity in {}", config_str)))
        .unwrap_or(default_queue_capacity);

    match policy_name.as_str() {
        "FCFS" => Box::new(Fcfs::new(queue_capacity)),
        "CooperativeFCFS" => Box::new(CooperativeFcfs::new(queue_capacity)),
        "MinCompletionTime" => Box::new(MinCompletionTime::new()),
        "Randomized" => Box::new(Randomized::new(queue_capacity)),
        _ => panic!("Can't resolve placement policy: {}", config_str),
    }
}
