//! High-level facade wiring the registry, policy and scheduler together.

use std::sync::Arc;

use threadpool::ThreadPool;

use crate::core::clock::SimClock;
use crate::core::config::OffloadConfig;
use crate::core::execution::{ExecutionSimulator, OverheadModel};
use crate::core::node::{NodeSpec, NodeStatus, NodeTier, ResourceNode};
use crate::core::placement::placement_policy_resolver;
use crate::core::registry::NodeRegistry;
use crate::core::scheduler::OffloadScheduler;
use crate::core::stats::RunStats;
use crate::core::task::TaskRequest;
use crate::core::common::ResourceBundle;
use crate::core::geo::GeoPoint;

/// Ready-to-run offloading setup built from an [`OffloadConfig`].
///
/// Owns the worker pool, the clock, the node registry and the scheduler.
/// Nodes beyond the configured ones can be added before the first run.
pub struct FogSimulation {
    config: OffloadConfig,
    clock: SimClock,
    pool: ThreadPool,
    simulator: ExecutionSimulator,
    registry: Arc<NodeRegistry>,
    scheduler: OffloadScheduler,
}

impl FogSimulation {
    /// Builds the fabric described by the config with sampled execution overheads.
    pub fn new(config: OffloadConfig) -> Self {
        let clock = SimClock::new(config.time_scale);
        let pool = ThreadPool::new(config.worker_threads);
        let simulator = ExecutionSimulator::new(OverheadModel::Sampled);
        let registry = Arc::new(NodeRegistry::from_config(&config, &simulator, clock, &pool));
        let policy = placement_policy_resolver(&config.policy, config.queue_capacity);
        let scheduler = OffloadScheduler::new(Arc::clone(&registry), policy, clock, config.completion_timeout);
        Self {
            config,
            clock,
            pool,
            simulator,
            registry,
            scheduler,
        }
    }

    /// Adds an edge node to the fabric.
    pub fn add_edge_host(&self, name: &str, capacity: ResourceBundle, location: GeoPoint) -> Arc<ResourceNode> {
        self.add_host(name, NodeTier::Edge, capacity, location)
    }

    /// Adds a cloud node to the fabric.
    pub fn add_cloud_host(&self, name: &str, capacity: ResourceBundle, location: GeoPoint) -> Arc<ResourceNode> {
        self.add_host(name, NodeTier::Cloud, capacity, location)
    }

    fn add_host(&self, name: &str, tier: NodeTier, capacity: ResourceBundle, location: GeoPoint) -> Arc<ResourceNode> {
        let node = ResourceNode::new(
            NodeSpec {
                name: name.to_string(),
                tier,
                capacity,
                location,
            },
            self.simulator.clone(),
            self.clock,
            self.pool.clone(),
        );
        self.registry.add_node(Arc::clone(&node));
        node
    }

    /// Runs a batch of tasks to completion and returns aggregated statistics.
    pub fn run(&mut self, batch: Vec<TaskRequest>) -> RunStats {
        self.scheduler.run(batch)
    }

    /// Returns the runtime status of the named node.
    pub fn node_status(&self, name: &str) -> Option<NodeStatus> {
        self.registry.lookup(name).map(|node| node.status())
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }
}
