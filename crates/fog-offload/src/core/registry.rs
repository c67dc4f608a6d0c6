//! Registry of edge and cloud nodes.

use std::cmp::Ordering;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

use threadpool::ThreadPool;

use crate::core::clock::SimClock;
use crate::core::common::CompletionRecord;
use crate::core::config::{expand_host_names, OffloadConfig};
use crate::core::execution::ExecutionSimulator;
use crate::core::geo::GeoPoint;
use crate::core::node::{NodeSpec, NodeTier, ResourceNode};

/// Explicit registry of all nodes in the fabric, constructed once at startup
/// and passed by handle to the scheduler and the placement policies.
///
/// Candidate views are ordered nearest-first by great-circle distance with a
/// deterministic tie-break on node name.
pub struct NodeRegistry {
    edge: Mutex<Vec<Arc<ResourceNode>>>,
    cloud: Mutex<Vec<Arc<ResourceNode>>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            edge: Mutex::new(Vec::new()),
            cloud: Mutex::new(Vec::new()),
        }
    }

    /// Builds the registry from static configuration.
    pub fn from_config(config: &OffloadConfig, simulator: &ExecutionSimulator, clock: SimClock, pool: &ThreadPool) -> Self {
        let registry = Self::new();
        for host in &config.edge_hosts {
            for name in expand_host_names(host) {
                registry.add_node(ResourceNode::new(
                    NodeSpec {
                        name,
                        tier: NodeTier::Edge,
                        capacity: host.capacity(),
                        location: GeoPoint::new(host.latitude, host.longitude),
                    },
                    simulator.clone(),
                    clock,
                    pool.clone(),
                ));
            }
        }
        for host in &config.cloud_hosts {
            for name in expand_host_names(host) {
                registry.add_node(ResourceNode::new(
                    NodeSpec {
                        name,
                        tier: NodeTier::Cloud,
                        capacity: host.capacity(),
                        location: GeoPoint::new(host.latitude, host.longitude),
                    },
                    simulator.clone(),
                    clock,
                    pool.clone(),
                ));
            }
        }
        registry
    }

    /// Adds a node to the tier recorded in its spec.
    pub fn add_node(&self, node: Arc<ResourceNode>) {
        match node.tier() {
            NodeTier::Edge => self.edge.lock().unwrap().push(node),
            NodeTier::Cloud => self.cloud.lock().unwrap().push(node),
        }
    }

    pub fn edge_nodes(&self) -> Vec<Arc<ResourceNode>> {
        self.edge.lock().unwrap().clone()
    }

    pub fn cloud_nodes(&self) -> Vec<Arc<ResourceNode>> {
        self.cloud.lock().unwrap().clone()
    }

    pub fn node_count(&self) -> usize {
        self.edge.lock().unwrap().len() + self.cloud.lock().unwrap().len()
    }

    /// Edge nodes ordered nearest-first from the given point.
    pub fn edge_by_distance(&self, point: &GeoPoint) -> Vec<Arc<ResourceNode>> {
        Self::by_distance(self.edge_nodes(), point)
    }

    /// Cloud nodes ordered nearest-first from the given point.
    pub fn cloud_by_distance(&self, point: &GeoPoint) -> Vec<Arc<ResourceNode>> {
        Self::by_distance(self.cloud_nodes(), point)
    }

    fn by_distance(mut nodes: Vec<Arc<ResourceNode>>, point: &GeoPoint) -> Vec<Arc<ResourceNode>> {
        nodes.sort_by(|a, b| {
            a.distance_to(point)
                .partial_cmp(&b.distance_to(point))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name().cmp(b.name()))
        });
        nodes
    }

    /// Looks up a node by name across both tiers.
    pub fn lookup(&self, name: &str) -> Option<Arc<ResourceNode>> {
        if let Some(node) = self.edge.lock().unwrap().iter().find(|node| node.name() == name) {
            return Some(node.clone());
        }
        self.cloud
            .lock()
            .unwrap()
            .iter()
            .find(|node| node.name() == name)
            .cloned()
    }

    /// Creates a single completion channel fed by every node in the registry.
    pub fn subscribe_all(&self) -> Receiver<CompletionRecord> {
        let (tx, rx) = channel();
        for node in self.edge_nodes().iter().chain(self.cloud_nodes().iter()) {
            node.add_listener(tx.clone());
        }
        rx
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
