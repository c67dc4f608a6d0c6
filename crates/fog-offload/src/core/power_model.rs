//! Node power consumption models.

use dyn_clone::{clone_trait_object, DynClone};

/// Power model is a function which computes the power draw of a node based on
/// its current load fraction.
pub trait NodePowerModel: DynClone + Send + Sync {
    /// Returns the power draw in watts at the given load in `[0, 1]`.
    fn power(&self, load: f64) -> f64;
}

clone_trait_object!(NodePowerModel);

/// Linear power model interpolating between idle and peak power.
#[derive(Clone)]
pub struct LinearPowerModel {
    idle_power: f64,
    max_power: f64,
}

impl LinearPowerModel {
    /// Creates linear model with the specified idle and peak power in watts.
    pub fn new(idle_power: f64, max_power: f64) -> Self {
        Self { idle_power, max_power }
    }
}

impl NodePowerModel for LinearPowerModel {
    fn power(&self, load: f64) -> f64 {
        self.idle_power + load.clamp(0., 1.) * (self.max_power - self.idle_power)
    }
}

/// Default model for edge nodes (small form factor hardware).
pub fn default_edge_power_model() -> Box<dyn NodePowerModel> {
    Box::new(LinearPowerModel::new(25., 90.))
}

/// Default model for cloud nodes (rack servers).
pub fn default_cloud_power_model() -> Box<dyn NodePowerModel> {
    Box::new(LinearPowerModel::new(120., 450.))
}
