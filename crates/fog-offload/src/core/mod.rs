pub mod clock;
pub mod common;
pub mod config;
pub mod execution;
pub mod geo;
pub mod node;
pub mod placement;
pub mod placement_algorithms;
pub mod power_model;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod task;
