//! Spatial clustering of units into tactical groups

pub mod cluster;
pub mod clusterer;

pub use cluster::{Cluster, ClusterStatus};
pub use clusterer::UnitClusterer;
