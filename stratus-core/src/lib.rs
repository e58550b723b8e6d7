//! Stratus Core
//!
//! Provider-neutral resource graphs: declare resources, parameters and
//! outputs as values, check them, and hand them to a provisioning engine.

pub mod cidr;
pub mod graph;
pub mod output;
pub mod parameter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod stack;
