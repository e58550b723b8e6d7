//! Stratus web tier topology
//!
//! Declares the corporate web application stack: a two-subnet public VPC,
//! an SSH/HTTP security group, two identical web servers and an
//! internet-facing application load balancer.

pub mod config;
pub mod user_data;
pub mod web_tier;

pub use config::{ConfigError, TopologyConfig};
pub use web_tier::{TopologyError, build};
