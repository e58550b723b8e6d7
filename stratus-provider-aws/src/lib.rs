//! Stratus AWS Provider
//!
//! Schemas for the EC2 and ELBv2 resource types, synthesis to
//! CloudFormation templates, and the CloudFormation deployment engine.

pub mod case_convert;
pub mod cloudformation;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod synth;

pub use cloudformation::CloudFormationEngine;
pub use provider::AwsProvider;
