//! AWS resource schema definitions

pub mod ec2;
pub mod elbv2;
pub mod types;

use stratus_core::schema::ResourceSchema;

/// AWS schema configuration
///
/// Combines the ResourceSchema with the CloudFormation metadata needed
/// to render it.
pub struct AwsSchemaConfig {
    /// AWS CloudFormation type name (e.g., "AWS::EC2::VPC")
    pub aws_type_name: &'static str,
    /// Stratus resource type name (e.g., "ec2.vpc")
    pub resource_type_name: &'static str,
    /// Whether this resource type uses tags
    pub has_tags: bool,
    /// The resource schema with attribute definitions
    pub schema: ResourceSchema,
}

/// Returns all AWS schema configs
pub fn configs() -> Vec<AwsSchemaConfig> {
    let mut configs = Vec::new();
    configs.extend(ec2::configs());
    configs.extend(elbv2::configs());
    configs
}

/// Get the AwsSchemaConfig for a resource type
pub fn get_schema_config(resource_type: &str) -> Option<AwsSchemaConfig> {
    configs()
        .into_iter()
        .find(|c| c.resource_type_name == resource_type)
}
