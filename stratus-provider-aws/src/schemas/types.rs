//! AWS-specific type definitions

use stratus_core::schema::{AttributeSchema, AttributeType, types};

/// Valid AWS regions (in AWS format with hyphens)
pub const VALID_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ca-central-1",
    "sa-east-1",
];

/// Check a region name against the supported list
pub fn validate_region(region: &str) -> Result<(), String> {
    if VALID_REGIONS.contains(&region) {
        Ok(())
    } else {
        Err(format!(
            "Invalid region '{}', expected one of: {}",
            region,
            VALID_REGIONS.join(", ")
        ))
    }
}

fn enum_of(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
}

/// IP protocol for security group rules ("-1" means all traffic)
pub fn ip_protocol() -> AttributeType {
    enum_of(&["tcp", "udp", "icmp", "-1"])
}

/// Instance tenancy for VPC
pub fn instance_tenancy() -> AttributeType {
    enum_of(&["default", "dedicated", "host"])
}

pub fn load_balancer_scheme() -> AttributeType {
    enum_of(&["internet-facing", "internal"])
}

pub fn load_balancer_type() -> AttributeType {
    enum_of(&["application", "network", "gateway"])
}

/// How a target group addresses its targets
pub fn target_type() -> AttributeType {
    enum_of(&["instance", "ip", "lambda", "alb"])
}

pub fn application_protocol() -> AttributeType {
    enum_of(&["HTTP", "HTTPS"])
}

pub fn listener_action_type() -> AttributeType {
    enum_of(&["forward", "redirect", "fixed-response"])
}

/// Tags type for AWS resources (Terraform-style map)
/// Example: tags = { Name = "EngineeringIGW" }
pub fn tags_type() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

/// Ingress or egress rule embedded in a security group
pub fn security_group_rule() -> AttributeType {
    AttributeType::Struct {
        name: "SecurityGroupRule".to_string(),
        fields: vec![
            AttributeSchema::new("ip_protocol", ip_protocol()).required(),
            AttributeSchema::new("from_port", types::port_number()),
            AttributeSchema::new("to_port", types::port_number()),
            AttributeSchema::new("cidr_ip", types::cidr()),
            AttributeSchema::new("description", AttributeType::String),
        ],
    }
}

/// Listener default action
pub fn listener_action() -> AttributeType {
    AttributeType::Struct {
        name: "ListenerAction".to_string(),
        fields: vec![
            AttributeSchema::new("type", listener_action_type()).required(),
            AttributeSchema::new("target_group_arn", AttributeType::String),
        ],
    }
}
