//! EC2 networking and compute schemas
//!
//! Based on the CloudFormation AWS::EC2::* resource types.
//! See: https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/AWS_EC2.html

use stratus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::AwsSchemaConfig;
use super::types as aws_types;
use crate::resources::*;

fn tags() -> AttributeSchema {
    AttributeSchema::new("tags", aws_types::tags_type())
        .with_description("Tags assigned to the resource")
        .with_provider_name("Tags")
}

fn vpc_id() -> AttributeSchema {
    AttributeSchema::new("vpc_id", AttributeType::String)
        .required()
        .with_description("The ID of the VPC")
        .with_provider_name("VpcId")
}

pub fn vpc_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::VPC",
        resource_type_name: EC2_VPC,
        has_tags: true,
        schema: ResourceSchema::new(EC2_VPC)
            .with_description("An AWS VPC (Virtual Private Cloud)")
            .attribute(
                AttributeSchema::new("cidr_block", types::cidr())
                    .required()
                    .with_description("The IPv4 network range for the VPC, in CIDR notation")
                    .with_provider_name("CidrBlock"),
            )
            .attribute(
                AttributeSchema::new("enable_dns_hostnames", AttributeType::Bool)
                    .with_description("Whether instances launched in the VPC get DNS hostnames")
                    .with_provider_name("EnableDnsHostnames"),
            )
            .attribute(
                AttributeSchema::new("enable_dns_support", AttributeType::Bool)
                    .with_description("Whether DNS resolution is supported for the VPC")
                    .with_provider_name("EnableDnsSupport"),
            )
            .attribute(
                AttributeSchema::new("instance_tenancy", aws_types::instance_tenancy())
                    .with_description("The allowed tenancy of instances launched into the VPC")
                    .with_provider_name("InstanceTenancy"),
            )
            .attribute(tags()),
    }
}

pub fn subnet_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::Subnet",
        resource_type_name: EC2_SUBNET,
        has_tags: true,
        schema: ResourceSchema::new(EC2_SUBNET)
            .with_description("A subnet in a VPC")
            .attribute(vpc_id())
            .attribute(
                AttributeSchema::new("cidr_block", types::cidr())
                    .required()
                    .with_description("The IPv4 CIDR block assigned to the subnet")
                    .with_provider_name("CidrBlock"),
            )
            .attribute(
                AttributeSchema::new("availability_zone", AttributeType::String)
                    .with_description("The Availability Zone of the subnet")
                    .with_provider_name("AvailabilityZone"),
            )
            .attribute(
                AttributeSchema::new("map_public_ip_on_launch", AttributeType::Bool)
                    .with_description("Whether instances launched in this subnet receive a public IPv4 address")
                    .with_provider_name("MapPublicIpOnLaunch"),
            )
            .attribute(tags()),
    }
}

pub fn internet_gateway_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::InternetGateway",
        resource_type_name: EC2_INTERNET_GATEWAY,
        has_tags: true,
        schema: ResourceSchema::new(EC2_INTERNET_GATEWAY)
            .with_description("An internet gateway for a VPC")
            .attribute(tags()),
    }
}

pub fn vpc_gateway_attachment_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::VPCGatewayAttachment",
        resource_type_name: EC2_VPC_GATEWAY_ATTACHMENT,
        has_tags: false,
        schema: ResourceSchema::new(EC2_VPC_GATEWAY_ATTACHMENT)
            .with_description("Attaches an internet gateway to a VPC")
            .attribute(vpc_id())
            .attribute(
                AttributeSchema::new("internet_gateway_id", AttributeType::String)
                    .required()
                    .with_description("The ID of the internet gateway")
                    .with_provider_name("InternetGatewayId"),
            ),
    }
}

pub fn route_table_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::RouteTable",
        resource_type_name: EC2_ROUTE_TABLE,
        has_tags: true,
        schema: ResourceSchema::new(EC2_ROUTE_TABLE)
            .with_description("A route table for a VPC")
            .attribute(vpc_id())
            .attribute(tags()),
    }
}

pub fn route_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::Route",
        resource_type_name: EC2_ROUTE,
        has_tags: false,
        schema: ResourceSchema::new(EC2_ROUTE)
            .with_description("A route in a route table")
            .attribute(
                AttributeSchema::new("route_table_id", AttributeType::String)
                    .required()
                    .with_description("The ID of the route table")
                    .with_provider_name("RouteTableId"),
            )
            .attribute(
                AttributeSchema::new("destination_cidr_block", types::cidr())
                    .required()
                    .with_description("The IPv4 CIDR block used for the destination match")
                    .with_provider_name("DestinationCidrBlock"),
            )
            .attribute(
                AttributeSchema::new("gateway_id", AttributeType::String)
                    .with_description("The ID of an internet gateway attached to the VPC")
                    .with_provider_name("GatewayId"),
            )
            .attribute(
                AttributeSchema::new("nat_gateway_id", AttributeType::String)
                    .with_description("The ID of a NAT gateway")
                    .with_provider_name("NatGatewayId"),
            )
            .attribute(
                AttributeSchema::new("vpc_peering_connection_id", AttributeType::String)
                    .with_description("The ID of a VPC peering connection")
                    .with_provider_name("VpcPeeringConnectionId"),
            ),
    }
}

pub fn subnet_route_table_association_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::SubnetRouteTableAssociation",
        resource_type_name: EC2_SUBNET_ROUTE_TABLE_ASSOCIATION,
        has_tags: false,
        schema: ResourceSchema::new(EC2_SUBNET_ROUTE_TABLE_ASSOCIATION)
            .with_description("Associates a subnet with a route table")
            .attribute(
                AttributeSchema::new("subnet_id", AttributeType::String)
                    .required()
                    .with_provider_name("SubnetId"),
            )
            .attribute(
                AttributeSchema::new("route_table_id", AttributeType::String)
                    .required()
                    .with_provider_name("RouteTableId"),
            ),
    }
}

pub fn security_group_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::SecurityGroup",
        resource_type_name: EC2_SECURITY_GROUP,
        has_tags: true,
        schema: ResourceSchema::new(EC2_SECURITY_GROUP)
            .with_description("A security group with embedded ingress and egress rules")
            .attribute(
                AttributeSchema::new("group_description", AttributeType::String)
                    .required()
                    .with_description("A description for the security group")
                    .with_provider_name("GroupDescription"),
            )
            .attribute(vpc_id())
            .attribute(
                AttributeSchema::new(
                    "security_group_ingress",
                    AttributeType::List(Box::new(aws_types::security_group_rule())),
                )
                .with_description("Inbound rules")
                .with_provider_name("SecurityGroupIngress"),
            )
            .attribute(
                AttributeSchema::new(
                    "security_group_egress",
                    AttributeType::List(Box::new(aws_types::security_group_rule())),
                )
                .with_description("Outbound rules; omitted means allow all")
                .with_provider_name("SecurityGroupEgress"),
            )
            .attribute(tags()),
    }
}

pub fn instance_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::EC2::Instance",
        resource_type_name: EC2_INSTANCE,
        has_tags: true,
        schema: ResourceSchema::new(EC2_INSTANCE)
            .with_description("An EC2 instance")
            .attribute(
                AttributeSchema::new("image_id", AttributeType::String)
                    .required()
                    .with_description("The ID of the AMI")
                    .with_provider_name("ImageId"),
            )
            .attribute(
                AttributeSchema::new("instance_type", AttributeType::String)
                    .required()
                    .with_description("The instance type")
                    .with_provider_name("InstanceType"),
            )
            .attribute(
                AttributeSchema::new("key_name", AttributeType::String)
                    .with_description("The name of the key pair")
                    .with_provider_name("KeyName"),
            )
            .attribute(
                AttributeSchema::new("subnet_id", AttributeType::String)
                    .with_description("The ID of the subnet to launch the instance into")
                    .with_provider_name("SubnetId"),
            )
            .attribute(
                AttributeSchema::new(
                    "security_group_ids",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .with_description("The IDs of the security groups")
                .with_provider_name("SecurityGroupIds"),
            )
            .attribute(
                AttributeSchema::new("availability_zone", AttributeType::String)
                    .with_provider_name("AvailabilityZone"),
            )
            .attribute(
                AttributeSchema::new("user_data", AttributeType::String)
                    .with_description("Base64-encoded bootstrap script")
                    .with_provider_name("UserData"),
            )
            .attribute(tags()),
    }
}

pub fn configs() -> Vec<AwsSchemaConfig> {
    vec![
        vpc_config(),
        subnet_config(),
        internet_gateway_config(),
        vpc_gateway_attachment_config(),
        route_table_config(),
        route_config(),
        subnet_route_table_association_config(),
        security_group_config(),
        instance_config(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stratus_core::resource::Value;

    #[test]
    fn vpc_requires_cidr_block() {
        let schema = vpc_config().schema;
        assert!(schema.validate(&BTreeMap::new()).is_err());

        let mut attrs = BTreeMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/18"));
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/40"));
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn security_group_rules_are_checked() {
        let schema = security_group_config().schema;
        let mut attrs = BTreeMap::new();
        attrs.insert("group_description".to_string(), Value::string("web"));
        attrs.insert("vpc_id".to_string(), Value::resource_ref("vpc"));
        attrs.insert(
            "security_group_ingress".to_string(),
            Value::List(vec![Value::map([
                ("ip_protocol", Value::string("tcp")),
                ("from_port", Value::Int(80)),
                ("to_port", Value::Int(80)),
                ("cidr_ip", Value::string("0.0.0.0/0")),
            ])]),
        );
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert(
            "security_group_ingress".to_string(),
            Value::List(vec![Value::map([("ip_protocol", Value::string("sctp"))])]),
        );
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn attachment_has_no_tags() {
        let config = vpc_gateway_attachment_config();
        assert!(!config.has_tags);
        assert!(!config.schema.attributes.contains_key("tags"));
    }
}
