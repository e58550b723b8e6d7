//! Elastic Load Balancing v2 schemas

use stratus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::AwsSchemaConfig;
use super::types as aws_types;
use crate::resources::*;

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

pub fn load_balancer_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::ElasticLoadBalancingV2::LoadBalancer",
        resource_type_name: ELBV2_LOAD_BALANCER,
        has_tags: true,
        schema: ResourceSchema::new(ELBV2_LOAD_BALANCER)
            .with_description("An application, network or gateway load balancer")
            .attribute(
                AttributeSchema::new("type", aws_types::load_balancer_type())
                    .with_provider_name("Type"),
            )
            .attribute(
                AttributeSchema::new("scheme", aws_types::load_balancer_scheme())
                    .with_description("internet-facing or internal")
                    .with_provider_name("Scheme"),
            )
            .attribute(
                AttributeSchema::new("subnets", string_list())
                    .required()
                    .with_description("The IDs of the public subnets")
                    .with_provider_name("Subnets"),
            )
            .attribute(
                AttributeSchema::new("security_groups", string_list())
                    .with_provider_name("SecurityGroups"),
            )
            .attribute(
                AttributeSchema::new("tags", aws_types::tags_type()).with_provider_name("Tags"),
            ),
    }
}

pub fn target_group_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::ElasticLoadBalancingV2::TargetGroup",
        resource_type_name: ELBV2_TARGET_GROUP,
        has_tags: true,
        schema: ResourceSchema::new(ELBV2_TARGET_GROUP)
            .with_description("A pool of targets a listener forwards to")
            .attribute(
                AttributeSchema::new("protocol", aws_types::application_protocol())
                    .with_provider_name("Protocol"),
            )
            .attribute(
                AttributeSchema::new("port", types::port_number()).with_provider_name("Port"),
            )
            .attribute(
                AttributeSchema::new("target_type", aws_types::target_type())
                    .with_description("How targets are addressed")
                    .with_provider_name("TargetType"),
            )
            .attribute(
                AttributeSchema::new("vpc_id", AttributeType::String).with_provider_name("VpcId"),
            )
            .attribute(
                AttributeSchema::new("health_check_interval_seconds", types::positive_int())
                    .with_provider_name("HealthCheckIntervalSeconds"),
            )
            .attribute(
                AttributeSchema::new("healthy_threshold_count", types::positive_int())
                    .with_provider_name("HealthyThresholdCount"),
            )
            .attribute(
                AttributeSchema::new("tags", aws_types::tags_type()).with_provider_name("Tags"),
            ),
    }
}

pub fn listener_config() -> AwsSchemaConfig {
    AwsSchemaConfig {
        aws_type_name: "AWS::ElasticLoadBalancingV2::Listener",
        resource_type_name: ELBV2_LISTENER,
        has_tags: false,
        schema: ResourceSchema::new(ELBV2_LISTENER)
            .with_description("A listener on a load balancer")
            .attribute(
                AttributeSchema::new("load_balancer_arn", AttributeType::String)
                    .required()
                    .with_provider_name("LoadBalancerArn"),
            )
            .attribute(
                AttributeSchema::new("port", types::port_number()).with_provider_name("Port"),
            )
            .attribute(
                AttributeSchema::new("protocol", aws_types::application_protocol())
                    .with_provider_name("Protocol"),
            )
            .attribute(
                AttributeSchema::new(
                    "default_actions",
                    AttributeType::List(Box::new(aws_types::listener_action())),
                )
                .required()
                .with_provider_name("DefaultActions"),
            ),
    }
}

pub fn configs() -> Vec<AwsSchemaConfig> {
    vec![load_balancer_config(), target_group_config(), listener_config()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stratus_core::resource::Value;

    #[test]
    fn listener_action_must_be_known() {
        let schema = listener_config().schema;
        let mut attrs = BTreeMap::new();
        attrs.insert("load_balancer_arn".to_string(), Value::resource_ref("alb"));
        attrs.insert(
            "default_actions".to_string(),
            Value::List(vec![Value::map([
                ("type", Value::string("forward")),
                ("target_group_arn", Value::resource_ref("tg")),
            ])]),
        );
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert(
            "default_actions".to_string(),
            Value::List(vec![Value::map([("type", Value::string("teleport"))])]),
        );
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn target_group_rejects_unknown_target_type() {
        let schema = target_group_config().schema;
        let mut attrs = BTreeMap::new();
        attrs.insert("target_type".to_string(), Value::string("instance"));
        assert!(schema.validate(&attrs).is_ok());
        attrs.insert("target_type".to_string(), Value::string("host"));
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn target_group_health_check_counts_must_be_positive() {
        let schema = target_group_config().schema;
        let mut attrs = BTreeMap::new();
        attrs.insert("health_check_interval_seconds".to_string(), Value::Int(30));
        attrs.insert("healthy_threshold_count".to_string(), Value::Int(5));
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert("healthy_threshold_count".to_string(), Value::Int(0));
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("positive"));
    }
}
