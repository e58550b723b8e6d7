//! Web tier - VPC, routing, security group, web servers and load balancer
//!
//! `build` folds the stack through a fixed sequence of steps. Each step
//! declares one layer of the topology and sees only the stack so far plus
//! the precomputed [`Layout`]; no step branches on parameter values.

use std::collections::BTreeMap;

use stratus_core::cidr::{CidrError, Ipv4Cidr};
use stratus_core::graph::GraphError;
use stratus_core::output::Output;
use stratus_core::parameter::{Parameter, ParameterType};
use stratus_core::resource::{PseudoParameter, Resource, Value};
use stratus_core::stack::{Mapping, Stack, StackError};
use stratus_provider_aws::resources::*;
use thiserror::Error;

use crate::config::{ConfigError, TopologyConfig};
use crate::user_data::BootstrapScript;

/// Logical ids of the declared resources
pub mod ids {
    pub const VPC: &str = "EngineeringVpc";
    pub const INTERNET_GATEWAY: &str = "InternetGateway";
    pub const ATTACH_GATEWAY: &str = "AttachGateway";
    pub const ROUTE_TABLE: &str = "RouteTable";
    pub const PUBLIC_ROUTE: &str = "PublicRoute";
    pub const SECURITY_GROUP: &str = "WebserversSG";
    pub const LOAD_BALANCER: &str = "ApplicationLoadBalancer";
    pub const TARGET_GROUP: &str = "TargetGroup";
    pub const LISTENER: &str = "Listener";

    /// Public subnets are numbered from 1
    pub fn public_subnet(n: usize) -> String {
        format!("PublicSubnet{}", n)
    }

    /// Associations are numbered from 0, one per subnet
    pub fn subnet_association(index: usize) -> String {
        format!("SubnetRouteTableAssociation{}", index)
    }

    pub fn web_server(n: usize) -> String {
        format!("WebServer{}", n)
    }
}

/// Stack parameter names
pub mod params {
    pub const INSTANCE_TYPE: &str = "InstanceType";
    pub const KEY_PAIR: &str = "KeyPair";
    pub const YOUR_IP: &str = "YourIp";
}

pub const VPC_CIDR: &str = "10.0.0.0/18";
pub const MAX_AZS: usize = 2;
pub const SUBNET_MASK: u8 = 24;
pub const WEB_SERVER_COUNT: usize = 2;
pub const HTTP_PORT: i64 = 80;
pub const SSH_PORT: i64 = 22;
pub const ANY_IPV4: &str = "0.0.0.0/0";
pub const INSTANCE_TYPES: [&str; 2] = ["t2.micro", "t2.small"];
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";
pub const ADMIN_CIDR_PATTERN: &str = r"^([0-9]{1,3}\.){3}[0-9]{1,3}/[0-9]{1,2}$";
pub const IMAGE_MAPPING: &str = "WebServerImages";
pub const IMAGE_MAPPING_KEY: &str = "ImageId";
pub const WEB_URL_OUTPUT: &str = "WebUrl";

const DEFAULT_DESCRIPTION: &str =
    "Corporate web application: two web servers behind an internet-facing load balancer";

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Cidr(#[from] CidrError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid resource graph:\n  {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n  "))]
    Graph(Vec<GraphError>),
}

/// Inputs shared by every construction step
#[derive(Debug, Clone)]
pub struct Layout {
    pub scope: String,
    pub vpc_cidr: Ipv4Cidr,
    /// Public subnet blocks, one per availability zone
    pub subnets: Vec<Ipv4Cidr>,
    pub config: TopologyConfig,
}

impl Layout {
    pub fn new(scope: &str, config: &TopologyConfig) -> Result<Self, TopologyError> {
        config.validate()?;
        let vpc_cidr: Ipv4Cidr = VPC_CIDR.parse()?;
        let subnets = vpc_cidr.carve(SUBNET_MASK, MAX_AZS)?;
        Ok(Self {
            scope: scope.to_string(),
            vpc_cidr,
            subnets,
            config: config.clone(),
        })
    }

    /// Logical ids of the public subnets, in availability-zone order
    pub fn subnet_ids(&self) -> Vec<String> {
        (1..=self.subnets.len()).map(ids::public_subnet).collect()
    }

    fn name_tag(&self, id: &str) -> Value {
        Value::map([("Name", Value::string(format!("{}/{}", self.scope, id)))])
    }
}

type Step = fn(Stack, &Layout) -> Result<Stack, TopologyError>;

const STEPS: [Step; 9] = [
    declare_parameters,
    declare_image_mapping,
    declare_network,
    declare_internet_gateway,
    declare_routing,
    declare_security_group,
    declare_web_servers,
    declare_load_balancer,
    declare_outputs,
];

/// Build the web tier stack for `scope`
pub fn build(scope: &str, config: &TopologyConfig) -> Result<Stack, TopologyError> {
    let layout = Layout::new(scope, config)?;
    let description = config
        .description
        .clone()
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    let stack = Stack::new(scope).with_description(description);

    let stack = STEPS
        .iter()
        .try_fold(stack, |stack, step| step(stack, &layout))?;

    stack.validate().map_err(TopologyError::Graph)?;
    log::debug!(
        "built {} with {} resources",
        stack.name(),
        stack.resources().len()
    );
    Ok(stack)
}

fn declare_parameters(mut stack: Stack, _layout: &Layout) -> Result<Stack, TopologyError> {
    stack.add_parameter(
        Parameter::new(params::INSTANCE_TYPE, ParameterType::String)
            .with_description("The EC2 instance type for the web servers")
            .with_allowed_values(INSTANCE_TYPES)
            .with_default(DEFAULT_INSTANCE_TYPE),
    )?;
    stack.add_parameter(
        Parameter::new(params::KEY_PAIR, ParameterType::KeyPairName).with_description(
            "The name of the key pair to use for SSH access to the EC2 instances",
        ),
    )?;
    stack.add_parameter(
        Parameter::new(params::YOUR_IP, ParameterType::String)
            .with_description("Your public IP address in CIDR notation for secure SSH access")
            .with_allowed_pattern(ADMIN_CIDR_PATTERN)
            .with_constraint_description("Must be an IPv4 CIDR such as 203.0.113.5/32"),
    )?;
    Ok(stack)
}

fn declare_image_mapping(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    let mapping: Mapping = layout
        .config
        .images
        .iter()
        .map(|(region, image)| {
            (
                region.clone(),
                BTreeMap::from([(IMAGE_MAPPING_KEY.to_string(), image.clone())]),
            )
        })
        .collect();
    stack.add_mapping(IMAGE_MAPPING, mapping)?;
    Ok(stack)
}

fn declare_network(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    stack.add_resource(
        Resource::new(EC2_VPC, ids::VPC)
            .with_attribute("cidr_block", Value::string(layout.vpc_cidr.to_string()))
            .with_attribute("enable_dns_hostnames", Value::Bool(true))
            .with_attribute("enable_dns_support", Value::Bool(true))
            .with_attribute("instance_tenancy", Value::string("default"))
            .with_attribute("tags", layout.name_tag(ids::VPC)),
    )?;

    for (index, (id, cidr)) in layout.subnet_ids().iter().zip(&layout.subnets).enumerate() {
        stack.add_resource(
            Resource::new(EC2_SUBNET, id.as_str())
                .with_attribute("vpc_id", Value::resource_ref(ids::VPC))
                .with_attribute("cidr_block", Value::string(cidr.to_string()))
                .with_attribute(
                    "availability_zone",
                    Value::Select {
                        index,
                        list: Box::new(Value::AvailabilityZones),
                    },
                )
                .with_attribute("map_public_ip_on_launch", Value::Bool(true))
                .with_attribute("tags", layout.name_tag(id)),
        )?;
    }
    Ok(stack)
}

fn declare_internet_gateway(mut stack: Stack, _layout: &Layout) -> Result<Stack, TopologyError> {
    stack.add_resource(
        Resource::new(EC2_INTERNET_GATEWAY, ids::INTERNET_GATEWAY)
            .with_attribute("tags", Value::map([("Name", Value::string("EngineeringIGW"))])),
    )?;
    stack.add_resource(
        Resource::new(EC2_VPC_GATEWAY_ATTACHMENT, ids::ATTACH_GATEWAY)
            .with_attribute("vpc_id", Value::resource_ref(ids::VPC))
            .with_attribute("internet_gateway_id", Value::resource_ref(ids::INTERNET_GATEWAY)),
    )?;
    Ok(stack)
}

fn declare_routing(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    stack.add_resource(
        Resource::new(EC2_ROUTE_TABLE, ids::ROUTE_TABLE)
            .with_attribute("vpc_id", Value::resource_ref(ids::VPC))
            .with_attribute("tags", Value::map([("Name", Value::string("PublicRouteTable"))])),
    )?;

    // The gateway must be attached before a route can target it
    stack.add_resource(
        Resource::new(EC2_ROUTE, ids::PUBLIC_ROUTE)
            .with_attribute("route_table_id", Value::resource_ref(ids::ROUTE_TABLE))
            .with_attribute("destination_cidr_block", Value::string(ANY_IPV4))
            .with_attribute("gateway_id", Value::resource_ref(ids::INTERNET_GATEWAY))
            .with_depends_on(ids::ATTACH_GATEWAY),
    )?;

    for (index, subnet) in layout.subnet_ids().iter().enumerate() {
        stack.add_resource(
            Resource::new(EC2_SUBNET_ROUTE_TABLE_ASSOCIATION, ids::subnet_association(index))
                .with_attribute("subnet_id", Value::resource_ref(subnet.as_str()))
                .with_attribute("route_table_id", Value::resource_ref(ids::ROUTE_TABLE))
                .with_depends_on(ids::ROUTE_TABLE),
        )?;
    }
    Ok(stack)
}

fn ingress_rule(port: i64, source: Value, description: &str) -> Value {
    Value::map([
        ("ip_protocol", Value::string("tcp")),
        ("from_port", Value::Int(port)),
        ("to_port", Value::Int(port)),
        ("cidr_ip", source),
        ("description", Value::string(description)),
    ])
}

fn declare_security_group(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    // No egress rules: the engine keeps the default allow-all egress
    stack.add_resource(
        Resource::new(EC2_SECURITY_GROUP, ids::SECURITY_GROUP)
            .with_attribute(
                "group_description",
                Value::string("Security group for web servers allowing ports 22 and 80"),
            )
            .with_attribute("vpc_id", Value::resource_ref(ids::VPC))
            .with_attribute(
                "security_group_ingress",
                Value::List(vec![
                    ingress_rule(SSH_PORT, Value::parameter(params::YOUR_IP), "SSH Access"),
                    ingress_rule(HTTP_PORT, Value::string(ANY_IPV4), "HTTP Access"),
                ]),
            )
            .with_attribute("tags", layout.name_tag(ids::SECURITY_GROUP)),
    )?;
    Ok(stack)
}

fn security_group_id() -> Value {
    Value::attr(ids::SECURITY_GROUP, "GroupId")
}

fn declare_web_servers(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    let script = BootstrapScript::new(layout.config.asset.clone(), layout.config.web_root.clone());
    let image = Value::FindInMap {
        map: IMAGE_MAPPING.to_string(),
        top_key: Box::new(Value::Pseudo(PseudoParameter::Region)),
        second_key: IMAGE_MAPPING_KEY.to_string(),
    };
    let Some(placement) = layout.subnet_ids().into_iter().next() else {
        return Err(TopologyError::Cidr(CidrError::InsufficientSpace {
            block: layout.vpc_cidr,
            mask: SUBNET_MASK,
            requested: 1,
            available: 0,
        }));
    };

    for n in 1..=WEB_SERVER_COUNT {
        let id = ids::web_server(n);
        stack.add_resource(
            Resource::new(EC2_INSTANCE, id.as_str())
                .with_attribute("image_id", image.clone())
                .with_attribute("instance_type", Value::parameter(params::INSTANCE_TYPE))
                .with_attribute("key_name", Value::parameter(params::KEY_PAIR))
                .with_attribute("subnet_id", Value::resource_ref(placement.as_str()))
                .with_attribute("security_group_ids", Value::List(vec![security_group_id()]))
                .with_attribute(
                    "user_data",
                    Value::Base64(Box::new(Value::string(script.render()))),
                )
                .with_attribute("tags", layout.name_tag(&id))
                .with_depends_on(ids::PUBLIC_ROUTE),
        )?;
    }
    Ok(stack)
}

fn declare_load_balancer(mut stack: Stack, layout: &Layout) -> Result<Stack, TopologyError> {
    let subnets = layout
        .subnet_ids()
        .into_iter()
        .map(Value::resource_ref)
        .collect();

    // An internet-facing balancer needs the gateway attached first
    stack.add_resource(
        Resource::new(ELBV2_LOAD_BALANCER, ids::LOAD_BALANCER)
            .with_attribute("type", Value::string("application"))
            .with_attribute("scheme", Value::string("internet-facing"))
            .with_attribute("subnets", Value::List(subnets))
            .with_attribute("security_groups", Value::List(vec![security_group_id()]))
            .with_depends_on(ids::ATTACH_GATEWAY),
    )?;
    stack.add_resource(
        Resource::new(ELBV2_TARGET_GROUP, ids::TARGET_GROUP)
            .with_attribute("protocol", Value::string("HTTP"))
            .with_attribute("port", Value::Int(HTTP_PORT))
            .with_attribute("target_type", Value::string("instance"))
            .with_attribute("vpc_id", Value::resource_ref(ids::VPC)),
    )?;
    stack.add_resource(
        Resource::new(ELBV2_LISTENER, ids::LISTENER)
            .with_attribute("load_balancer_arn", Value::resource_ref(ids::LOAD_BALANCER))
            .with_attribute("port", Value::Int(HTTP_PORT))
            .with_attribute("protocol", Value::string("HTTP"))
            .with_attribute(
                "default_actions",
                Value::List(vec![Value::map([
                    ("type", Value::string("forward")),
                    ("target_group_arn", Value::resource_ref(ids::TARGET_GROUP)),
                ])]),
            ),
    )?;
    Ok(stack)
}

fn declare_outputs(mut stack: Stack, _layout: &Layout) -> Result<Stack, TopologyError> {
    stack.add_output(
        Output::new(WEB_URL_OUTPUT, Value::attr(ids::LOAD_BALANCER, "DNSName"))
            .with_description("The URL of the corporate web application."),
    )?;
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::graph::DependencyKind;
    use stratus_core::provider::Provider;
    use stratus_provider_aws::AwsProvider;

    const SCOPE: &str = "AwsCdkAppStack";

    fn stack() -> Stack {
        build(SCOPE, &TopologyConfig::default()).unwrap()
    }

    fn count(stack: &Stack, resource_type: &str) -> usize {
        stack.resources_of_type(resource_type).count()
    }

    fn scenario_values() -> BTreeMap<String, String> {
        BTreeMap::from([
            (params::KEY_PAIR.to_string(), "my-key".to_string()),
            (params::YOUR_IP.to_string(), "203.0.113.5/32".to_string()),
        ])
    }

    fn ingress_rules(stack: &Stack) -> Vec<BTreeMap<String, Value>> {
        let sg = stack.resource(ids::SECURITY_GROUP).unwrap();
        let Some(Value::List(rules)) = sg.attribute("security_group_ingress") else {
            panic!("security group has no ingress list");
        };
        rules
            .iter()
            .map(|rule| match rule {
                Value::Map(map) => map.clone(),
                other => panic!("rule is not a map: {}", other),
            })
            .collect()
    }

    #[test]
    fn two_web_servers_differing_only_in_identity() {
        for size in INSTANCE_TYPES {
            let mut values = scenario_values();
            values.insert(params::INSTANCE_TYPE.to_string(), size.to_string());
            let stack = stack();
            let resolved = stack.resolve_parameters(&values).unwrap();

            let servers: Vec<&Resource> = stack.resources_of_type(EC2_INSTANCE).collect();
            assert_eq!(servers.len(), 2);
            assert_eq!(servers[0].logical_id(), "WebServer1");
            assert_eq!(servers[1].logical_id(), "WebServer2");

            let strip_identity = |r: &Resource| {
                let mut attrs: BTreeMap<String, Value> = r
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve_parameters(&resolved)))
                    .collect();
                attrs.remove("tags");
                (attrs, r.depends_on.clone())
            };
            assert_eq!(strip_identity(servers[0]), strip_identity(servers[1]));
            assert_eq!(
                strip_identity(servers[0]).0["instance_type"],
                Value::string(size)
            );
        }
    }

    #[test]
    fn security_group_has_exactly_ssh_and_http_ingress() {
        let stack = stack();
        let rules = ingress_rules(&stack);
        assert_eq!(rules.len(), 2);

        let ssh = &rules[0];
        assert_eq!(ssh["from_port"], Value::Int(22));
        assert_eq!(ssh["to_port"], Value::Int(22));
        assert_eq!(ssh["cidr_ip"], Value::parameter(params::YOUR_IP));

        let http = &rules[1];
        assert_eq!(http["from_port"], Value::Int(80));
        assert_eq!(http["cidr_ip"], Value::string("0.0.0.0/0"));

        let sg = stack.resource(ids::SECURITY_GROUP).unwrap();
        assert!(sg.attribute("security_group_egress").is_none());
    }

    #[test]
    fn one_association_per_public_subnet() {
        let stack = stack();
        let subnets: Vec<&Resource> = stack.resources_of_type(EC2_SUBNET).collect();
        let associations: Vec<&Resource> = stack
            .resources_of_type(EC2_SUBNET_ROUTE_TABLE_ASSOCIATION)
            .collect();
        assert_eq!(associations.len(), subnets.len());

        for (subnet, association) in subnets.iter().zip(&associations) {
            assert_eq!(
                association.attribute("subnet_id"),
                Some(&Value::resource_ref(subnet.logical_id()))
            );
        }
        assert_eq!(associations[0].logical_id(), "SubnetRouteTableAssociation0");
        assert_eq!(associations[1].logical_id(), "SubnetRouteTableAssociation1");
    }

    #[test]
    fn default_route_targets_internet_gateway() {
        let stack = stack();
        let routes: Vec<&Resource> = stack.resources_of_type(EC2_ROUTE).collect();
        assert_eq!(routes.len(), 1);

        let route = routes[0];
        assert_eq!(
            route.attribute("destination_cidr_block"),
            Some(&Value::string("0.0.0.0/0"))
        );
        assert_eq!(
            route.attribute("gateway_id"),
            Some(&Value::resource_ref(ids::INTERNET_GATEWAY))
        );
        assert!(route.attribute("nat_gateway_id").is_none());
        assert!(route.attribute("vpc_peering_connection_id").is_none());
    }

    #[test]
    fn web_url_is_load_balancer_dns_name() {
        let stack = stack();
        assert_eq!(stack.outputs().len(), 1);
        let output = stack.output(WEB_URL_OUTPUT).unwrap();
        assert_eq!(output.value, Value::attr(ids::LOAD_BALANCER, "DNSName"));
        assert!(output.value.is_symbolic());
        assert_eq!(
            output.description.as_deref(),
            Some("The URL of the corporate web application.")
        );
    }

    #[test]
    fn scenario_default_size_with_my_key() {
        let stack = stack();
        let resolved = stack.resolve_parameters(&scenario_values()).unwrap();
        assert_eq!(resolved[params::INSTANCE_TYPE], "t2.micro");
        assert_eq!(resolved[params::KEY_PAIR], "my-key");
        assert_eq!(resolved[params::YOUR_IP], "203.0.113.5/32");

        assert_eq!(count(&stack, EC2_VPC), 1);
        assert_eq!(count(&stack, EC2_SUBNET), 2);
        assert_eq!(count(&stack, EC2_INTERNET_GATEWAY), 1);
        assert_eq!(count(&stack, EC2_VPC_GATEWAY_ATTACHMENT), 1);
        assert_eq!(count(&stack, EC2_ROUTE_TABLE), 1);
        assert_eq!(count(&stack, EC2_ROUTE), 1);
        assert_eq!(count(&stack, EC2_SUBNET_ROUTE_TABLE_ASSOCIATION), 2);
        assert_eq!(count(&stack, EC2_SECURITY_GROUP), 1);
        assert_eq!(ingress_rules(&stack).len(), 2);
        assert_eq!(count(&stack, EC2_INSTANCE), 2);
        assert_eq!(count(&stack, ELBV2_LOAD_BALANCER), 1);
        assert_eq!(count(&stack, ELBV2_LISTENER), 1);
        assert_eq!(count(&stack, ELBV2_TARGET_GROUP), 1);
        assert_eq!(stack.outputs().len(), 1);
        assert_eq!(stack.resources().len(), 15);

        for server in stack.resources_of_type(EC2_INSTANCE) {
            let instance_type = server.attribute("instance_type").unwrap();
            let key = server.attribute("key_name").unwrap();
            assert_eq!(instance_type.resolve_parameters(&resolved), Value::string("t2.micro"));
            assert_eq!(key.resolve_parameters(&resolved), Value::string("my-key"));
        }
    }

    #[test]
    fn malformed_admin_cidr_is_rejected_by_parameter_check() {
        let stack = stack();
        let mut values = scenario_values();
        values.insert(params::YOUR_IP.to_string(), "203.0.113.5".to_string());
        assert!(stack.resolve_parameters(&values).is_err());

        values.insert(params::YOUR_IP.to_string(), "203.0.113.5/32".to_string());
        values.insert(params::INSTANCE_TYPE.to_string(), "m5.large".to_string());
        assert!(stack.resolve_parameters(&values).is_err());
    }

    #[test]
    fn subnets_are_disjoint_and_inside_vpc() {
        let layout = Layout::new(SCOPE, &TopologyConfig::default()).unwrap();
        assert_eq!(layout.subnets.len(), MAX_AZS);
        assert!(layout.vpc_cidr.size() >= layout.subnets.iter().map(|s| s.size()).sum::<u64>());
        for (i, a) in layout.subnets.iter().enumerate() {
            assert!(layout.vpc_cidr.contains(a));
            for b in &layout.subnets[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }

        let stack = stack();
        assert_eq!(
            stack.resource("PublicSubnet1").unwrap().attribute("cidr_block"),
            Some(&Value::string("10.0.0.0/24"))
        );
        assert_eq!(
            stack.resource("PublicSubnet2").unwrap().attribute("cidr_block"),
            Some(&Value::string("10.0.1.0/24"))
        );
    }

    #[test]
    fn instances_resolve_to_one_public_subnet() {
        let stack = stack();
        let public: Vec<String> = stack
            .resources_of_type(EC2_SUBNET)
            .map(|s| s.logical_id().to_string())
            .collect();
        for server in stack.resources_of_type(EC2_INSTANCE) {
            let Some(Value::ResourceRef(subnet)) = server.attribute("subnet_id") else {
                panic!("{} has no subnet reference", server.logical_id());
            };
            assert!(public.contains(subnet));
        }
    }

    #[test]
    fn target_group_matches_listener() {
        let stack = stack();
        let tg = stack.resource(ids::TARGET_GROUP).unwrap();
        let listener = stack.resource(ids::LISTENER).unwrap();
        assert_eq!(tg.attribute("port"), listener.attribute("port"));
        assert_eq!(tg.attribute("protocol"), listener.attribute("protocol"));
        assert_eq!(tg.attribute("target_type"), Some(&Value::string("instance")));
    }

    #[test]
    fn ordering_edges_are_explicit() {
        let stack = stack();
        let graph = stack.dependency_graph().unwrap();
        let explicit = |from: &str, to: &str| {
            graph
                .dependencies_of(from)
                .iter()
                .any(|d| d.target == to && d.kind == DependencyKind::Explicit)
        };

        assert!(explicit(ids::PUBLIC_ROUTE, ids::ATTACH_GATEWAY));
        assert!(explicit("SubnetRouteTableAssociation0", ids::ROUTE_TABLE));
        assert!(explicit("SubnetRouteTableAssociation1", ids::ROUTE_TABLE));
        assert!(explicit("WebServer1", ids::PUBLIC_ROUTE));
        assert!(explicit(ids::LOAD_BALANCER, ids::ATTACH_GATEWAY));
        assert!(graph.depends_transitively("WebServer2", ids::ATTACH_GATEWAY));
        assert!(!graph.has_cycle());
    }

    #[test]
    fn passes_provider_validation() {
        assert!(AwsProvider::new().validate(&stack()).is_ok());
    }

    #[test]
    fn image_comes_from_region_mapping() {
        let stack = stack();
        let mapping = &stack.mappings()[IMAGE_MAPPING];
        assert_eq!(mapping["us-east-1"][IMAGE_MAPPING_KEY], "ami-01cc34ab2709337aa");

        let server = stack.resource("WebServer1").unwrap();
        assert_eq!(
            server.attribute("image_id"),
            Some(&Value::FindInMap {
                map: IMAGE_MAPPING.to_string(),
                top_key: Box::new(Value::Pseudo(PseudoParameter::Region)),
                second_key: IMAGE_MAPPING_KEY.to_string(),
            })
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TopologyConfig::default().with_region("ap-south-1");
        assert!(matches!(
            build(SCOPE, &config),
            Err(TopologyError::Config(_))
        ));
    }

    #[test]
    fn build_is_deterministic() {
        let a = AwsProvider::new().synthesize(&stack()).unwrap();
        let b = AwsProvider::new().synthesize(&stack()).unwrap();
        assert_eq!(a, b);
    }
}
