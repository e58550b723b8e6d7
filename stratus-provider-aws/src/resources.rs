//! Resource type definitions
//!
//! Maps Stratus resource type names to CloudFormation resource types.

use stratus_core::provider::ResourceType;

pub const EC2_VPC: &str = "ec2.vpc";
pub const EC2_SUBNET: &str = "ec2.subnet";
pub const EC2_INTERNET_GATEWAY: &str = "ec2.internet_gateway";
pub const EC2_VPC_GATEWAY_ATTACHMENT: &str = "ec2.vpc_gateway_attachment";
pub const EC2_ROUTE_TABLE: &str = "ec2.route_table";
pub const EC2_ROUTE: &str = "ec2.route";
pub const EC2_SUBNET_ROUTE_TABLE_ASSOCIATION: &str = "ec2.subnet_route_table_association";
pub const EC2_SECURITY_GROUP: &str = "ec2.security_group";
pub const EC2_INSTANCE: &str = "ec2.instance";
pub const ELBV2_LOAD_BALANCER: &str = "elbv2.load_balancer";
pub const ELBV2_TARGET_GROUP: &str = "elbv2.target_group";
pub const ELBV2_LISTENER: &str = "elbv2.listener";

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $engine_type:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn engine_type(&self) -> &'static str {
                $engine_type
            }
        }
    };
}

define_resource_type!(VpcType, EC2_VPC, "AWS::EC2::VPC");
define_resource_type!(SubnetType, EC2_SUBNET, "AWS::EC2::Subnet");
define_resource_type!(InternetGatewayType, EC2_INTERNET_GATEWAY, "AWS::EC2::InternetGateway");
define_resource_type!(
    VpcGatewayAttachmentType,
    EC2_VPC_GATEWAY_ATTACHMENT,
    "AWS::EC2::VPCGatewayAttachment"
);
define_resource_type!(RouteTableType, EC2_ROUTE_TABLE, "AWS::EC2::RouteTable");
define_resource_type!(RouteType, EC2_ROUTE, "AWS::EC2::Route");
define_resource_type!(
    SubnetRouteTableAssociationType,
    EC2_SUBNET_ROUTE_TABLE_ASSOCIATION,
    "AWS::EC2::SubnetRouteTableAssociation"
);
define_resource_type!(SecurityGroupType, EC2_SECURITY_GROUP, "AWS::EC2::SecurityGroup");
define_resource_type!(Ec2InstanceType, EC2_INSTANCE, "AWS::EC2::Instance");
define_resource_type!(
    LoadBalancerType,
    ELBV2_LOAD_BALANCER,
    "AWS::ElasticLoadBalancingV2::LoadBalancer"
);
define_resource_type!(
    TargetGroupType,
    ELBV2_TARGET_GROUP,
    "AWS::ElasticLoadBalancingV2::TargetGroup"
);
define_resource_type!(
    ListenerType,
    ELBV2_LISTENER,
    "AWS::ElasticLoadBalancingV2::Listener"
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(VpcType),
        Box::new(SubnetType),
        Box::new(InternetGatewayType),
        Box::new(VpcGatewayAttachmentType),
        Box::new(RouteTableType),
        Box::new(RouteType),
        Box::new(SubnetRouteTableAssociationType),
        Box::new(SecurityGroupType),
        Box::new(Ec2InstanceType),
        Box::new(LoadBalancerType),
        Box::new(TargetGroupType),
        Box::new(ListenerType),
    ]
}
