//! Case conversion from Stratus attribute names to CloudFormation
//! property names
//!
//! Stratus uses snake_case (e.g., `security_group_ingress`, `cidr_ip`)
//! CloudFormation uses PascalCase (e.g., `SecurityGroupIngress`, `CidrIp`)

/// Convert snake_case to PascalCase
/// e.g., "group_description" -> "GroupDescription"
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("vpc_id"), "VpcId");
        assert_eq!(to_pascal_case("cidr_ip"), "CidrIp");
        assert_eq!(to_pascal_case("security_group_ingress"), "SecurityGroupIngress");
        assert_eq!(to_pascal_case("type"), "Type");
        assert_eq!(to_pascal_case("target_group_arn"), "TargetGroupArn");
    }
}
