//! Resource - Declared resources and the values they carry
//!
//! Values are either literals or symbolic expressions that only the
//! provisioning engine can resolve (resource ids, attributes, parameters).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "ec2.vpc", "elbv2.listener")
    pub resource_type: String,
    /// Logical id, unique within a stack
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Values the engine supplies for every stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoParameter {
    Region,
    AccountId,
    StackName,
}

impl PseudoParameter {
    pub fn name(&self) -> &'static str {
        match self {
            PseudoParameter::Region => "AWS::Region",
            PseudoParameter::AccountId => "AWS::AccountId",
            PseudoParameter::StackName => "AWS::StackName",
        }
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Primary identifier of another resource (logical id)
    ResourceRef(String),
    /// Attribute of another resource (logical id, attribute name)
    ResourceAttr(String, String),
    /// Value of a declared parameter
    ParameterRef(String),
    Pseudo(PseudoParameter),
    /// Lookup in a declared mapping
    FindInMap {
        map: String,
        top_key: Box<Value>,
        second_key: String,
    },
    /// Element `index` of a list value
    Select { index: usize, list: Box<Value> },
    /// Availability zones of the deployment region
    AvailabilityZones,
    Base64(Box<Value>),
    Join { delimiter: String, parts: Vec<Value> },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn resource_ref(logical_id: impl Into<String>) -> Self {
        Value::ResourceRef(logical_id.into())
    }

    pub fn attr(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::ResourceAttr(logical_id.into(), attribute.into())
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Value::ParameterRef(name.into())
    }

    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// True if the value can only be known once the engine applies the stack
    pub fn is_symbolic(&self) -> bool {
        match self {
            Value::String(_) | Value::Int(_) | Value::Bool(_) => false,
            Value::List(items) => items.iter().any(Value::is_symbolic),
            Value::Map(map) => map.values().any(Value::is_symbolic),
            _ => true,
        }
    }

    /// Logical ids of every resource this value refers to
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.walk(&mut |v| match v {
            Value::ResourceRef(id) | Value::ResourceAttr(id, _) => {
                refs.insert(id.clone());
            }
            _ => {}
        });
        refs
    }

    /// Names of every parameter this value refers to
    pub fn parameter_references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.walk(&mut |v| {
            if let Value::ParameterRef(name) = v {
                refs.insert(name.clone());
            }
        });
        refs
    }

    /// Names of every mapping this value looks up
    pub fn mapping_references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.walk(&mut |v| {
            if let Value::FindInMap { map, .. } = v {
                refs.insert(map.clone());
            }
        });
        refs
    }

    fn walk(&self, visit: &mut dyn FnMut(&Value)) {
        visit(self);
        match self {
            Value::List(items) | Value::Join { parts: items, .. } => {
                for item in items {
                    item.walk(visit);
                }
            }
            Value::Map(map) => {
                for v in map.values() {
                    v.walk(visit);
                }
            }
            Value::FindInMap { top_key, .. } => top_key.walk(visit),
            Value::Select { list, .. } => list.walk(visit),
            Value::Base64(inner) => inner.walk(visit),
            _ => {}
        }
    }

    /// Substitute supplied parameter values
    ///
    /// Parameters without a supplied value stay symbolic.
    pub fn resolve_parameters(&self, values: &BTreeMap<String, String>) -> Value {
        match self {
            Value::ParameterRef(name) => values
                .get(name)
                .map(|v| Value::String(v.clone()))
                .unwrap_or_else(|| self.clone()),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| item.resolve_parameters(values))
                    .collect(),
            ),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.resolve_parameters(values)))
                    .collect(),
            ),
            Value::FindInMap {
                map,
                top_key,
                second_key,
            } => Value::FindInMap {
                map: map.clone(),
                top_key: Box::new(top_key.resolve_parameters(values)),
                second_key: second_key.clone(),
            },
            Value::Select { index, list } => Value::Select {
                index: *index,
                list: Box::new(list.resolve_parameters(values)),
            },
            Value::Base64(inner) => Value::Base64(Box::new(inner.resolve_parameters(values))),
            Value::Join { delimiter, parts } => Value::Join {
                delimiter: delimiter.clone(),
                parts: parts.iter().map(|p| p.resolve_parameters(values)).collect(),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                let strs: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", strs.join(", "))
            }
            Value::Map(map) => {
                let strs: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", strs.join(", "))
            }
            Value::ResourceRef(id) => write!(f, "ref({})", id),
            Value::ResourceAttr(id, attr) => write!(f, "{}.{}", id, attr),
            Value::ParameterRef(name) => write!(f, "param({})", name),
            Value::Pseudo(p) => write!(f, "{}", p.name()),
            Value::FindInMap {
                map,
                top_key,
                second_key,
            } => write!(f, "{}[{}][{}]", map, top_key, second_key),
            Value::Select { index, list } => write!(f, "{}[{}]", list, index),
            Value::AvailabilityZones => write!(f, "azs()"),
            Value::Base64(inner) => write!(f, "base64({})", inner),
            Value::Join { delimiter, parts } => {
                let strs: Vec<String> = parts.iter().map(|v| v.to_string()).collect();
                write!(f, "join(\"{}\", [{}])", delimiter, strs.join(", "))
            }
        }
    }
}

/// Desired state of one resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: BTreeMap<String, Value>,
    /// Ordering edges that no attribute expresses
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }

    pub fn logical_id(&self) -> &str {
        &self.id.name
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Logical ids referenced from attribute values
    pub fn references(&self) -> BTreeSet<String> {
        self.attributes
            .values()
            .flat_map(|v| v.references())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_collected_from_nested_values() {
        let value = Value::List(vec![
            Value::resource_ref("subnet_a"),
            Value::map([("target", Value::attr("alb", "DNSName"))]),
            Value::Base64(Box::new(Value::Join {
                delimiter: "".to_string(),
                parts: vec![Value::resource_ref("vpc")],
            })),
        ]);

        let refs: Vec<String> = value.references().into_iter().collect();
        assert_eq!(refs, vec!["alb", "subnet_a", "vpc"]);
    }

    #[test]
    fn literals_are_not_symbolic() {
        assert!(!Value::string("10.0.0.0/18").is_symbolic());
        assert!(!Value::List(vec![Value::Int(80), Value::Bool(true)]).is_symbolic());
        assert!(Value::List(vec![Value::parameter("KeyPair")]).is_symbolic());
        assert!(Value::AvailabilityZones.is_symbolic());
    }

    #[test]
    fn resolve_parameters_substitutes_known_values_only() {
        let mut values = BTreeMap::new();
        values.insert("KeyPair".to_string(), "my-key".to_string());

        let value = Value::List(vec![Value::parameter("KeyPair"), Value::parameter("YourIp")]);
        assert_eq!(
            value.resolve_parameters(&values),
            Value::List(vec![Value::string("my-key"), Value::parameter("YourIp")])
        );
    }

    #[test]
    fn depends_on_is_deduplicated() {
        let resource = Resource::new("ec2.route", "PublicRoute")
            .with_depends_on("AttachGateway")
            .with_depends_on("AttachGateway");
        assert_eq!(resource.depends_on, vec!["AttachGateway"]);
    }

    #[test]
    fn resource_references_skip_depends_on() {
        let resource = Resource::new("ec2.subnet", "PublicSubnet1")
            .with_attribute("vpc_id", Value::resource_ref("EngineeringVpc"))
            .with_depends_on("InternetGateway");
        let refs: Vec<String> = resource.references().into_iter().collect();
        assert_eq!(refs, vec!["EngineeringVpc"]);
    }
}
