//! Stack - The resource graph handed to the provisioning engine
//!
//! A stack is assembled once by a construction function and then only read.
//! It carries parameters, mappings, resources and outputs in declaration
//! order so synthesis is deterministic.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::graph::{DependencyGraph, GraphError};
use crate::output::Output;
use crate::parameter::{Parameter, ParameterError};
use crate::resource::{Resource, Value};

/// Two-level string table (`map -> top key -> second key -> value`)
pub type Mapping = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    #[error("Resource '{0}' is already declared")]
    DuplicateResource(String),

    #[error("Parameter '{0}' is already declared")]
    DuplicateParameter(String),

    #[error("Mapping '{0}' is already declared")]
    DuplicateMapping(String),

    #[error("Output '{0}' is already declared")]
    DuplicateOutput(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone, Default)]
pub struct Stack {
    name: String,
    description: Option<String>,
    parameters: Vec<Parameter>,
    mappings: BTreeMap<String, Mapping>,
    resources: Vec<Resource>,
    outputs: Vec<Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), StackError> {
        if self.parameter(&parameter.name).is_some() {
            return Err(StackError::DuplicateParameter(parameter.name));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn add_mapping(
        &mut self,
        name: impl Into<String>,
        mapping: Mapping,
    ) -> Result<(), StackError> {
        let name = name.into();
        if self.mappings.contains_key(&name) {
            return Err(StackError::DuplicateMapping(name));
        }
        self.mappings.insert(name, mapping);
        Ok(())
    }

    pub fn add_resource(&mut self, resource: Resource) -> Result<(), StackError> {
        if self.resource(resource.logical_id()).is_some() {
            return Err(StackError::DuplicateResource(resource.id.name));
        }
        log::debug!("declare {}", resource.id);
        self.resources.push(resource);
        Ok(())
    }

    pub fn add_output(&mut self, output: Output) -> Result<(), StackError> {
        if self.outputs.iter().any(|o| o.name == output.name) {
            return Err(StackError::DuplicateOutput(output.name));
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn mappings(&self) -> &BTreeMap<String, Mapping> {
        &self.mappings
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id() == logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.id.resource_type == resource_type)
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn dependency_graph(&self) -> Result<DependencyGraph, GraphError> {
        DependencyGraph::from_resources(&self.resources)
    }

    /// Check that every reference resolves within the stack
    ///
    /// Collects all construction errors rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        let declared: HashSet<&str> = self.resources.iter().map(|r| r.logical_id()).collect();
        let mut errors = Vec::new();

        let check_value = |from: &str, used_in: &str, value: &Value, errors: &mut Vec<GraphError>| {
            for target in value.references() {
                if !declared.contains(target.as_str()) {
                    errors.push(GraphError::UndeclaredResource {
                        from: from.to_string(),
                        target,
                        used_in: used_in.to_string(),
                    });
                }
            }
            for parameter in value.parameter_references() {
                if self.parameter(&parameter).is_none() {
                    errors.push(GraphError::UndeclaredParameter {
                        from: from.to_string(),
                        parameter,
                    });
                }
            }
            for mapping in value.mapping_references() {
                if !self.mappings.contains_key(&mapping) {
                    errors.push(GraphError::UndeclaredMapping {
                        from: from.to_string(),
                        mapping,
                    });
                }
            }
        };

        for resource in &self.resources {
            for (attr, value) in &resource.attributes {
                check_value(resource.logical_id(), attr, value, &mut errors);
            }
            for target in &resource.depends_on {
                if !declared.contains(target.as_str()) {
                    errors.push(GraphError::UndeclaredResource {
                        from: resource.logical_id().to_string(),
                        target: target.clone(),
                        used_in: "depends_on".to_string(),
                    });
                }
            }
        }

        for output in &self.outputs {
            let from = format!("output {}", output.name);
            check_value(&from, "value", &output.value, &mut errors);
            if let Some(export) = &output.export_name {
                check_value(&from, "export", export, &mut errors);
            }
        }

        if errors.is_empty() {
            if let Some(members) = self.dependency_graph().ok().and_then(|g| g.find_cycle()) {
                errors.push(GraphError::Cycle { members });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Effective parameter values for a deployment
    ///
    /// Applies defaults and checks every constraint; unknown supplied names
    /// are rejected.
    pub fn resolve_parameters(
        &self,
        supplied: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, Vec<ParameterError>> {
        let mut resolved = BTreeMap::new();
        let mut errors = Vec::new();

        for name in supplied.keys() {
            if self.parameter(name).is_none() {
                errors.push(ParameterError::Unknown { name: name.clone() });
            }
        }

        for parameter in &self.parameters {
            match parameter.check(supplied.get(&parameter.name).map(String::as_str)) {
                Ok(value) => {
                    resolved.insert(parameter.name.clone(), value);
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(resolved)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterType;

    fn small_stack() -> Stack {
        let mut stack = Stack::new("test");
        stack
            .add_parameter(
                Parameter::new("InstanceType", ParameterType::String)
                    .with_allowed_values(["t2.micro", "t2.small"])
                    .with_default("t2.micro"),
            )
            .unwrap();
        stack
            .add_parameter(Parameter::new("KeyPair", ParameterType::KeyPairName))
            .unwrap();
        stack.add_resource(Resource::new("ec2.vpc", "vpc")).unwrap();
        stack
            .add_resource(
                Resource::new("ec2.instance", "web")
                    .with_attribute("instance_type", Value::parameter("InstanceType"))
                    .with_attribute("key_name", Value::parameter("KeyPair")),
            )
            .unwrap();
        stack
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut stack = small_stack();
        assert_eq!(
            stack.add_resource(Resource::new("ec2.subnet", "vpc")),
            Err(StackError::DuplicateResource("vpc".to_string()))
        );
        assert_eq!(
            stack.add_parameter(Parameter::new("KeyPair", ParameterType::String)),
            Err(StackError::DuplicateParameter("KeyPair".to_string()))
        );
        stack.add_output(Output::new("Out", Value::resource_ref("vpc"))).unwrap();
        assert!(stack.add_output(Output::new("Out", Value::resource_ref("vpc"))).is_err());
    }

    #[test]
    fn validate_collects_every_dangling_reference() {
        let mut stack = small_stack();
        stack
            .add_resource(
                Resource::new("ec2.subnet", "subnet")
                    .with_attribute("vpc_id", Value::resource_ref("missing_vpc"))
                    .with_attribute("az", Value::parameter("Zone"))
                    .with_attribute(
                        "image",
                        Value::FindInMap {
                            map: "Images".to_string(),
                            top_key: Box::new(Value::Pseudo(
                                crate::resource::PseudoParameter::Region,
                            )),
                            second_key: "ami".to_string(),
                        },
                    )
                    .with_depends_on("ghost"),
            )
            .unwrap();
        stack
            .add_output(Output::new("Url", Value::attr("alb", "DNSName")))
            .unwrap();

        let errors = stack.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(
            e,
            GraphError::UndeclaredParameter { parameter, .. } if parameter == "Zone"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            GraphError::UndeclaredMapping { mapping, .. } if mapping == "Images"
        )));
    }

    #[test]
    fn validate_detects_cycles() {
        let mut stack = Stack::new("cyclic");
        stack
            .add_resource(Resource::new("test", "a").with_depends_on("b"))
            .unwrap();
        stack
            .add_resource(Resource::new("test", "b").with_depends_on("a"))
            .unwrap();
        let errors = stack.validate().unwrap_err();
        assert!(matches!(errors[0], GraphError::Cycle { .. }));
    }

    #[test]
    fn resolve_parameters_applies_defaults_and_constraints() {
        let stack = small_stack();

        let mut supplied = BTreeMap::new();
        supplied.insert("KeyPair".to_string(), "my-key".to_string());
        let resolved = stack.resolve_parameters(&supplied).unwrap();
        assert_eq!(resolved["InstanceType"], "t2.micro");
        assert_eq!(resolved["KeyPair"], "my-key");

        supplied.insert("InstanceType".to_string(), "m5.large".to_string());
        supplied.insert("Bogus".to_string(), "x".to_string());
        let errors = stack.resolve_parameters(&supplied).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ParameterError::Unknown {
            name: "Bogus".to_string()
        }));
    }

    #[test]
    fn resources_of_type_filters_in_declaration_order() {
        let stack = small_stack();
        let names: Vec<&str> = stack
            .resources_of_type("ec2.instance")
            .map(|r| r.logical_id())
            .collect();
        assert_eq!(names, vec!["web"]);
        assert!(stack.validate().is_ok());
    }
}
