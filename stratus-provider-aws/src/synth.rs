//! Synthesis - Render a stack as a CloudFormation template
//!
//! Symbolic values become CloudFormation intrinsic functions. Explicit
//! `depends_on` edges become `DependsOn`; edges implied by references are
//! left to CloudFormation, which infers them from `Ref` and `Fn::GetAtt`.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json, json};
use stratus_core::graph::GraphError;
use stratus_core::parameter::Parameter;
use stratus_core::resource::{Resource, ResourceId, Value};
use stratus_core::stack::Stack;
use thiserror::Error;

use crate::case_convert::to_pascal_case;
use crate::schemas::{AwsSchemaConfig, configs};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Unsupported resource type '{}' for {}", .0.resource_type, .0.name)]
    UnsupportedResourceType(ResourceId),

    #[error("Invalid resource graph:\n  {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n  "))]
    InvalidGraph(Vec<GraphError>),

    #[error("Tags of {0} must be a map of strings")]
    InvalidTags(ResourceId),

    #[error("Failed to serialize template: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Build the CloudFormation template document for a stack
pub fn synthesize(stack: &Stack) -> Result<Json, SynthError> {
    stack.validate().map_err(SynthError::InvalidGraph)?;

    let configs: BTreeMap<&'static str, AwsSchemaConfig> = configs()
        .into_iter()
        .map(|c| (c.resource_type_name, c))
        .collect();

    let mut template = Map::new();
    template.insert(
        "AWSTemplateFormatVersion".to_string(),
        json!(TEMPLATE_FORMAT_VERSION),
    );
    if let Some(description) = stack.description() {
        template.insert("Description".to_string(), json!(description));
    }

    if !stack.parameters().is_empty() {
        let parameters: Map<String, Json> = stack
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), render_parameter(p)))
            .collect();
        template.insert("Parameters".to_string(), Json::Object(parameters));
    }

    if !stack.mappings().is_empty() {
        template.insert("Mappings".to_string(), json!(stack.mappings()));
    }

    let mut resources = Map::new();
    for resource in stack.resources() {
        let config = configs
            .get(resource.id.resource_type.as_str())
            .ok_or_else(|| SynthError::UnsupportedResourceType(resource.id.clone()))?;
        log::debug!("render {} as {}", resource.id, config.aws_type_name);
        resources.insert(
            resource.logical_id().to_string(),
            render_resource(resource, config)?,
        );
    }
    template.insert("Resources".to_string(), Json::Object(resources));

    if !stack.outputs().is_empty() {
        let mut outputs = Map::new();
        for output in stack.outputs() {
            let mut body = Map::new();
            if let Some(description) = &output.description {
                body.insert("Description".to_string(), json!(description));
            }
            body.insert("Value".to_string(), render_value(&output.value));
            if let Some(export) = &output.export_name {
                body.insert("Export".to_string(), json!({ "Name": render_value(export) }));
            }
            outputs.insert(output.name.clone(), Json::Object(body));
        }
        template.insert("Outputs".to_string(), Json::Object(outputs));
    }

    Ok(Json::Object(template))
}

/// Synthesize and serialize as pretty-printed JSON
pub fn synthesize_to_string(stack: &Stack) -> Result<String, SynthError> {
    let template = synthesize(stack)?;
    Ok(serde_json::to_string_pretty(&template)?)
}

fn render_parameter(parameter: &Parameter) -> Json {
    let mut body = Map::new();
    body.insert("Type".to_string(), json!(parameter.param_type.type_name()));
    if let Some(default) = &parameter.default {
        body.insert("Default".to_string(), json!(default));
    }
    if !parameter.allowed_values.is_empty() {
        body.insert("AllowedValues".to_string(), json!(parameter.allowed_values));
    }
    if let Some(pattern) = &parameter.allowed_pattern {
        body.insert("AllowedPattern".to_string(), json!(pattern));
    }
    if let Some(description) = &parameter.description {
        body.insert("Description".to_string(), json!(description));
    }
    if let Some(constraint) = &parameter.constraint_description {
        body.insert("ConstraintDescription".to_string(), json!(constraint));
    }
    Json::Object(body)
}

fn render_resource(resource: &Resource, config: &AwsSchemaConfig) -> Result<Json, SynthError> {
    let mut properties = Map::new();
    for (name, value) in &resource.attributes {
        let property = config
            .schema
            .attributes
            .get(name)
            .and_then(|a| a.provider_name.clone())
            .unwrap_or_else(|| to_pascal_case(name));

        let rendered = if name == "tags" && config.has_tags {
            render_tags(value).ok_or_else(|| SynthError::InvalidTags(resource.id.clone()))?
        } else {
            render_value(value)
        };
        properties.insert(property, rendered);
    }

    let mut body = Map::new();
    body.insert("Type".to_string(), json!(config.aws_type_name));
    if !properties.is_empty() {
        body.insert("Properties".to_string(), Json::Object(properties));
    }
    if !resource.depends_on.is_empty() {
        body.insert("DependsOn".to_string(), json!(resource.depends_on));
    }
    Ok(Json::Object(body))
}

/// Tags map -> `[{"Key": ..., "Value": ...}]`, sorted by key
fn render_tags(value: &Value) -> Option<Json> {
    let Value::Map(map) = value else {
        return None;
    };
    let tags = map
        .iter()
        .map(|(k, v)| match v {
            Value::String(_) => Some(json!({ "Key": k, "Value": render_value(v) })),
            v if v.is_symbolic() => Some(json!({ "Key": k, "Value": render_value(v) })),
            _ => None,
        })
        .collect::<Option<Vec<Json>>>()?;
    Some(Json::Array(tags))
}

/// Render a value, turning symbolic expressions into intrinsic functions
pub fn render_value(value: &Value) -> Json {
    match value {
        Value::String(s) => json!(s),
        Value::Int(n) => json!(n),
        Value::Bool(b) => json!(b),
        Value::List(items) => Json::Array(items.iter().map(render_value).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (to_pascal_case(k), render_value(v)))
                .collect(),
        ),
        Value::ResourceRef(id) | Value::ParameterRef(id) => json!({ "Ref": id }),
        Value::ResourceAttr(id, attr) => json!({ "Fn::GetAtt": [id, attr] }),
        Value::Pseudo(p) => json!({ "Ref": p.name() }),
        Value::FindInMap {
            map,
            top_key,
            second_key,
        } => json!({ "Fn::FindInMap": [map, render_value(top_key), second_key] }),
        Value::Select { index, list } => json!({ "Fn::Select": [index, render_value(list)] }),
        Value::AvailabilityZones => json!({ "Fn::GetAZs": "" }),
        Value::Base64(inner) => json!({ "Fn::Base64": render_value(inner) }),
        Value::Join { delimiter, parts } => {
            let parts: Vec<Json> = parts.iter().map(render_value).collect();
            json!({ "Fn::Join": [delimiter, parts] })
        }
    }
}
