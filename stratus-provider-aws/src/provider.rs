//! AWS Provider - schema validation and template synthesis

use stratus_core::provider::{Provider, ProviderError, ProviderResult, ResourceType};
use stratus_core::stack::Stack;

use crate::resources;
use crate::schemas::get_schema_config;
use crate::synth::synthesize_to_string;

/// AWS Provider
///
/// Stateless: every call works on the stack it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsProvider;

impl AwsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn validate(&self, stack: &Stack) -> Result<(), Vec<ProviderError>> {
        let mut errors: Vec<ProviderError> = match stack.validate() {
            Ok(()) => Vec::new(),
            Err(graph_errors) => graph_errors
                .into_iter()
                .map(|e| ProviderError::new(e.to_string()))
                .collect(),
        };

        for resource in stack.resources() {
            let Some(config) = get_schema_config(&resource.id.resource_type) else {
                errors.push(
                    ProviderError::new("unsupported resource type")
                        .for_resource(resource.id.clone()),
                );
                continue;
            };
            if let Err(type_errors) = config.schema.validate(&resource.attributes) {
                for e in type_errors {
                    errors.push(
                        ProviderError::new(e.to_string()).for_resource(resource.id.clone()),
                    );
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn synthesize(&self, stack: &Stack) -> ProviderResult<String> {
        synthesize_to_string(stack).map_err(|e| {
            ProviderError::new(format!("Failed to synthesize {}", stack.name())).with_cause(e)
        })
    }
}
