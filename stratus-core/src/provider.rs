//! Provider - Traits at the boundary with the provisioning engine
//!
//! A `Provider` knows the resource types of one cloud and turns a stack into
//! the document its engine consumes. An `Engine` hands that document over
//! and reports what the engine did with it.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::resource::ResourceId;
use crate::stack::Stack;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "ec2.vpc")
    fn name(&self) -> &'static str;

    /// Engine-side type name (e.g., "AWS::EC2::VPC")
    fn engine_type(&self) -> &'static str;
}

/// Main Provider trait
///
/// Synthesis is pure: no provider call performs I/O.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "aws")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Check every resource of the stack against the provider's schemas
    fn validate(&self, stack: &Stack) -> Result<(), Vec<ProviderError>>;

    /// Render the stack as the engine's template document
    fn synthesize(&self, stack: &Stack) -> ProviderResult<String>;
}

/// Template and parameter values handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    pub stack_name: String,
    pub template_body: String,
    pub parameters: BTreeMap<String, String>,
}

/// What the engine reports after a deployment settles
#[derive(Debug, Clone, PartialEq)]
pub struct DeployOutcome {
    pub stack_id: String,
    pub status: String,
    /// False when the engine found nothing to change
    pub changed: bool,
    pub outputs: BTreeMap<String, String>,
}

/// External provisioning engine
///
/// All reconciliation happens behind this trait.
pub trait Engine: Send + Sync {
    /// Name of this Engine (e.g., "cloudformation")
    fn name(&self) -> &'static str;

    /// Create or update the stack and wait until it settles
    fn deploy(&self, request: &DeployRequest) -> BoxFuture<'_, ProviderResult<DeployOutcome>>;

    /// Outputs of a deployed stack
    fn outputs(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<BTreeMap<String, String>>>;

    /// Delete the stack and wait until it is gone
    fn destroy(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<()>>;
}

impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn validate(&self, stack: &Stack) -> Result<(), Vec<ProviderError>> {
        (**self).validate(stack)
    }

    fn synthesize(&self, stack: &Stack) -> ProviderResult<String> {
        (**self).synthesize(stack)
    }
}

impl Engine for Box<dyn Engine> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn deploy(&self, request: &DeployRequest) -> BoxFuture<'_, ProviderResult<DeployOutcome>> {
        (**self).deploy(request)
    }

    fn outputs(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<BTreeMap<String, String>>> {
        (**self).outputs(stack_name)
    }

    fn destroy(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).destroy(stack_name)
    }
}
