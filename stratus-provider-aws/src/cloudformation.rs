//! CloudFormation engine
//!
//! Hands synthesized templates to AWS CloudFormation and waits for the
//! stack to settle. Every resource operation happens inside CloudFormation;
//! this module only submits requests and polls stack status.

use std::collections::BTreeMap;
use std::time::Duration;

use aws_config::Region;
use aws_sdk_cloudformation::Client as CloudFormationClient;
use aws_sdk_cloudformation::types::{Output, Parameter, Stack as CfnStack};
use stratus_core::provider::{
    BoxFuture, DeployOutcome, DeployRequest, Engine, ProviderError, ProviderResult,
};

/// Coarse state of a CloudFormation stack status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    InProgress,
    Succeeded,
    Failed,
    Deleted,
}

/// Classify a CloudFormation stack status (e.g. "UPDATE_ROLLBACK_COMPLETE")
pub fn classify_status(status: &str) -> StackPhase {
    match status {
        "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "IMPORT_COMPLETE" => StackPhase::Succeeded,
        "DELETE_COMPLETE" => StackPhase::Deleted,
        s if s.ends_with("_IN_PROGRESS") => StackPhase::InProgress,
        _ => StackPhase::Failed,
    }
}

fn is_missing_stack(err: &str) -> bool {
    err.contains("does not exist")
}

fn is_no_op_update(err: &str) -> bool {
    err.contains("No updates are to be performed")
}

/// Settled statuses from which CloudFormation accepts no further updates
fn is_unrecoverable(status: &str) -> bool {
    status.ends_with("_FAILED") || status == "ROLLBACK_COMPLETE" || status == "DELETE_COMPLETE"
}

/// How a deploy request is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeployAction {
    Create,
    Update,
}

/// Choose create or update from the status of the existing stack, if any
fn deploy_action(name: &str, existing: Option<&str>) -> ProviderResult<DeployAction> {
    match existing {
        None => Ok(DeployAction::Create),
        Some(status) if classify_status(status) == StackPhase::InProgress => {
            Err(ProviderError::new(format!("Stack {} is busy ({})", name, status)))
        }
        Some(status) if is_unrecoverable(status) => Err(ProviderError::new(format!(
            "Stack {} is in {} and must be destroyed before it can be deployed again",
            name, status
        ))),
        Some(_) => Ok(DeployAction::Update),
    }
}

/// Map an `UpdateStack` error to "nothing changed" or a failure
fn update_rejection(name: &str, err: &str) -> ProviderResult<bool> {
    if is_no_op_update(err) {
        Ok(false)
    } else {
        Err(ProviderError::new(format!(
            "Failed to update stack {}: {}",
            name, err
        )))
    }
}

/// Decide whether a settled stack status completes the deploy
///
/// A no-op update leaves the stack where it was, so a stable rollback
/// status such as `UPDATE_ROLLBACK_COMPLETE` is accepted when nothing changed.
fn settle(name: &str, status: &str, changed: bool, reason: Option<&str>) -> ProviderResult<()> {
    let accepted = match classify_status(status) {
        StackPhase::Succeeded => true,
        StackPhase::Failed => !changed && !is_unrecoverable(status),
        StackPhase::InProgress | StackPhase::Deleted => false,
    };
    if accepted {
        Ok(())
    } else {
        Err(ProviderError::new(format!(
            "Stack {} ended in {}: {}",
            name,
            status,
            reason.unwrap_or("no reason given")
        )))
    }
}

fn status_of(stack: &CfnStack) -> String {
    stack
        .stack_status()
        .map(|s| s.as_str().to_string())
        .unwrap_or_default()
}

fn collect_outputs(outputs: &[Output]) -> BTreeMap<String, String> {
    outputs
        .iter()
        .filter_map(|o| Some((o.output_key()?.to_string(), o.output_value()?.to_string())))
        .collect()
}

/// AWS CloudFormation engine
pub struct CloudFormationEngine {
    client: CloudFormationClient,
    region: String,
    poll_interval: Duration,
    max_attempts: u32,
}

impl CloudFormationEngine {
    /// Create a new engine for the specified region
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: CloudFormationClient::new(&config),
            region: region.to_string(),
            poll_interval: Duration::from_secs(5),
            max_attempts: 360,
        }
    }

    /// Describe a stack; `None` if it does not exist
    async fn describe_stack(&self, stack_name: &str) -> ProviderResult<Option<CfnStack>> {
        match self.client.describe_stacks().stack_name(stack_name).send().await {
            Ok(output) => Ok(output.stacks().first().cloned()),
            Err(e) => {
                let err_str = format!("{:?}", e);
                if is_missing_stack(&err_str) {
                    Ok(None)
                } else {
                    Err(ProviderError::new(format!(
                        "Failed to describe stack {}: {}",
                        stack_name, err_str
                    )))
                }
            }
        }
    }

    /// Poll until the stack leaves every *_IN_PROGRESS status
    async fn wait_for_stack(&self, stack_name: &str) -> ProviderResult<Option<CfnStack>> {
        for _ in 0..self.max_attempts {
            let Some(stack) = self.describe_stack(stack_name).await? else {
                return Ok(None);
            };
            let status = status_of(&stack);

            match classify_status(&status) {
                StackPhase::InProgress => {
                    log::debug!("{} is {}", stack_name, status);
                    tokio::time::sleep(self.poll_interval).await;
                }
                _ => return Ok(Some(stack)),
            }
        }

        Err(ProviderError::new(format!(
            "Timed out waiting for stack {} to settle",
            stack_name
        )))
    }

    fn parameters(request: &DeployRequest) -> Vec<Parameter> {
        request
            .parameters
            .iter()
            .map(|(k, v)| {
                Parameter::builder()
                    .parameter_key(k)
                    .parameter_value(v)
                    .build()
            })
            .collect()
    }

    async fn deploy_stack(&self, request: &DeployRequest) -> ProviderResult<DeployOutcome> {
        let name = request.stack_name.as_str();
        let existing = self.describe_stack(name).await?;
        let existing_status = existing.as_ref().map(status_of);

        let changed = match deploy_action(name, existing_status.as_deref())? {
            DeployAction::Create => {
                log::info!("creating stack {} in {}", name, self.region);
                self.client
                    .create_stack()
                    .stack_name(name)
                    .template_body(&request.template_body)
                    .set_parameters(Some(Self::parameters(request)))
                    .send()
                    .await
                    .map_err(|e| {
                        ProviderError::new(format!("Failed to create stack {}: {:?}", name, e))
                    })?;
                true
            }
            DeployAction::Update => {
                log::info!("updating stack {} in {}", name, self.region);
                let result = self
                    .client
                    .update_stack()
                    .stack_name(name)
                    .template_body(&request.template_body)
                    .set_parameters(Some(Self::parameters(request)))
                    .send()
                    .await;
                match result {
                    Ok(_) => true,
                    Err(e) => update_rejection(name, &format!("{:?}", e))?,
                }
            }
        };

        if !changed {
            log::info!("stack {} is up to date", name);
        }

        let stack = self
            .wait_for_stack(name)
            .await?
            .ok_or_else(|| ProviderError::new(format!("Stack {} disappeared", name)))?;
        let status = status_of(&stack);
        settle(name, &status, changed, stack.stack_status_reason())?;

        Ok(DeployOutcome {
            stack_id: stack.stack_id().unwrap_or_default().to_string(),
            status,
            changed,
            outputs: collect_outputs(stack.outputs()),
        })
    }

    async fn read_outputs(&self, stack_name: &str) -> ProviderResult<BTreeMap<String, String>> {
        let stack = self
            .describe_stack(stack_name)
            .await?
            .ok_or_else(|| ProviderError::new(format!("Stack {} does not exist", stack_name)))?;
        Ok(collect_outputs(stack.outputs()))
    }

    async fn delete_stack(&self, stack_name: &str) -> ProviderResult<()> {
        if self.describe_stack(stack_name).await?.is_none() {
            log::info!("stack {} does not exist, nothing to delete", stack_name);
            return Ok(());
        }

        log::info!("deleting stack {}", stack_name);
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to delete stack {}: {:?}", stack_name, e))
            })?;

        match self.wait_for_stack(stack_name).await? {
            None => Ok(()),
            Some(stack) => {
                let status = status_of(&stack);
                if classify_status(&status) == StackPhase::Deleted {
                    Ok(())
                } else {
                    Err(ProviderError::new(format!(
                        "Stack {} ended in {}: {}",
                        stack_name,
                        status,
                        stack.stack_status_reason().unwrap_or("no reason given")
                    )))
                }
            }
        }
    }
}

impl Engine for CloudFormationEngine {
    fn name(&self) -> &'static str {
        "cloudformation"
    }

    fn deploy(&self, request: &DeployRequest) -> BoxFuture<'_, ProviderResult<DeployOutcome>> {
        let request = request.clone();
        Box::pin(async move { self.deploy_stack(&request).await })
    }

    fn outputs(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<BTreeMap<String, String>>> {
        let stack_name = stack_name.to_string();
        Box::pin(async move { self.read_outputs(&stack_name).await })
    }

    fn destroy(&self, stack_name: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let stack_name = stack_name.to_string();
        Box::pin(async move { self.delete_stack(&stack_name).await })
    }
}
