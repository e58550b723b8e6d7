//! Plan - Order in which the engine may create a stack's resources
//!
//! Nothing is executed here. The plan only shows how the dependency edges
//! of a stack sequence its resources: stage `n` may start once every
//! earlier stage is complete, and resources within a stage are independent.

use std::collections::BTreeMap;
use std::fmt;

use crate::graph::GraphError;
use crate::resource::ResourceId;
use crate::stack::Stack;

#[derive(Debug, Clone, Default)]
pub struct ApplyPlan {
    stages: Vec<Vec<ResourceId>>,
}

impl ApplyPlan {
    pub fn from_stack(stack: &Stack) -> Result<Self, GraphError> {
        let graph = stack.dependency_graph()?;
        let stages = graph
            .stages()?
            .into_iter()
            .map(|stage| {
                stage
                    .iter()
                    .filter_map(|name| stack.resource(name).map(|r| r.id.clone()))
                    .collect()
            })
            .collect();
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Vec<ResourceId>] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn resource_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// 0-based stage in which a resource is created
    pub fn stage_of(&self, logical_id: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.iter().any(|id| id.name == logical_id))
    }

    /// Generate a summary of the Plan for display
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            stages: self.stages.len(),
            ..Default::default()
        };
        for id in self.stages.iter().flatten() {
            *summary.by_type.entry(id.resource_type.clone()).or_default() += 1;
        }
        summary
    }
}

#[derive(Debug, Default)]
pub struct PlanSummary {
    pub stages: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.by_type.values().sum()
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan: {} resources in {} stages",
            self.total(),
            self.stages
        )
    }
}
