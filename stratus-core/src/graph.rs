//! Graph - Dependency analysis over declared resources
//!
//! Edges come from two places: symbolic references inside attribute values,
//! and explicit `depends_on` entries for orderings no attribute expresses
//! (a route must wait for the gateway attachment, for example).

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use crate::resource::Resource;

/// Graph-construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{from} refers to undeclared resource '{target}' (in {used_in})")]
    UndeclaredResource {
        from: String,
        target: String,
        used_in: String,
    },

    #[error("{from} refers to undeclared parameter '{parameter}'")]
    UndeclaredParameter { from: String, parameter: String },

    #[error("{from} refers to undeclared mapping '{mapping}'")]
    UndeclaredMapping { from: String, mapping: String },

    #[error("Dependency cycle involving: {}", members.join(" -> "))]
    Cycle { members: Vec<String> },
}

/// How a dependency edge was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// An attribute value refers to the target
    Reference,
    /// Listed in `depends_on`
    Explicit,
}

/// Dependency between resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Target logical id
    pub target: String,
    pub kind: DependencyKind,
    /// Where this reference is used (attribute name, or "depends_on")
    pub used_in: String,
}

/// Dependency graph for the resources of one stack
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Logical ids in declaration order
    pub nodes: Vec<String>,
    /// Logical id -> list of dependencies
    pub edges: HashMap<String, Vec<Dependency>>,
    /// Reverse edges: target -> list of resources that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a set of resources
    ///
    /// Fails on the first edge whose target is not among `resources`.
    pub fn from_resources(resources: &[Resource]) -> Result<Self, GraphError> {
        let declared: HashSet<&str> = resources.iter().map(|r| r.logical_id()).collect();
        let mut graph = Self::new();

        for resource in resources {
            graph.add_node(resource.logical_id());
        }

        for resource in resources {
            let from = resource.logical_id();
            for (attr, value) in &resource.attributes {
                for target in value.references() {
                    if !declared.contains(target.as_str()) {
                        return Err(GraphError::UndeclaredResource {
                            from: from.to_string(),
                            target,
                            used_in: attr.clone(),
                        });
                    }
                    graph.add_edge(
                        from.to_string(),
                        Dependency {
                            target,
                            kind: DependencyKind::Reference,
                            used_in: attr.clone(),
                        },
                    );
                }
            }
            for target in &resource.depends_on {
                if !declared.contains(target.as_str()) {
                    return Err(GraphError::UndeclaredResource {
                        from: from.to_string(),
                        target: target.clone(),
                        used_in: "depends_on".to_string(),
                    });
                }
                graph.add_edge(
                    from.to_string(),
                    Dependency {
                        target: target.clone(),
                        kind: DependencyKind::Explicit,
                        used_in: "depends_on".to_string(),
                    },
                );
            }
        }

        Ok(graph)
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.nodes.iter().any(|n| n == name) {
            self.nodes.push(name.to_string());
        }
    }

    /// Add a dependency edge
    pub fn add_edge(&mut self, from: String, dependency: Dependency) {
        self.add_node(&from);
        self.add_node(&dependency.target);
        let target = dependency.target.clone();
        let deps = self.edges.entry(from.clone()).or_default();
        if deps
            .iter()
            .any(|d| d.target == dependency.target && d.kind == dependency.kind)
        {
            return;
        }
        deps.push(dependency);
        let dependents = self.reverse_edges.entry(target).or_default();
        if !dependents.contains(&from) {
            dependents.push(from);
        }
    }

    /// Resources that depend on nothing
    pub fn root_resources(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| self.dependencies_of(n).is_empty())
            .cloned()
            .collect()
    }

    /// Resources that nothing depends on
    pub fn leaf_resources(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| self.dependents_of(n).is_empty())
            .cloned()
            .collect()
    }

    /// Get direct dependencies of a resource
    pub fn dependencies_of(&self, resource: &str) -> &[Dependency] {
        self.edges.get(resource).map_or(&[], |v| v.as_slice())
    }

    /// Get resources that depend on this resource
    pub fn dependents_of(&self, resource: &str) -> &[String] {
        self.reverse_edges
            .get(resource)
            .map_or(&[], |v| v.as_slice())
    }

    /// Distinct logical ids a resource depends on
    pub fn targets_of(&self, resource: &str) -> BTreeSet<&str> {
        self.dependencies_of(resource)
            .iter()
            .map(|d| d.target.as_str())
            .collect()
    }

    /// True if `from` reaches `to` through any chain of dependencies
    pub fn depends_transitively(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            for dep in self.dependencies_of(node) {
                if dep.target == to {
                    return true;
                }
                if seen.insert(dep.target.as_str()) {
                    stack.push(&dep.target);
                }
            }
        }
        false
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Members of one cycle, if any
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if let Some(cycle) = self.find_cycle_util(node, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn find_cycle_util(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|n| n == node) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if visited.contains(node) {
            return None;
        }

        visited.insert(node.to_string());
        path.push(node.to_string());

        for dep in self.dependencies_of(node) {
            if let Some(cycle) = self.find_cycle_util(&dep.target, visited, path) {
                return Some(cycle);
            }
        }

        path.pop();
        None
    }

    /// Dependencies-first order, ties broken by declaration order
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        Ok(self.stages()?.into_iter().flatten().collect())
    }

    /// Group resources into levels: every dependency of a resource in
    /// level `n` sits in a level below `n`
    pub fn stages(&self) -> Result<Vec<Vec<String>>, GraphError> {
        let mut remaining: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), self.targets_of(n).len()))
            .collect();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<String> = self
                .nodes
                .iter()
                .filter(|n| remaining.get(n.as_str()) == Some(&0))
                .cloned()
                .collect();

            if ready.is_empty() {
                let members = self.find_cycle().unwrap_or_else(|| {
                    let mut left: Vec<String> = remaining.keys().map(|k| k.to_string()).collect();
                    left.sort();
                    left
                });
                return Err(GraphError::Cycle { members });
            }

            for name in &ready {
                remaining.remove(name.as_str());
                for dependent in self.dependents_of(name) {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                    }
                }
            }
            stages.push(ready);
        }

        Ok(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Value;

    fn network() -> Vec<Resource> {
        vec![
            Resource::new("ec2.vpc", "vpc"),
            Resource::new("ec2.internet_gateway", "igw"),
            Resource::new("ec2.vpc_gateway_attachment", "attach")
                .with_attribute("vpc_id", Value::resource_ref("vpc"))
                .with_attribute("internet_gateway_id", Value::resource_ref("igw")),
            Resource::new("ec2.route_table", "rt")
                .with_attribute("vpc_id", Value::resource_ref("vpc")),
            Resource::new("ec2.route", "route")
                .with_attribute("route_table_id", Value::resource_ref("rt"))
                .with_attribute("gateway_id", Value::resource_ref("igw"))
                .with_depends_on("attach"),
        ]
    }

    #[test]
    fn edges_from_references_and_depends_on() {
        let graph = DependencyGraph::from_resources(&network()).unwrap();

        let deps = graph.dependencies_of("route");
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().any(|d| d.target == "attach" && d.kind == DependencyKind::Explicit));
        assert_eq!(graph.dependents_of("vpc"), &["attach".to_string(), "rt".to_string()]);
        assert!(graph.depends_transitively("route", "vpc"));
        assert!(!graph.depends_transitively("vpc", "route"));
    }

    #[test]
    fn roots_and_leaves() {
        let graph = DependencyGraph::from_resources(&network()).unwrap();
        assert_eq!(graph.root_resources(), vec!["vpc", "igw"]);
        assert_eq!(graph.leaf_resources(), vec!["route"]);
    }

    #[test]
    fn undeclared_reference_is_a_construction_error() {
        let resources = vec![
            Resource::new("ec2.subnet", "subnet")
                .with_attribute("vpc_id", Value::resource_ref("vpc")),
        ];
        let err = DependencyGraph::from_resources(&resources).unwrap_err();
        assert_eq!(
            err,
            GraphError::UndeclaredResource {
                from: "subnet".to_string(),
                target: "vpc".to_string(),
                used_in: "vpc_id".to_string(),
            }
        );
    }

    #[test]
    fn stages_respect_every_edge() {
        let graph = DependencyGraph::from_resources(&network()).unwrap();
        let stages = graph.stages().unwrap();
        assert_eq!(
            stages,
            vec![
                vec!["vpc".to_string(), "igw".to_string()],
                vec!["attach".to_string(), "rt".to_string()],
                vec!["route".to_string()],
            ]
        );
        assert_eq!(
            graph.topological_order().unwrap(),
            vec!["vpc", "igw", "attach", "rt", "route"]
        );
    }

    #[test]
    fn cycle_detection() {
        let resources = vec![
            Resource::new("test", "a").with_depends_on("b"),
            Resource::new("test", "b").with_attribute("x", Value::resource_ref("a")),
        ];
        let graph = DependencyGraph::from_resources(&resources).unwrap();
        assert!(graph.has_cycle());
        assert_eq!(
            graph.find_cycle().unwrap(),
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
        assert!(matches!(graph.stages(), Err(GraphError::Cycle { .. })));
    }
}
