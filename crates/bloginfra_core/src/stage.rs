//! Stages: environment-scoped compositions of stacks with explicit
//! dependency edges.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assembly::CloudAssembly;
use crate::error::{SynthError, SynthResult};
use crate::stack::Stack;

/// Target account and region for a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

/// An ordered composition of stacks deployed as one unit.
///
/// Dependency edges are explicit: declaring stack B after stack A implies
/// nothing. Deploy order is a topological sort of the recorded edges, with
/// declaration order breaking ties so synthesis stays deterministic.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    env: Environment,
    stacks: Vec<Stack>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl Stage {
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            stacks: Vec::new(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Add a stack to the stage. Stack names must be unique.
    pub fn add_stack(&mut self, stack: Stack) -> SynthResult<()> {
        if self.stacks.iter().any(|s| s.name() == stack.name()) {
            return Err(SynthError::DuplicateStack(stack.name().to_string()));
        }
        self.dependencies.insert(stack.name().to_string(), BTreeSet::new());
        self.stacks.push(stack);
        Ok(())
    }

    /// Record that `dependent` must deploy after `dependency`.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> SynthResult<()> {
        if !self.dependencies.contains_key(dependency) {
            return Err(SynthError::UnknownStack(dependency.to_string()));
        }
        let edges = self
            .dependencies
            .get_mut(dependent)
            .ok_or_else(|| SynthError::UnknownStack(dependent.to_string()))?;
        edges.insert(dependency.to_string());
        Ok(())
    }

    /// Dependency set recorded for a stack.
    pub fn dependencies_of(&self, stack: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(stack)
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// Topologically sorted deploy order. Fails on cycles.
    pub fn deploy_order(&self) -> SynthResult<Vec<String>> {
        let mut order = Vec::with_capacity(self.stacks.len());
        let mut placed: BTreeSet<String> = BTreeSet::new();

        // Kahn's algorithm over declaration order, so independent stacks
        // keep the order they were declared in.
        let mut remaining: Vec<&Stack> = self.stacks.iter().collect();
        while !remaining.is_empty() {
            let ready_idx = remaining.iter().position(|s| {
                self.dependencies[s.name()]
                    .iter()
                    .all(|dep| placed.contains(dep))
            });
            match ready_idx {
                Some(idx) => {
                    let stack = remaining.remove(idx);
                    placed.insert(stack.name().to_string());
                    order.push(stack.name().to_string());
                }
                None => {
                    return Err(SynthError::DependencyCycle(
                        remaining[0].name().to_string(),
                    ));
                }
            }
        }
        Ok(order)
    }

    /// Synthesize the stage into a cloud assembly.
    ///
    /// Validates the dependency DAG and every cross-stack reference before
    /// returning; a missing export or a cycle aborts the whole synthesis.
    pub fn synth(&self) -> SynthResult<CloudAssembly> {
        let deploy_order = self.deploy_order()?;
        self.validate_references()?;

        let mut templates = BTreeMap::new();
        let mut assets: Vec<String> = Vec::new();
        for stack in &self.stacks {
            templates.insert(stack.name().to_string(), stack.to_template_value());
            for asset in stack.assets() {
                if !assets.contains(asset) {
                    assets.push(asset.clone());
                }
            }
        }

        info!(stage = %self.name, stacks = self.stacks.len(), "synthesized stage");
        Ok(CloudAssembly::new(
            self.name.clone(),
            self.env.clone(),
            templates,
            deploy_order,
            assets,
        ))
    }

    fn validate_references(&self) -> SynthResult<()> {
        let mut exports: BTreeSet<String> = BTreeSet::new();
        for stack in &self.stacks {
            for export in stack.exports() {
                if !exports.insert(export.clone()) {
                    return Err(SynthError::DuplicateExport(export));
                }
            }
        }
        for stack in &self.stacks {
            for import in stack.imports() {
                if !exports.contains(&import) {
                    return Err(SynthError::MissingExport {
                        stack: stack.name().to_string(),
                        export_name: import,
                    });
                }
            }
        }
        Ok(())
    }
}
