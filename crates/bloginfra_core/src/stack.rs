//! Stacks: named, independently deployable units of declared resources.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SynthError, SynthResult};
use crate::intrinsics;
use crate::resource::Resource;

/// A template output, optionally exported for cross-stack consumption.
#[derive(Debug, Clone)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
            export_name: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_export(mut self, export_name: impl Into<String>) -> Self {
        self.export_name = Some(export_name.into());
        self
    }
}

/// A named collection of resources, outputs and tags that renders to one
/// CloudFormation template.
///
/// Resources live in a `BTreeMap` keyed by logical ID, so template rendering
/// is independent of insertion order.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    description: Option<String>,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
    tags: BTreeMap<String, String>,
    assets: Vec<String>,
}

impl Stack {
    /// Create an empty stack with the given deployed name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
            tags: BTreeMap::new(),
            assets: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a tag applied to the whole stack.
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Add a resource under a construct ID. The ID is sanitized to the
    /// CloudFormation logical-ID alphabet; the sanitized form is returned and
    /// is what `Ref`/`Fn::GetAtt` must use.
    pub fn add_resource(&mut self, id: &str, resource: Resource) -> SynthResult<String> {
        let logical_id = sanitize_logical_id(id);
        if self.resources.contains_key(&logical_id) {
            return Err(SynthError::DuplicateLogicalId {
                stack: self.name.clone(),
                logical_id,
            });
        }
        debug!(stack = %self.name, %logical_id, resource_type = resource.resource_type(), "declared resource");
        self.resources.insert(logical_id.clone(), resource);
        Ok(logical_id)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// Add a plain (non-exported) output.
    pub fn add_output(&mut self, name: &str, output: Output) {
        self.outputs.insert(name.to_string(), output);
    }

    /// Export a value under `<stack name>:<name>` and return the expression
    /// consuming stacks use to import it.
    pub fn export(&mut self, name: &str, value: Value) -> Value {
        let export_name = format!("{}:{}", self.name, name);
        self.outputs.insert(
            name.to_string(),
            Output::new(value).with_export(export_name.clone()),
        );
        intrinsics::import_value(&export_name)
    }

    /// Record an asset directory this stack's resources reference.
    pub fn add_asset(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.assets.contains(&path) {
            self.assets.push(path);
        }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Export names declared by this stack.
    pub fn exports(&self) -> Vec<String> {
        self.outputs
            .values()
            .filter_map(|o| o.export_name.clone())
            .collect()
    }

    /// Export names this stack consumes via `Fn::ImportValue`.
    pub fn imports(&self) -> Vec<String> {
        let mut imports = Vec::new();
        intrinsics::collect_imports(&self.to_template_value(), &mut imports);
        imports.sort();
        imports.dedup();
        imports
    }

    /// Render the stack as a CloudFormation template value.
    pub fn to_template_value(&self) -> Value {
        let mut template = Map::new();
        template.insert(
            "AWSTemplateFormatVersion".to_string(),
            Value::String("2010-09-09".to_string()),
        );
        if let Some(description) = &self.description {
            template.insert("Description".to_string(), Value::String(description.clone()));
        }

        let mut resources = Map::new();
        for (logical_id, resource) in &self.resources {
            let mut entry = resource.to_value();
            if !self.tags.is_empty() && supports_tags(resource.resource_type()) {
                let tags: Vec<Value> = self
                    .tags
                    .iter()
                    .map(|(k, v)| serde_json::json!({ "Key": k, "Value": v }))
                    .collect();
                entry["Properties"]
                    .as_object_mut()
                    .expect("resource properties are always an object")
                    .entry("Tags".to_string())
                    .or_insert(Value::Array(tags));
            }
            resources.insert(logical_id.clone(), entry);
        }
        template.insert("Resources".to_string(), Value::Object(resources));

        if !self.outputs.is_empty() {
            let mut outputs = Map::new();
            for (name, output) in &self.outputs {
                let mut entry = Map::new();
                if let Some(description) = &output.description {
                    entry.insert("Description".to_string(), Value::String(description.clone()));
                }
                entry.insert("Value".to_string(), output.value.clone());
                if let Some(export_name) = &output.export_name {
                    entry.insert(
                        "Export".to_string(),
                        serde_json::json!({ "Name": export_name }),
                    );
                }
                outputs.insert(name.clone(), Value::Object(entry));
            }
            template.insert("Outputs".to_string(), Value::Object(outputs));
        }

        Value::Object(template)
    }
}

/// Reduce a construct ID to the `[A-Za-z0-9]` logical-ID alphabet.
pub fn sanitize_logical_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Resource types where stack-level tags are propagated as a `Tags` list.
fn supports_tags(resource_type: &str) -> bool {
    matches!(
        resource_type,
        "AWS::DynamoDB::Table"
            | "AWS::Lambda::Function"
            | "AWS::ApiGateway::RestApi"
            | "AWS::CertificateManager::Certificate"
            | "AWS::CodeBuild::Project"
            | "AWS::IAM::Role"
    )
}
