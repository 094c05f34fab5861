//! The raw resource model.

use serde_json::{Map, Value};

/// What happens to a resource when its stack is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Delete the resource with the stack. No durability survives teardown.
    Destroy,
    /// Orphan the resource so it outlives the stack.
    Retain,
}

impl RemovalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

/// A single declared resource: a CloudFormation type plus its properties.
///
/// Properties are held in a `serde_json::Map`, which keeps keys sorted, so
/// rendering a resource twice always produces identical JSON.
#[derive(Debug, Clone)]
pub struct Resource {
    resource_type: String,
    properties: Map<String, Value>,
    depends_on: Vec<String>,
    removal_policy: Option<RemovalPolicy>,
}

impl Resource {
    /// Create a resource of the given CloudFormation type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
            removal_policy: None,
        }
    }

    /// Set a property. Later calls with the same key overwrite.
    pub fn prop(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Set a property only when a value is present.
    pub fn prop_opt(self, key: &str, value: Option<Value>) -> Self {
        match value {
            Some(v) => self.prop(key, v),
            None => self,
        }
    }

    /// Add an explicit same-stack ordering edge.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// Set the removal policy.
    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Render into the `Resources` entry shape.
    pub fn to_value(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("Type".to_string(), Value::String(self.resource_type.clone()));
        if !self.depends_on.is_empty() {
            let mut deps = self.depends_on.clone();
            deps.sort();
            deps.dedup();
            entry.insert(
                "DependsOn".to_string(),
                Value::Array(deps.into_iter().map(Value::String).collect()),
            );
        }
        entry.insert(
            "Properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        if let Some(policy) = self.removal_policy {
            entry.insert(
                "DeletionPolicy".to_string(),
                Value::String(policy.as_str().to_string()),
            );
        }
        Value::Object(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_rendering() {
        let resource = Resource::new("AWS::DynamoDB::Table")
            .prop("TableName", json!("Posts-prod"))
            .removal_policy(RemovalPolicy::Destroy);

        let value = resource.to_value();
        assert_eq!(value["Type"], "AWS::DynamoDB::Table");
        assert_eq!(value["Properties"]["TableName"], "Posts-prod");
        assert_eq!(value["DeletionPolicy"], "Delete");
    }

    #[test]
    fn test_depends_on_is_sorted_and_deduped() {
        let resource = Resource::new("AWS::Lambda::Function")
            .depends_on("RoleB")
            .depends_on("RoleA")
            .depends_on("RoleB");

        assert_eq!(resource.to_value()["DependsOn"], json!(["RoleA", "RoleB"]));
    }

    #[test]
    fn test_prop_opt_skips_none() {
        let resource = Resource::new("AWS::Cognito::UserPool").prop_opt("UserPoolName", None);
        assert!(resource.properties().is_empty());
    }
}
