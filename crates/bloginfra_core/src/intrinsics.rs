//! CloudFormation intrinsic functions.
//!
//! Helpers that build the JSON forms of `Ref`, `Fn::GetAtt`, `Fn::Sub`,
//! `Fn::Join` and `Fn::ImportValue`, plus a walker that collects every
//! import name reachable from a property tree. The walker is what lets the
//! assembly validate cross-stack references before anything is written out.

use serde_json::{json, Value};

/// `{"Ref": logical_id}`
pub fn r#ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Sub": template}`
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// `{"Fn::Join": [separator, parts]}`
pub fn join(separator: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [separator, parts] })
}

/// `{"Fn::ImportValue": export_name}`
pub fn import_value(export_name: &str) -> Value {
    json!({ "Fn::ImportValue": export_name })
}

/// Collect every `Fn::ImportValue` export name reachable from `value`.
pub fn collect_imports(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(name)) = map.get("Fn::ImportValue") {
                    out.push(name.clone());
                    return;
                }
            }
            for v in map.values() {
                collect_imports(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_imports(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_shape() {
        assert_eq!(r#ref("PostsTable"), json!({ "Ref": "PostsTable" }));
    }

    #[test]
    fn test_get_att_shape() {
        assert_eq!(
            get_att("ListPostsFunction", "Arn"),
            json!({ "Fn::GetAtt": ["ListPostsFunction", "Arn"] })
        );
    }

    #[test]
    fn test_collect_imports_walks_nested_values() {
        let value = json!({
            "Environment": {
                "Variables": {
                    "POSTS_TABLE_NAME": { "Fn::ImportValue": "blog-data-prod:PostsTableName" }
                }
            },
            "Resource": [
                { "Fn::ImportValue": "blog-data-prod:PostsTableArn" },
                "arn:aws:ssm:*"
            ]
        });

        let mut imports = Vec::new();
        collect_imports(&value, &mut imports);
        assert_eq!(
            imports,
            vec!["blog-data-prod:PostsTableName", "blog-data-prod:PostsTableArn"]
        );
    }

    #[test]
    fn test_collect_imports_ignores_plain_strings() {
        let mut imports = Vec::new();
        collect_imports(&json!({"TableName": "Posts"}), &mut imports);
        assert!(imports.is_empty());
    }
}
