//! Data stack: the single `Posts` table.

use tracing::info;

use bloginfra_aws::{Attribute, AttributeType, Table, TableHandle, TableProps};
use bloginfra_core::{RemovalPolicy, Stack};

use crate::config::InfraConfig;
use crate::error::StackResult;

/// Handle the API stack uses for environment wiring and grants.
pub struct DataStackOutputs {
    pub posts_table: TableHandle,
}

/// Build the data stack: one table keyed by a string partition key `id`,
/// no sort key, no secondary indexes, on-demand capacity,
/// destroyed with the stage. The table name is stage-qualified so stages
/// sharing an account/region cannot collide.
pub fn data_stack(config: &InfraConfig) -> StackResult<(Stack, DataStackOutputs)> {
    let mut stack = Stack::new(config.stack_name("blog-data"))
        .with_description("Posts table for the blog API");

    let posts_table = Table::new(
        &mut stack,
        "PostsTable",
        TableProps {
            table_name: format!("Posts-{}", config.stage_name),
            partition_key: Attribute::new("id", AttributeType::String),
            removal_policy: RemovalPolicy::Destroy,
        },
    )?;

    info!(table = %posts_table.table_name(), "built data stack");
    Ok((stack, DataStackOutputs { posts_table }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_string_key_no_indexes() {
        let config = InfraConfig::default();
        let (stack, outputs) = data_stack(&config).unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][outputs.posts_table.logical_id()]["Properties"];
        assert_eq!(
            props["KeySchema"],
            json!([{ "AttributeName": "id", "KeyType": "HASH" }])
        );
        assert_eq!(props["AttributeDefinitions"].as_array().unwrap().len(), 1);
        assert!(props.get("GlobalSecondaryIndexes").is_none());
    }

    #[test]
    fn test_table_name_is_stage_qualified() {
        let config = InfraConfig::default().with_stage("dev");
        let (_, outputs) = data_stack(&config).unwrap();
        assert_eq!(outputs.posts_table.table_name(), "Posts-dev");
    }
}
