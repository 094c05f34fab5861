//! DynamoDB table construct.

use serde_json::{json, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{RemovalPolicy, Resource, Stack, SynthResult};

use crate::lambda::FunctionHandle;

/// Key attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }
}

/// A named key attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }
}

/// Table configuration. Billing is always on-demand; this repository never
/// tunes provisioned throughput.
#[derive(Debug, Clone)]
pub struct TableProps {
    pub table_name: String,
    pub partition_key: Attribute,
    pub removal_policy: RemovalPolicy,
}

/// Read-only handle to a declared table.
///
/// Carries the import expressions downstream stacks use for environment
/// variables and grants. Grants attach policies to the *consumer's* role in
/// the consumer's stack; the table itself is never touched.
#[derive(Debug, Clone)]
pub struct TableHandle {
    logical_id: String,
    table_name: String,
    name_import: Value,
    arn_import: Value,
}

const READ_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:ConditionCheckItem",
    "dynamodb:DescribeTable",
    "dynamodb:GetItem",
    "dynamodb:Query",
    "dynamodb:Scan",
];

const WRITE_ACTIONS: &[&str] = &[
    "dynamodb:BatchWriteItem",
    "dynamodb:DeleteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
];

/// DynamoDB table construct.
pub struct Table;

impl Table {
    /// Declare a table and export its name and ARN for cross-stack use.
    pub fn new(stack: &mut Stack, id: &str, props: TableProps) -> SynthResult<TableHandle> {
        let resource = Resource::new("AWS::DynamoDB::Table")
            .prop("TableName", json!(props.table_name))
            .prop(
                "AttributeDefinitions",
                json!([{
                    "AttributeName": props.partition_key.name,
                    "AttributeType": props.partition_key.attribute_type.as_str(),
                }]),
            )
            .prop(
                "KeySchema",
                json!([{
                    "AttributeName": props.partition_key.name,
                    "KeyType": "HASH",
                }]),
            )
            .prop("BillingMode", json!("PAY_PER_REQUEST"))
            .removal_policy(props.removal_policy);

        let logical_id = stack.add_resource(id, resource)?;
        debug!(table = %props.table_name, %logical_id, "declared table");

        let name_import = stack.export(
            &format!("{logical_id}Name"),
            intrinsics::r#ref(&logical_id),
        );
        let arn_import = stack.export(
            &format!("{logical_id}Arn"),
            intrinsics::get_att(&logical_id, "Arn"),
        );

        Ok(TableHandle {
            logical_id,
            table_name: props.table_name,
            name_import,
            arn_import,
        })
    }
}

impl TableHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Import expression for the table name (`Fn::ImportValue`).
    pub fn table_name_import(&self) -> Value {
        self.name_import.clone()
    }

    /// Import expression for the table ARN.
    pub fn table_arn_import(&self) -> Value {
        self.arn_import.clone()
    }

    /// Grant read-only access to a function.
    pub fn grant_read_data(
        &self,
        stack: &mut Stack,
        function: &mut FunctionHandle,
    ) -> SynthResult<()> {
        function.add_to_role_policy(
            stack,
            "table-read",
            READ_ACTIONS,
            vec![self.table_arn_import()],
        )?;
        Ok(())
    }

    /// Grant read-write access to a function.
    pub fn grant_read_write_data(
        &self,
        stack: &mut Stack,
        function: &mut FunctionHandle,
    ) -> SynthResult<()> {
        let actions: Vec<&str> = READ_ACTIONS
            .iter()
            .chain(WRITE_ACTIONS.iter())
            .copied()
            .collect();
        function.add_to_role_policy(
            stack,
            "table-read-write",
            &actions,
            vec![self.table_arn_import()],
        )?;
        Ok(())
    }
}
