//! Pipeline stack: continuous delivery for the API stage.

use tracing::info;

use bloginfra_aws::{GitHubSource, Pipeline, PipelineProps, ShellStep, StackDeployment};
use bloginfra_core::Stack;

use crate::config::InfraConfig;
use crate::error::StackResult;
use crate::stage::api_stage;

/// Build the pipeline stack: GitHub source, a four-step synth build, and
/// one deployment stage whose CloudFormation actions follow the stage DAG
/// (independent leaves share run order 1, the API stack runs after them).
pub fn pipeline_stack(config: &InfraConfig) -> StackResult<Stack> {
    let stage = api_stage(config)?;
    let deploy_order = stage.deploy_order()?;

    let mut deployments = Vec::with_capacity(deploy_order.len());
    for stack_name in &deploy_order {
        let deps = stage
            .dependencies_of(stack_name)
            .map(|d| d.clone())
            .unwrap_or_default();
        let run_order = deployments
            .iter()
            .filter(|d: &&StackDeployment| deps.contains(&d.stack_name))
            .map(|d| d.run_order)
            .max()
            .unwrap_or(0)
            + 1;
        deployments.push(StackDeployment {
            stack_name: stack_name.clone(),
            template_file: format!("{stack_name}.template.json"),
            run_order,
        });
    }

    let mut stack = Stack::new("pipeline-blog-backend")
        .with_description("Continuous delivery pipeline for the blog API stage");
    stack.add_tag("Project", "Blog");

    Pipeline::new(
        &mut stack,
        "BlogPipeline",
        PipelineProps {
            pipeline_name: "pipeline-blog-backend".to_string(),
            source: GitHubSource::new(&config.source_repo, &config.source_branch),
            synth: ShellStep {
                install_commands: vec!["rustup default stable".to_string()],
                commands: vec![
                    "cargo fetch --locked".to_string(),
                    "cargo build --release --locked".to_string(),
                    "target/release/bloginfra synth --out-dir assembly.out".to_string(),
                ],
                primary_output_directory: "assembly.out".to_string(),
            },
            deploy_stage_name: config.stage_name.clone(),
            deployments,
        },
    )?;

    info!(repo = %config.source_repo, branch = %config.source_branch, "built pipeline stack");
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn deploy_actions(stack: &Stack) -> Vec<Value> {
        let template = stack.to_template_value();
        template["Resources"]["BlogPipeline"]["Properties"]["Stages"][2]["Actions"]
            .as_array()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_leaves_deploy_in_parallel_before_api() {
        let config = InfraConfig::default();
        let stack = pipeline_stack(&config).unwrap();

        let actions = deploy_actions(&stack);
        assert_eq!(actions.len(), 4);
        for action in &actions {
            let name = action["Configuration"]["StackName"].as_str().unwrap();
            let run_order = action["RunOrder"].as_u64().unwrap();
            if name == "blog-api-prod" {
                assert_eq!(run_order, 2);
            } else {
                assert_eq!(run_order, 1);
            }
        }
    }

    #[test]
    fn test_deploy_stage_is_named_after_the_stage() {
        let config = InfraConfig::default();
        let stack = pipeline_stack(&config).unwrap();

        let template = stack.to_template_value();
        assert_eq!(
            template["Resources"]["BlogPipeline"]["Properties"]["Stages"][2]["Name"],
            "prod"
        );
    }
}
