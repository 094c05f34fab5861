//! Continuous-delivery pipeline: source, synth build, one deploy stage.
//!
//! A degenerate pipeline by design: pull source, run a fixed shell sequence
//! that synthesizes the assembly, then deploy each stack template with
//! CloudFormation actions ordered by the stage DAG. No rollback or canary
//! logic; deployment failure behavior is whatever CodePipeline provides.

use serde_json::{json, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{RemovalPolicy, Resource, Stack, SynthResult};

use crate::iam::{PolicyStatement, ServiceRole};

/// A GitHub repository/branch the pipeline is triggered from. The OAuth
/// token is resolved from Secrets Manager at deploy time, never stored in
/// the template.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl GitHubSource {
    /// Parse `owner/repo` plus a branch name.
    pub fn new(owner_repo: &str, branch: &str) -> Self {
        let (owner, repo) = owner_repo.split_once('/').unwrap_or(("", owner_repo));
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }
}

/// The fixed shell command sequence the synth build runs.
#[derive(Debug, Clone)]
pub struct ShellStep {
    pub install_commands: Vec<String>,
    pub commands: Vec<String>,
    pub primary_output_directory: String,
}

impl ShellStep {
    fn buildspec(&self) -> SynthResult<String> {
        let spec = json!({
            "version": "0.2",
            "phases": {
                "install": { "commands": self.install_commands },
                "build": { "commands": self.commands },
            },
            "artifacts": {
                "base-directory": self.primary_output_directory,
                "files": ["**/*"],
            },
        });
        Ok(serde_json::to_string_pretty(&spec)?)
    }
}

/// One CloudFormation deploy action. Actions sharing a run order execute in
/// parallel; higher run orders wait for lower ones.
#[derive(Debug, Clone)]
pub struct StackDeployment {
    pub stack_name: String,
    pub template_file: String,
    pub run_order: u32,
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineProps {
    pub pipeline_name: String,
    pub source: GitHubSource,
    pub synth: ShellStep,
    pub deploy_stage_name: String,
    pub deployments: Vec<StackDeployment>,
}

/// CodePipeline construct.
pub struct Pipeline;

impl Pipeline {
    pub fn new(stack: &mut Stack, id: &str, props: PipelineProps) -> SynthResult<String> {
        let bucket_id = stack.add_resource(
            &format!("{id}Artifacts"),
            Resource::new("AWS::S3::Bucket").removal_policy(RemovalPolicy::Destroy),
        )?;
        let bucket_arn = intrinsics::get_att(&bucket_id, "Arn");
        let bucket_objects_arn = intrinsics::join(
            "",
            vec![bucket_arn.clone(), json!("/*")],
        );

        let mut build_role = ServiceRole::new(
            stack,
            &format!("{id}BuildRole"),
            "codebuild.amazonaws.com",
            &[],
        )?;
        build_role.attach_policy(
            stack,
            "synth-build",
            &[
                PolicyStatement::allow(
                    &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"],
                    vec![json!("*")],
                ),
                PolicyStatement::allow(
                    &["s3:GetObject", "s3:GetObjectVersion", "s3:PutObject"],
                    vec![bucket_objects_arn.clone()],
                ),
            ],
        )?;

        let project_id = stack.add_resource(
            &format!("{id}SynthProject"),
            Resource::new("AWS::CodeBuild::Project")
                .prop("ServiceRole", build_role.arn())
                .prop("Artifacts", json!({ "Type": "CODEPIPELINE" }))
                .prop(
                    "Environment",
                    json!({
                        "ComputeType": "BUILD_GENERAL1_SMALL",
                        "Image": "aws/codebuild/standard:7.0",
                        "Type": "LINUX_CONTAINER",
                    }),
                )
                .prop(
                    "Source",
                    json!({
                        "Type": "CODEPIPELINE",
                        "BuildSpec": props.synth.buildspec()?,
                    }),
                ),
        )?;

        let deploy_role = ServiceRole::new(
            stack,
            &format!("{id}DeployRole"),
            "cloudformation.amazonaws.com",
            &["arn:aws:iam::aws:policy/AdministratorAccess"],
        )?;

        let mut pipeline_role = ServiceRole::new(
            stack,
            &format!("{id}Role"),
            "codepipeline.amazonaws.com",
            &[],
        )?;
        pipeline_role.attach_policy(
            stack,
            "pipeline",
            &[
                PolicyStatement::allow(
                    &["s3:GetObject", "s3:GetObjectVersion", "s3:PutObject", "s3:GetBucketVersioning"],
                    vec![bucket_arn, bucket_objects_arn],
                ),
                PolicyStatement::allow(
                    &["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                    vec![intrinsics::get_att(&project_id, "Arn")],
                ),
                PolicyStatement::allow(
                    &[
                        "cloudformation:CreateStack",
                        "cloudformation:UpdateStack",
                        "cloudformation:DescribeStacks",
                        "cloudformation:GetTemplate",
                    ],
                    vec![json!("*")],
                ),
                PolicyStatement::allow(&["iam:PassRole"], vec![deploy_role.arn()]),
            ],
        )?;

        let deploy_actions: Vec<Value> = props
            .deployments
            .iter()
            .map(|deployment| {
                json!({
                    "Name": format!("Deploy-{}", deployment.stack_name),
                    "RunOrder": deployment.run_order,
                    "ActionTypeId": {
                        "Category": "Deploy",
                        "Owner": "AWS",
                        "Provider": "CloudFormation",
                        "Version": "1",
                    },
                    "InputArtifacts": [{ "Name": "SynthOutput" }],
                    "Configuration": {
                        "ActionMode": "CREATE_UPDATE",
                        "StackName": deployment.stack_name,
                        "TemplatePath": format!("SynthOutput::{}", deployment.template_file),
                        "RoleArn": deploy_role.arn(),
                        "Capabilities": "CAPABILITY_IAM,CAPABILITY_NAMED_IAM",
                    },
                })
            })
            .collect();

        let stages = json!([
            {
                "Name": "Source",
                "Actions": [{
                    "Name": "GitHub",
                    "ActionTypeId": {
                        "Category": "Source",
                        "Owner": "ThirdParty",
                        "Provider": "GitHub",
                        "Version": "1",
                    },
                    "OutputArtifacts": [{ "Name": "SourceOutput" }],
                    "Configuration": {
                        "Owner": props.source.owner,
                        "Repo": props.source.repo,
                        "Branch": props.source.branch,
                        "OAuthToken": "{{resolve:secretsmanager:github-token}}",
                        "PollForSourceChanges": false,
                    },
                }],
            },
            {
                "Name": "Synth",
                "Actions": [{
                    "Name": "synth-step",
                    "ActionTypeId": {
                        "Category": "Build",
                        "Owner": "AWS",
                        "Provider": "CodeBuild",
                        "Version": "1",
                    },
                    "InputArtifacts": [{ "Name": "SourceOutput" }],
                    "OutputArtifacts": [{ "Name": "SynthOutput" }],
                    "Configuration": { "ProjectName": intrinsics::r#ref(&project_id) },
                }],
            },
            {
                "Name": props.deploy_stage_name,
                "Actions": deploy_actions,
            },
        ]);

        debug!(pipeline = %props.pipeline_name, "declared pipeline");
        stack.add_resource(
            id,
            Resource::new("AWS::CodePipeline::Pipeline")
                .prop("Name", json!(props.pipeline_name))
                .prop("RoleArn", pipeline_role.arn())
                .prop(
                    "ArtifactStore",
                    json!({ "Type": "S3", "Location": intrinsics::r#ref(&bucket_id) }),
                )
                .prop("Stages", stages),
        )
    }
}
