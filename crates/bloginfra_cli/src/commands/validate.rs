//! `bloginfra validate` - synthesize in-memory and verify structural
//! invariants of the assembly.

use anyhow::bail;
use clap::Args;
use serde_json::Value;

use bloginfra_stacks::stage::api_stage;
use bloginfra_stacks::InfraConfig;

use super::ConfigArgs;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Validation report over the synthesized assembly.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub checks: Vec<ValidationCheck>,
    pub passed: bool,
}

#[derive(Debug)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            passed: true,
        }
    }

    pub fn add_check(&mut self, name: &str, passed: bool, message: &str) {
        if !passed {
            self.passed = false;
        }
        self.checks.push(ValidationCheck {
            name: name.to_string(),
            passed,
            message: message.to_string(),
        });
    }
}

pub fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let report = validate(&config)?;

    for check in &report.checks {
        let marker = if check.passed { "ok " } else { "FAIL" };
        println!("[{marker}] {}: {}", check.name, check.message);
    }

    if !report.passed {
        bail!("synthesis validation failed");
    }
    println!("All checks passed.");
    Ok(())
}

pub fn validate(config: &InfraConfig) -> anyhow::Result<ValidationReport> {
    let mut report = ValidationReport::new();

    let stage = api_stage(config)?;
    let api_name = config.stack_name("blog-api");

    // Dependency set of the API stack.
    let deps = stage
        .dependencies_of(&api_name)
        .map(|d| d.len())
        .unwrap_or(0);
    report.add_check(
        "dependency-set",
        deps == 3,
        &format!("api stack declares {deps} dependencies (expected 3)"),
    );

    let assembly = stage.synth()?;

    // Table key schema.
    let data_template = assembly
        .template(&config.stack_name("blog-data"))
        .cloned()
        .unwrap_or(Value::Null);
    let key_count = data_template["Resources"]["PostsTable"]["Properties"]["KeySchema"]
        .as_array()
        .map(|k| k.len())
        .unwrap_or(0);
    report.add_check(
        "table-key-schema",
        key_count == 1,
        &format!("posts table has {key_count} key attribute(s) (expected 1)"),
    );

    // Scope/verb alignment and CORS shape.
    let api_template = assembly
        .template(&api_name)
        .cloned()
        .unwrap_or(Value::Null);
    let mut scope_ok = true;
    let mut cors_headers = 0;
    if let Some(resources) = api_template["Resources"].as_object() {
        for entry in resources.values() {
            if entry["Type"] != "AWS::ApiGateway::Method" {
                continue;
            }
            let props = &entry["Properties"];
            match props["HttpMethod"].as_str() {
                Some("GET") => {
                    scope_ok &= props["AuthorizationScopes"][0]
                        .as_str()
                        .is_some_and(|s| s.ends_with(".read"));
                }
                Some("OPTIONS") => {
                    cors_headers = props["Integration"]["IntegrationResponses"][0]
                        ["ResponseParameters"]
                        .as_object()
                        .map(|p| p.len())
                        .unwrap_or(0);
                }
                _ => {}
            }
        }
    }
    report.add_check(
        "scope-verb-alignment",
        scope_ok,
        "GET routes require the read scope",
    );
    report.add_check(
        "cors-preflight",
        cors_headers == 4,
        &format!("preflight returns {cors_headers} fixed header(s) (expected 4)"),
    );

    // Determinism: synthesize again and compare.
    let second = api_stage(config)?.synth()?;
    report.add_check(
        "determinism",
        assembly == second,
        "re-synthesis produces an identical assembly",
    );

    Ok(report)
}
