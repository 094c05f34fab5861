//! CLI command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bloginfra_stacks::InfraConfig;

pub mod list;
pub mod synth;
pub mod validate;

/// bloginfra - declare and synthesize the blog API infrastructure
#[derive(Parser)]
#[command(name = "bloginfra")]
#[command(version, about = "Synthesize the blog API backend infrastructure")]
#[command(long_about = r#"
bloginfra declares the blog API backend (REST API, functions, user pool,
posts table, DNS/TLS, delivery pipeline) and synthesizes it into a cloud
assembly of CloudFormation templates.

COMMANDS:
  synth     → Synthesize the stage (and pipeline) into an assembly directory
  validate  → Synthesize in-memory and verify structural invariants
  list      → Print the stacks in deploy order with their dependencies

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Synthesis/validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize the stage into a cloud assembly
    Synth(synth::SynthArgs),

    /// Synthesize in-memory and check structural invariants
    Validate(validate::ValidateArgs),

    /// Print stacks in deploy order
    List(list::ListArgs),
}

/// Options shared by every command that builds the stage.
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Path to the infrastructure config (YAML); defaults are used when
    /// omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the stage name from the config
    #[arg(long)]
    pub stage: Option<String>,
}

impl ConfigArgs {
    pub fn load(&self) -> anyhow::Result<InfraConfig> {
        let mut config = match &self.config {
            Some(path) => InfraConfig::from_file(path)?,
            None => InfraConfig::default(),
        };
        if let Some(stage) = &self.stage {
            config = config.with_stage(stage.clone());
        }
        Ok(config)
    }
}
