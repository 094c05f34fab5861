//! `bloginfra synth` - write the cloud assembly to disk.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use bloginfra_stacks::pipeline::pipeline_stack;
use bloginfra_stacks::stage::api_stage;

use super::ConfigArgs;

#[derive(Debug, Args)]
pub struct SynthArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output directory for templates and manifest
    #[arg(short, long, default_value = "assembly.out")]
    pub out_dir: PathBuf,

    /// Also synthesize the delivery pipeline stack
    #[arg(long)]
    pub with_pipeline: bool,
}

pub fn execute(args: SynthArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;

    let stage = api_stage(&config).context("failed to build the api stage")?;
    let assembly = stage.synth().context("synthesis failed")?;
    assembly
        .write_to(&args.out_dir)
        .with_context(|| format!("failed to write assembly to {}", args.out_dir.display()))?;

    if args.with_pipeline {
        let pipeline = pipeline_stack(&config).context("failed to build the pipeline stack")?;
        let path = args.out_dir.join(format!("{}.template.json", pipeline.name()));
        std::fs::write(
            &path,
            format!(
                "{}\n",
                serde_json::to_string_pretty(&pipeline.to_template_value())?
            ),
        )?;
        info!(template = %path.display(), "wrote pipeline template");
    }

    println!(
        "Synthesized {} stack(s) for stage `{}` into {}",
        assembly.deploy_order().len(),
        assembly.stage(),
        args.out_dir.display()
    );
    Ok(())
}
