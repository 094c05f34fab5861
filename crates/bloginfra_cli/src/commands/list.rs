//! `bloginfra list` - print stacks in deploy order.

use clap::Args;

use bloginfra_stacks::stage::api_stage;

use super::ConfigArgs;

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn execute(args: ListArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let stage = api_stage(&config)?;

    for name in stage.deploy_order()? {
        let deps = stage
            .dependencies_of(&name)
            .map(|d| d.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        if deps.is_empty() {
            println!("{name}");
        } else {
            println!("{name}  (after: {})", deps.join(", "));
        }
    }
    Ok(())
}
