//! Stage composition: the four stacks and their dependency edges.

use tracing::info;

use bloginfra_core::Stage;

use crate::api::api_stack;
use crate::auth::auth_stack;
use crate::certificate::certificate_stack;
use crate::config::InfraConfig;
use crate::data::data_stack;
use crate::error::StackResult;

/// Build the API stage: certificate, data and auth stacks first (mutually
/// independent leaves), then the API stack with explicit ordering edges on
/// all three. The edges are what the deployment orchestrator honors;
/// declaration order alone implies nothing.
pub fn api_stage(config: &InfraConfig) -> StackResult<Stage> {
    config.validate()?;
    let ctx = config.context();

    let (mut certificate, certificate_outputs) = certificate_stack(config, &ctx)?;
    let (mut data, data_outputs) = data_stack(config)?;
    let (mut auth, auth_outputs) = auth_stack(config)?;
    let mut api = api_stack(config, &data_outputs, &auth_outputs, &certificate_outputs)?;

    for stack in [&mut certificate, &mut data, &mut auth, &mut api] {
        stack.add_tag("Project", "Blog");
        stack.add_tag("Stage", config.stage_name.clone());
    }

    let mut stage = Stage::new(config.stage_name.clone(), config.environment());
    let certificate_name = certificate.name().to_string();
    let data_name = data.name().to_string();
    let auth_name = auth.name().to_string();
    let api_name = api.name().to_string();

    stage.add_stack(certificate)?;
    stage.add_stack(data)?;
    stage.add_stack(auth)?;
    stage.add_stack(api)?;

    stage.add_dependency(&api_name, &certificate_name)?;
    stage.add_dependency(&api_name, &auth_name)?;
    stage.add_dependency(&api_name, &data_name)?;

    info!(stage = %config.stage_name, "composed api stage");
    Ok(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_api_depends_on_exactly_three_leaves() {
        let config = InfraConfig::default();
        let stage = api_stage(&config).unwrap();

        let deps = stage.dependencies_of("blog-api-prod").unwrap();
        let expected: BTreeSet<String> = [
            "blog-certificate-prod".to_string(),
            "blog-auth-prod".to_string(),
            "blog-data-prod".to_string(),
        ]
        .into();
        assert_eq!(deps, &expected);
    }

    #[test]
    fn test_leaves_have_no_dependencies() {
        let config = InfraConfig::default();
        let stage = api_stage(&config).unwrap();

        for leaf in ["blog-certificate-prod", "blog-data-prod", "blog-auth-prod"] {
            assert!(stage.dependencies_of(leaf).unwrap().is_empty());
        }
    }

    #[test]
    fn test_api_deploys_last() {
        let config = InfraConfig::default();
        let stage = api_stage(&config).unwrap();
        let order = stage.deploy_order().unwrap();
        assert_eq!(order.last().map(String::as_str), Some("blog-api-prod"));
    }
}
