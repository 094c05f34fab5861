//! Configuration for the infrastructure stacks.
//!
//! The original topology hard-coded its domain, repository and region as
//! constants. Here they live in one serde struct with YAML load/save, so the
//! same stack builders serve any environment. Stage-scoped resource names
//! (table, user pool, client, OAuth domain prefix) all derive from
//! `stage_name`, which keeps parallel stages in one account from colliding.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use bloginfra_core::{Context, Environment};

use crate::error::{StackError, StackResult};

/// A hosted zone provisioned out-of-band, registered for synthesis-time
/// lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedZoneEntry {
    pub domain_name: String,
    pub zone_id: String,
}

/// Everything the stack builders need to know about an environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Root domain; its hosted zone must exist before synthesis.
    pub domain_name: String,
    /// Subdomain the API is served from (`<api_subdomain>.<domain_name>`).
    pub api_subdomain: String,
    /// Deployment stage, e.g. `prod`.
    pub stage_name: String,
    /// Target AWS account.
    pub account: String,
    /// Target AWS region.
    pub region: String,
    /// Source repository (`owner/repo`) the pipeline is triggered from.
    pub source_repo: String,
    /// Source branch.
    pub source_branch: String,
    /// Hosted zones available for lookup.
    pub hosted_zones: Vec<HostedZoneEntry>,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            domain_name: "example.com".to_string(),
            api_subdomain: "blogapi".to_string(),
            stage_name: "prod".to_string(),
            account: "111111111111".to_string(),
            region: "us-east-1".to_string(),
            source_repo: "example/blog-backend".to_string(),
            source_branch: "master".to_string(),
            hosted_zones: vec![HostedZoneEntry {
                domain_name: "example.com".to_string(),
                zone_id: "Z0000000EXAMPLE".to_string(),
            }],
        }
    }
}

impl InfraConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> StackResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: InfraConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_file(&self, path: &Path) -> StackResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_stage(mut self, stage_name: impl Into<String>) -> Self {
        self.stage_name = stage_name.into();
        self
    }

    pub fn with_domain(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = domain_name.into();
        self
    }

    pub fn validate(&self) -> StackResult<()> {
        if self.domain_name.is_empty() {
            return Err(StackError::InvalidConfig("domain_name is empty".to_string()));
        }
        if self.stage_name.is_empty() {
            return Err(StackError::InvalidConfig("stage_name is empty".to_string()));
        }
        if !self.source_repo.contains('/') {
            return Err(StackError::InvalidConfig(format!(
                "source_repo `{}` is not of the form owner/repo",
                self.source_repo
            )));
        }
        Ok(())
    }

    /// The API's fully qualified custom domain.
    pub fn api_domain_name(&self) -> String {
        format!("{}.{}", self.api_subdomain, self.domain_name)
    }

    /// Stage-qualified deployed stack name.
    pub fn stack_name(&self, base: &str) -> String {
        format!("{}-{}", base, self.stage_name)
    }

    pub fn environment(&self) -> Environment {
        Environment::new(self.account.clone(), self.region.clone())
    }

    /// Lookup context seeded with the configured hosted zones.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        for zone in &self.hosted_zones {
            ctx = ctx.with_hosted_zone(zone.domain_name.clone(), zone.zone_id.clone());
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_api_domain_name() {
        let config = InfraConfig::default();
        assert_eq!(config.api_domain_name(), "blogapi.example.com");
    }

    #[test]
    fn test_stack_name_is_stage_qualified() {
        let config = InfraConfig::default().with_stage("dev");
        assert_eq!(config.stack_name("blog-data"), "blog-data-dev");
    }

    #[test]
    fn test_roundtrip_through_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("infra.yaml");

        let config = InfraConfig::default().with_domain("blog.example.org");
        config.to_file(&path).unwrap();

        let loaded = InfraConfig::from_file(&path).unwrap();
        assert_eq!(loaded.domain_name, "blog.example.org");
        assert_eq!(loaded.stage_name, "prod");
    }

    #[test]
    fn test_invalid_repo_is_rejected() {
        let mut config = InfraConfig::default();
        config.source_repo = "no-owner".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            StackError::InvalidConfig(_)
        ));
    }
}
