//! Cloud assembly: the synthesized output of a stage.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::SynthResult;
use crate::stage::Environment;

/// Manifest written next to the templates, recording what was synthesized
/// and in which order it deploys.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyManifest {
    pub stage: String,
    pub environment: Environment,
    pub deploy_order: Vec<String>,
    pub templates: BTreeMap<String, String>,
    pub assets: Vec<String>,
}

/// The synthesized templates for one stage, plus deploy metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
    stage: String,
    env: Environment,
    templates: BTreeMap<String, Value>,
    deploy_order: Vec<String>,
    assets: Vec<String>,
}

impl CloudAssembly {
    pub(crate) fn new(
        stage: String,
        env: Environment,
        templates: BTreeMap<String, Value>,
        deploy_order: Vec<String>,
        assets: Vec<String>,
    ) -> Self {
        Self {
            stage,
            env,
            templates,
            deploy_order,
            assets,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Stack names in deploy order.
    pub fn deploy_order(&self) -> &[String] {
        &self.deploy_order
    }

    /// The synthesized template for a stack.
    pub fn template(&self, stack_name: &str) -> Option<&Value> {
        self.templates.get(stack_name)
    }

    pub fn templates(&self) -> &BTreeMap<String, Value> {
        &self.templates
    }

    /// Asset directories referenced by the templates, to be packaged by the
    /// deployment pipeline.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    fn manifest(&self) -> AssemblyManifest {
        AssemblyManifest {
            stage: self.stage.clone(),
            environment: self.env.clone(),
            deploy_order: self.deploy_order.clone(),
            templates: self
                .templates
                .keys()
                .map(|name| (name.clone(), template_file_name(name)))
                .collect(),
            assets: self.assets.clone(),
        }
    }

    /// Write `<stack>.template.json` per stack plus `manifest.json` into
    /// `out_dir`, creating it if needed.
    pub fn write_to(&self, out_dir: &Path) -> SynthResult<()> {
        fs::create_dir_all(out_dir)?;

        for (name, template) in &self.templates {
            let path = out_dir.join(template_file_name(name));
            fs::write(&path, format!("{}\n", serde_json::to_string_pretty(template)?))?;
        }

        let manifest_path = out_dir.join("manifest.json");
        fs::write(
            &manifest_path,
            format!("{}\n", serde_json::to_string_pretty(&self.manifest())?),
        )?;

        info!(
            stage = %self.stage,
            out_dir = %out_dir.display(),
            stacks = self.templates.len(),
            "wrote cloud assembly"
        );
        Ok(())
    }
}

fn template_file_name(stack_name: &str) -> String {
    format!("{stack_name}.template.json")
}
