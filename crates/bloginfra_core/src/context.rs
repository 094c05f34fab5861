//! Lookup context for resources provisioned out-of-band.
//!
//! Hosted zones are not declared by any stack in this repository; they are a
//! documented external precondition. Synthesis resolves them from this
//! context, and a missing entry is fatal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// Attributes of an existing Route53 hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneAttributes {
    pub zone_id: String,
    pub zone_name: String,
}

/// Synthesis-time lookup context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    hosted_zones: BTreeMap<String, HostedZoneAttributes>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hosted zone under its domain name.
    pub fn with_hosted_zone(
        mut self,
        domain_name: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        let zone_name = domain_name.into();
        self.hosted_zones.insert(
            zone_name.clone(),
            HostedZoneAttributes {
                zone_id: zone_id.into(),
                zone_name,
            },
        );
        self
    }

    /// Resolve the hosted zone for a domain, failing if it was never
    /// registered.
    pub fn lookup_hosted_zone(&self, domain_name: &str) -> SynthResult<&HostedZoneAttributes> {
        self.hosted_zones
            .get(domain_name)
            .ok_or_else(|| SynthError::ZoneNotFound(domain_name.to_string()))
    }
}
