//! Certificate stack: hosted-zone lookup plus the API's TLS certificate.

use tracing::info;

use bloginfra_aws::{Certificate, CertificateHandle, CertificateProps};
use bloginfra_core::{Context, HostedZoneAttributes, Stack};

use crate::config::InfraConfig;
use crate::error::StackResult;

/// Handles the downstream API stack consumes.
#[derive(Debug)]
pub struct CertificateStackOutputs {
    pub certificate: CertificateHandle,
    pub zone: HostedZoneAttributes,
}

/// Build the certificate stack.
///
/// The hosted zone is a documented external precondition: if it was never
/// registered in the lookup context, synthesis aborts here.
pub fn certificate_stack(
    config: &InfraConfig,
    ctx: &Context,
) -> StackResult<(Stack, CertificateStackOutputs)> {
    let zone = ctx.lookup_hosted_zone(&config.domain_name)?.clone();
    let api_domain = config.api_domain_name();

    let mut stack = Stack::new(config.stack_name("blog-certificate"))
        .with_description("DNS-validated TLS certificate for the blog API custom domain");

    let certificate = Certificate::new(
        &mut stack,
        "ApiCertificate",
        CertificateProps {
            domain_name: api_domain.clone(),
            hosted_zone: zone.clone(),
        },
    )?;

    info!(domain = %api_domain, zone_id = %zone.zone_id, "built certificate stack");
    Ok((stack, CertificateStackOutputs { certificate, zone }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloginfra_core::SynthError;
    use crate::error::StackError;

    #[test]
    fn test_unprovisioned_zone_aborts() {
        let config = InfraConfig::default();
        let err = certificate_stack(&config, &Context::new()).unwrap_err();
        assert!(matches!(err, StackError::Synth(SynthError::ZoneNotFound(_))));
    }

    #[test]
    fn test_certificate_covers_api_subdomain() {
        let config = InfraConfig::default();
        let (stack, outputs) = certificate_stack(&config, &config.context()).unwrap();

        let template = stack.to_template_value();
        let props =
            &template["Resources"][outputs.certificate.logical_id()]["Properties"];
        assert_eq!(props["DomainName"], "blogapi.example.com");
        assert_eq!(props["ValidationMethod"], "DNS");
    }
}
