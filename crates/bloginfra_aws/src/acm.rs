//! ACM certificate construct with DNS validation.

use serde_json::{json, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{HostedZoneAttributes, Resource, Stack, SynthResult};

/// Certificate configuration. Validation is always DNS-backed against an
/// existing hosted zone; manual/email validation is not modeled.
#[derive(Debug, Clone)]
pub struct CertificateProps {
    pub domain_name: String,
    pub hosted_zone: HostedZoneAttributes,
}

/// Handle to a declared certificate.
#[derive(Debug, Clone)]
pub struct CertificateHandle {
    logical_id: String,
    arn_import: Value,
}

impl CertificateHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Import expression for the certificate ARN.
    pub fn certificate_arn_import(&self) -> Value {
        self.arn_import.clone()
    }
}

/// DNS-validated certificate construct.
pub struct Certificate;

impl Certificate {
    /// Declare a certificate and export its ARN. The ACM `Ref` returns the
    /// certificate ARN.
    pub fn new(stack: &mut Stack, id: &str, props: CertificateProps) -> SynthResult<CertificateHandle> {
        let resource = Resource::new("AWS::CertificateManager::Certificate")
            .prop("DomainName", json!(props.domain_name))
            .prop("ValidationMethod", json!("DNS"))
            .prop(
                "DomainValidationOptions",
                json!([{
                    "DomainName": props.domain_name,
                    "HostedZoneId": props.hosted_zone.zone_id,
                }]),
            );

        let logical_id = stack.add_resource(id, resource)?;
        debug!(domain = %props.domain_name, %logical_id, "declared certificate");

        let arn_import = stack.export(&format!("{logical_id}Arn"), intrinsics::r#ref(&logical_id));
        Ok(CertificateHandle {
            logical_id,
            arn_import,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_is_dns_validated() {
        let mut stack = Stack::new("blog-certificate-prod");
        let cert = Certificate::new(
            &mut stack,
            "ApiCertificate",
            CertificateProps {
                domain_name: "blogapi.example.com".to_string(),
                hosted_zone: HostedZoneAttributes {
                    zone_id: "Z123456ABCDEF".to_string(),
                    zone_name: "example.com".to_string(),
                },
            },
        )
        .unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][cert.logical_id()]["Properties"];
        assert_eq!(props["ValidationMethod"], "DNS");
        assert_eq!(
            props["DomainValidationOptions"][0]["HostedZoneId"],
            "Z123456ABCDEF"
        );
        assert_eq!(
            cert.certificate_arn_import(),
            json!({ "Fn::ImportValue": "blog-certificate-prod:ApiCertificateArn" })
        );
    }
}
