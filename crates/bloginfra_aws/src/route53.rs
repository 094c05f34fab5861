//! Route53 alias records.
//!
//! Hosted zones themselves are resolved from the lookup context in
//! `bloginfra_core::context`; this module only declares records into them.

use serde_json::{json, Value};

use bloginfra_core::{HostedZoneAttributes, Resource, Stack, SynthResult};

/// Target of an alias record: the DNS name of a managed endpoint plus the
/// provider-fixed hosted zone that endpoint lives in.
#[derive(Debug, Clone)]
pub struct AliasTarget {
    pub dns_name: Value,
    pub hosted_zone_id: Value,
}

/// Alias A record construct.
pub struct ARecord;

impl ARecord {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        zone: &HostedZoneAttributes,
        record_name: &str,
        target: AliasTarget,
    ) -> SynthResult<String> {
        let resource = Resource::new("AWS::Route53::RecordSet")
            .prop("HostedZoneId", json!(zone.zone_id))
            .prop("Name", json!(format!("{record_name}.")))
            .prop("Type", json!("A"))
            .prop(
                "AliasTarget",
                json!({
                    "DNSName": target.dns_name,
                    "HostedZoneId": target.hosted_zone_id,
                }),
            );
        stack.add_resource(id, resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_record_shape() {
        let mut stack = Stack::new("blog-api-prod");
        let zone = HostedZoneAttributes {
            zone_id: "Z123456ABCDEF".to_string(),
            zone_name: "example.com".to_string(),
        };
        let record_id = ARecord::new(
            &mut stack,
            "BlogApiRecord",
            &zone,
            "blogapi.example.com",
            AliasTarget {
                dns_name: json!({ "Fn::GetAtt": ["BlogApiDomain", "DistributionDomainName"] }),
                hosted_zone_id: json!("Z2FDTNDATAQYW2"),
            },
        )
        .unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][record_id.as_str()]["Properties"];
        assert_eq!(props["Type"], "A");
        assert_eq!(props["Name"], "blogapi.example.com.");
        assert_eq!(props["HostedZoneId"], "Z123456ABCDEF");
    }
}
