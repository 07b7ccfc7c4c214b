use crate::constants::{SUSPENDED_VALUE, TAG_SUSPENDED};
use crate::parse::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An EKS cluster as reported by `aws eks describe-cluster`. It is retrieved fresh on every
/// invocation and never cached.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub name: String,
    pub arn: String,
    pub status: Option<String>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
}

impl ClusterInfo {
    /// `true` while the cluster carries `panfactum.com/suspended=true`.
    pub fn is_suspended(&self) -> bool {
        self.tags.get(TAG_SUSPENDED).map(String::as_str) == Some(SUSPENDED_VALUE)
    }

    /// The region component of the cluster ARN, `arn:partition:service:region:account:resource`.
    pub fn region(&self) -> Option<&str> {
        let mut parts = self.arn.splitn(6, ':');
        if parts.next() != Some("arn") {
            return None;
        }
        let region = parts.nth(2)?;
        if region.is_empty() || parts.count() != 2 {
            return None;
        }
        Some(region)
    }
}

/// The output of `aws eks describe-cluster`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DescribeClusterOutput {
    pub cluster: ClusterInfo,
}

/// The output of `aws sts get-caller-identity`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_json;
    use maplit::btreemap;

    fn cluster(arn: &str) -> ClusterInfo {
        ClusterInfo {
            name: "production-eks".into(),
            arn: arn.into(),
            ..Default::default()
        }
    }

    #[test]
    fn tags_are_optional() {
        let output: DescribeClusterOutput = parse_json(
            "eks describe-cluster output",
            r#"{
                "cluster": {
                    "name": "production-eks",
                    "arn": "arn:aws:eks:us-east-2:123456789012:cluster/production-eks",
                    "status": "ACTIVE",
                    "version": "1.29",
                    "certificateAuthority": {"data": "abc"}
                }
            }"#,
        )
        .unwrap();
        assert!(output.cluster.tags.is_empty());
        assert!(!output.cluster.is_suspended());
        assert_eq!(output.cluster.status.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn null_tags_are_empty() {
        let output: DescribeClusterOutput = parse_json(
            "eks describe-cluster output",
            r#"{"cluster": {"name": "c", "arn": "arn:aws:eks:us-east-2:1:cluster/c", "tags": null}}"#,
        )
        .unwrap();
        assert!(output.cluster.tags.is_empty());
    }

    #[test]
    fn suspended_tag() {
        let mut info = cluster("arn:aws:eks:us-east-2:123456789012:cluster/production-eks");
        info.tags = btreemap! { TAG_SUSPENDED.to_string() => "true".to_string() };
        assert!(info.is_suspended());
        info.tags = btreemap! { TAG_SUSPENDED.to_string() => "false".to_string() };
        assert!(!info.is_suspended());
    }

    #[test]
    fn region_from_arn() {
        assert_eq!(
            cluster("arn:aws:eks:us-east-2:123456789012:cluster/production-eks").region(),
            Some("us-east-2")
        );
        assert_eq!(cluster("production-eks").region(), None);
        assert_eq!(cluster("arn:aws:eks::123:cluster/x").region(), None);
    }
}
