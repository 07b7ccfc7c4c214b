use crate::constants::RESUMED_NODE_GROUP_SIZE;
use crate::parse::null_as_default;
use serde::{Deserialize, Serialize};

/// The scaling configuration of an EKS managed node group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupConfig {
    pub name: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_size: u32,
}

impl NodeGroupConfig {
    /// The scaling configuration applied on suspend.
    pub fn suspended<S: Into<String>>(name: S) -> Self {
        Self::sized(name, 0)
    }

    /// The scaling configuration applied on resume. This is a fixed size, not the size the group
    /// had before it was suspended.
    pub fn resumed<S: Into<String>>(name: S) -> Self {
        Self::sized(name, RESUMED_NODE_GROUP_SIZE)
    }

    fn sized<S: Into<String>>(name: S, size: u32) -> Self {
        Self {
            name: name.into(),
            min_size: size,
            max_size: size,
            desired_size: size,
        }
    }

    /// The value of `--scaling-config` for `aws eks update-nodegroup-config`.
    pub fn scaling_config_arg(&self) -> String {
        format!(
            "minSize={},maxSize={},desiredSize={}",
            self.min_size, self.max_size, self.desired_size
        )
    }
}

/// The output of `aws eks list-nodegroups`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodegroupsOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodegroups: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_json;

    #[test]
    fn scaling_config() {
        assert_eq!(
            NodeGroupConfig::suspended("workers").scaling_config_arg(),
            "minSize=0,maxSize=0,desiredSize=0"
        );
        assert_eq!(
            NodeGroupConfig::resumed("workers").scaling_config_arg(),
            "minSize=3,maxSize=3,desiredSize=3"
        );
    }

    #[test]
    fn nodegroups_are_optional() {
        let output: ListNodegroupsOutput = parse_json("eks list-nodegroups output", "{}").unwrap();
        assert!(output.nodegroups.is_empty());
        let output: ListNodegroupsOutput = parse_json(
            "eks list-nodegroups output",
            r#"{"nodegroups": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(output.nodegroups, vec!["a", "b"]);
    }
}
