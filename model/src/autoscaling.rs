use crate::constants::{
    cluster_ownership_tag, CLUSTER_OWNED_VALUE, DEFAULT_RESTORED_SIZE, NAT_GROUP_MARKER,
    TAG_ORIGINAL_DESIRED_CAPACITY, TAG_ORIGINAL_MAX_SIZE, TAG_ORIGINAL_MIN_SIZE,
};
use crate::parse::null_as_default;
use log::warn;
use serde::{Deserialize, Serialize};

/// The sizing of an Auto Scaling Group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingGroupSizing {
    pub name: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
}

impl AutoScalingGroupSizing {
    /// The sizing applied to a group when its cluster is suspended.
    pub fn zeroed<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            min_size: 0,
            max_size: 0,
            desired_capacity: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// An instance as listed inside an Auto Scaling Group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupInstance {
    pub instance_id: String,
    #[serde(default)]
    pub lifecycle_state: String,
    #[serde(default)]
    pub health_status: String,
}

impl GroupInstance {
    pub fn is_in_service(&self) -> bool {
        self.lifecycle_state == "InService" && self.health_status == "Healthy"
    }
}

/// An Auto Scaling Group as reported by `aws autoscaling describe-auto-scaling-groups`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutoScalingGroup {
    pub auto_scaling_group_name: String,
    #[serde(default)]
    pub min_size: u32,
    #[serde(default)]
    pub max_size: u32,
    #[serde(default)]
    pub desired_capacity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<GroupInstance>,
}

impl AutoScalingGroup {
    pub fn name(&self) -> &str {
        &self.auto_scaling_group_name
    }

    pub fn sizing(&self) -> AutoScalingGroupSizing {
        AutoScalingGroupSizing {
            name: self.auto_scaling_group_name.clone(),
            min_size: self.min_size,
            max_size: self.max_size,
            desired_capacity: self.desired_capacity,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    /// `true` if the group carries `kubernetes.io/cluster/<cluster>=owned`.
    pub fn is_owned_by(&self, cluster: &str) -> bool {
        self.tag(&cluster_ownership_tag(cluster)) == Some(CLUSTER_OWNED_VALUE)
    }

    pub fn is_nat(&self) -> bool {
        self.auto_scaling_group_name.contains(NAT_GROUP_MARKER)
    }

    /// The group is suspended if and only if it carries restoration tags.
    pub fn is_suspended(&self) -> bool {
        self.tag(TAG_ORIGINAL_MIN_SIZE).is_some()
    }

    pub fn restoration_tags(&self) -> RestorationTags {
        RestorationTags::from_tags(&self.tags)
    }

    pub fn in_service_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|instance| instance.is_in_service())
            .count()
    }
}

/// The output of `aws autoscaling describe-auto-scaling-groups`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAutoScalingGroupsOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_scaling_groups: Vec<AutoScalingGroup>,
}

/// The pre-suspend sizing of a group, as stored in its `panfactum.com/original-*` tags. Values are
/// kept as the raw tag strings so that a corrupted or missing tag can be detected on resume.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RestorationTags {
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub desired_capacity: Option<String>,
}

impl RestorationTags {
    pub const KEYS: [&'static str; 3] = [
        TAG_ORIGINAL_MIN_SIZE,
        TAG_ORIGINAL_MAX_SIZE,
        TAG_ORIGINAL_DESIRED_CAPACITY,
    ];

    pub fn from_tags(tags: &[Tag]) -> Self {
        let find = |key: &str| {
            tags.iter()
                .find(|tag| tag.key == key)
                .map(|tag| tag.value.clone())
        };
        Self {
            min_size: find(TAG_ORIGINAL_MIN_SIZE),
            max_size: find(TAG_ORIGINAL_MAX_SIZE),
            desired_capacity: find(TAG_ORIGINAL_DESIRED_CAPACITY),
        }
    }

    pub fn from_sizing(sizing: &AutoScalingGroupSizing) -> Self {
        Self {
            min_size: Some(sizing.min_size.to_string()),
            max_size: Some(sizing.max_size.to_string()),
            desired_capacity: Some(sizing.desired_capacity.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_size.is_none() && self.max_size.is_none() && self.desired_capacity.is_none()
    }

    /// The tag key and value pairs, skipping absent values.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        Self::KEYS
            .iter()
            .zip([&self.min_size, &self.max_size, &self.desired_capacity])
            .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
            .collect()
    }

    /// The sizing to restore for `group`. A tag that is missing or does not hold a number resolves
    /// to `1` rather than failing the resume.
    pub fn resolve(&self, group: &str) -> AutoScalingGroupSizing {
        let resolve_one = |key: &str, raw: &Option<String>| match raw.as_deref().map(str::parse::<u32>) {
            Some(Ok(value)) => value,
            Some(Err(_)) | None => {
                warn!(
                    "Tag '{}' on '{}' is missing or invalid ({:?}), using {}",
                    key, group, raw, DEFAULT_RESTORED_SIZE
                );
                DEFAULT_RESTORED_SIZE
            }
        };
        AutoScalingGroupSizing {
            name: group.to_string(),
            min_size: resolve_one(TAG_ORIGINAL_MIN_SIZE, &self.min_size),
            max_size: resolve_one(TAG_ORIGINAL_MAX_SIZE, &self.max_size),
            desired_capacity: resolve_one(TAG_ORIGINAL_DESIRED_CAPACITY, &self.desired_capacity),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_json;

    fn tag(key: &str, value: &str) -> Tag {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn describe_output() {
        let output: DescribeAutoScalingGroupsOutput = parse_json(
            "autoscaling describe-auto-scaling-groups output",
            r#"{
                "AutoScalingGroups": [
                    {
                        "AutoScalingGroupName": "production-eks-nat-1",
                        "MinSize": 1,
                        "MaxSize": 2,
                        "DesiredCapacity": 1,
                        "Instances": [
                            {"InstanceId": "i-1", "LifecycleState": "InService", "HealthStatus": "Healthy"},
                            {"InstanceId": "i-2", "LifecycleState": "Pending", "HealthStatus": "Healthy"}
                        ],
                        "Tags": [
                            {"Key": "kubernetes.io/cluster/production-eks", "Value": "owned", "ResourceId": "production-eks-nat-1"}
                        ]
                    },
                    {"AutoScalingGroupName": "other", "MinSize": 0, "MaxSize": 0, "DesiredCapacity": 0}
                ]
            }"#,
        )
        .unwrap();
        let nat = &output.auto_scaling_groups[0];
        assert!(nat.is_nat());
        assert!(nat.is_owned_by("production-eks"));
        assert!(!nat.is_owned_by("production"));
        assert!(!nat.is_suspended());
        assert_eq!(nat.in_service_count(), 1);
        assert!(output.auto_scaling_groups[1].tags.is_empty());
    }

    #[test]
    fn restoration_tags_round_trip() {
        let sizing = AutoScalingGroupSizing {
            name: "nat".into(),
            min_size: 2,
            max_size: 4,
            desired_capacity: 3,
        };
        let tags = RestorationTags::from_sizing(&sizing);
        assert_eq!(
            tags.entries(),
            vec![
                (TAG_ORIGINAL_MIN_SIZE, "2"),
                (TAG_ORIGINAL_MAX_SIZE, "4"),
                (TAG_ORIGINAL_DESIRED_CAPACITY, "3")
            ]
        );
        assert_eq!(tags.resolve("nat"), sizing);
    }

    #[test]
    fn missing_tags_default_to_one() {
        let tags = RestorationTags::from_tags(&[
            tag(TAG_ORIGINAL_MIN_SIZE, "2"),
            tag(TAG_ORIGINAL_DESIRED_CAPACITY, "three"),
        ]);
        assert_eq!(
            tags.resolve("nat"),
            AutoScalingGroupSizing {
                name: "nat".into(),
                min_size: 2,
                max_size: 1,
                desired_capacity: 1,
            }
        );
        assert!(RestorationTags::default().is_empty());
    }
}
