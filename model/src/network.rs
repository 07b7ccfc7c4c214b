use crate::parse::null_as_default;
use serde::{Deserialize, Serialize};

/// The output of `aws ec2 describe-instances`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstancesOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reservations: Vec<Reservation>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reservation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<Instance>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub instance_id: Option<String>,
}

impl DescribeInstancesOutput {
    pub fn instance_ids(&self) -> Vec<String> {
        self.reservations
            .iter()
            .flat_map(|reservation| reservation.instances.iter())
            .filter_map(|instance| instance.instance_id.clone())
            .collect()
    }
}

/// An Elastic Load Balancing v2 load balancer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(rename = "LoadBalancerArn")]
    pub arn: String,
    #[serde(rename = "LoadBalancerName")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

impl LoadBalancer {
    /// Load balancers are attributed to a cluster when the cluster name appears anywhere in their
    /// ARN. This also matches clusters whose name contains `cluster` as a substring.
    pub fn matches_cluster(&self, cluster: &str) -> bool {
        !cluster.is_empty() && self.arn.contains(cluster)
    }
}

/// The output of `aws elbv2 describe-load-balancers`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeLoadBalancersOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub load_balancers: Vec<LoadBalancer>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_json;

    #[test]
    fn instance_ids_across_reservations() {
        let output: DescribeInstancesOutput = parse_json(
            "ec2 describe-instances output",
            r#"{
                "Reservations": [
                    {"Instances": [{"InstanceId": "i-1"}, {"InstanceId": "i-2"}]},
                    {"Instances": null},
                    {"Instances": [{"State": {"Name": "running"}}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(output.instance_ids(), vec!["i-1", "i-2"]);
    }

    #[test]
    fn load_balancer_matching_is_by_arn_substring() {
        let output: DescribeLoadBalancersOutput = parse_json(
            "elbv2 describe-load-balancers output",
            r#"{
                "LoadBalancers": [
                    {"LoadBalancerArn": "arn:aws:elasticloadbalancing:us-east-2:1:loadbalancer/net/production-eks-ingress/abc", "Type": "network"},
                    {"LoadBalancerArn": "arn:aws:elasticloadbalancing:us-east-2:1:loadbalancer/app/staging/def"}
                ]
            }"#,
        )
        .unwrap();
        let matched: Vec<_> = output
            .load_balancers
            .iter()
            .filter(|lb| lb.matches_cluster("production-eks"))
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].kind.as_deref(), Some("network"));
        // Substring matching also catches similarly named clusters.
        assert!(output.load_balancers[0].matches_cluster("production"));
        assert!(!output.load_balancers[0].matches_cluster(""));
    }
}
