/// Helper macro to avoid retyping the base domain-like name of the platform when creating further
/// string constants from it. When given no parameters, this returns the base domain-like name.
/// When given a string literal parameter it adds `/parameter` to the end.
macro_rules! panfactum {
    () => {
        "panfactum.com"
    };
    ($s:literal) => {
        concat!(panfactum!(), "/", $s)
    };
}

pub const PANFACTUM: &str = panfactum!();

// Tag keys
pub const TAG_SUSPENDED: &str = panfactum!("suspended");
pub const TAG_ORIGINAL_MIN_SIZE: &str = panfactum!("original-min-size");
pub const TAG_ORIGINAL_MAX_SIZE: &str = panfactum!("original-max-size");
pub const TAG_ORIGINAL_DESIRED_CAPACITY: &str = panfactum!("original-desired-capacity");

// Tag values
pub const SUSPENDED_VALUE: &str = "true";
pub const CLUSTER_OWNED_VALUE: &str = "owned";

/// Auto Scaling Groups whose names contain this marker are the NAT gateway groups.
pub const NAT_GROUP_MARKER: &str = "nat";

/// The value used for any restoration tag that is missing when a cluster is resumed.
pub const DEFAULT_RESTORED_SIZE: u32 = 1;

/// EKS node groups are always brought back to this size, regardless of their size before suspend.
pub const RESUMED_NODE_GROUP_SIZE: u32 = 3;

// Custom resource definitions
pub const KARPENTER_NODE_POOL_CRD: &str = "nodepools.karpenter.sh";
pub const CERTIFICATE_CRD: &str = "certificates.cert-manager.io";

// Certificates issued by an issuer whose name contains this filter are extended before suspend.
pub const CERTIFICATE_ISSUER_FILTER: &str = "internal";
pub const EXTENDED_CERTIFICATE_DURATION: &str = "2160h";

// Workloads touched on resume
pub const SYSTEM_NAMESPACE: &str = "kube-system";
pub const SCHEDULER_DEPLOYMENT: &str = "panfactum-scheduler";
pub const SCHEDULER_REPLICAS: u32 = 2;
pub const CILIUM_OPERATOR_DEPLOYMENT: &str = "cilium-operator";
pub const CILIUM_SCHEDULER_ENV: &str = "CILIUM_K8S_SCHEDULER=panfactum";

/// The tag key that marks EC2 instances and Auto Scaling Groups as owned by `cluster`.
pub fn cluster_ownership_tag(cluster: &str) -> String {
    format!("kubernetes.io/cluster/{}", cluster)
}

#[test]
fn tag_keys_are_namespaced() {
    assert_eq!(TAG_SUSPENDED, "panfactum.com/suspended");
    assert_eq!(
        TAG_ORIGINAL_DESIRED_CAPACITY,
        "panfactum.com/original-desired-capacity"
    );
    assert_eq!(
        cluster_ownership_tag("production-eks"),
        "kubernetes.io/cluster/production-eks"
    );
}
