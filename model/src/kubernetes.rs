//! Minimal views of the Kubernetes objects that suspend and resume read with `kubectl -o json`.
//! Only the fields that are acted on are modeled. Everything else in the documents is ignored.

use crate::constants::CERTIFICATE_ISSUER_FILTER;
use crate::parse::null_as_default;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `kind: List` document as printed by `kubectl get <resource> -o json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ItemList<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: Option<String>,
}

/// A Karpenter `NodePool`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePool {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NodePoolSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePoolSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub limits: Map<String, Value>,
}

/// The resource limits of a node pool. Quantities are kept in their Kubernetes string form.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodePoolLimits {
    pub name: String,
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

impl NodePoolLimits {
    pub fn has_limits(&self) -> bool {
        self.cpu.is_some() || self.memory.is_some()
    }
}

fn quantity(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<NodePool> for NodePoolLimits {
    fn from(pool: NodePool) -> Self {
        Self {
            cpu: pool.spec.limits.get("cpu").and_then(quantity),
            memory: pool.spec.limits.get("memory").and_then(quantity),
            name: pool.metadata.name,
        }
    }
}

/// A cert-manager `Certificate`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CertificateResource {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CertificateSpec,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    pub duration: Option<String>,
    pub issuer_ref: Option<IssuerRef>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct IssuerRef {
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Certificate {
    pub name: String,
    pub namespace: String,
    pub issuer: String,
    pub duration: Option<String>,
}

impl Certificate {
    /// Certificates from internal issuers are extended before a cluster is suspended so they do
    /// not lapse while cert-manager is not running.
    pub fn is_internal(&self) -> bool {
        self.issuer.contains(CERTIFICATE_ISSUER_FILTER)
    }

    /// Converts the resource, dropping certificates that are not namespaced. Those cannot be
    /// patched by `kubectl -n`.
    pub fn from_resource(resource: CertificateResource) -> Option<Self> {
        let namespace = resource.metadata.namespace?;
        Some(Self {
            name: resource.metadata.name,
            namespace,
            issuer: resource
                .spec
                .issuer_ref
                .map(|issuer| issuer.name)
                .unwrap_or_default(),
            duration: resource.spec.duration,
        })
    }
}

/// A Kubernetes `Node`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeResource {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: NodeStatus,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<NodeCondition>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KubeNode {
    pub name: String,
    pub ready: bool,
}

impl From<NodeResource> for KubeNode {
    fn from(node: NodeResource) -> Self {
        let ready = node
            .status
            .conditions
            .iter()
            .any(|condition| condition.kind == "Ready" && condition.status == "True");
        Self {
            name: node.metadata.name,
            ready,
        }
    }
}
