use crate::error::{self, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Decode the JSON printed by `aws ... --output json` or `kubectl ... -o json` into `T`. `what`
/// names the document (e.g. `eks describe-cluster output`) for the error message, which also
/// carries the path of the offending field (e.g. `cluster.arn`).
pub fn parse_json<T>(what: &str, raw: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = e.path().to_string();
        error::Error::Parse {
            what: what.to_string(),
            path,
            source: e.into_inner(),
        }
    })
}

/// Deserialize a missing or `null` value as `T::default()`. The AWS CLI prints `null` for some
/// empty collections and kubeconfig files commonly carry `env: null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
