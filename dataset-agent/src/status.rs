//! Upstream change detection.
//!
//! A manifest may declare a cheap status endpoint (build time, dataset
//! version) whose value changes whenever the upstream data does. Fetch cycles
//! fingerprint that value and skip the data endpoints when it is unchanged.

use reqwest::Client;
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::manifest::{ApiManifest, StatusProbe};
use crate::utils::errors::ManagerError;
use crate::Result;

/// Change-detection strategy for a fetch cycle.
///
/// `Disabled` reports every cycle as needing a fetch; `Watching` compares
/// fingerprints of the configured status value.
#[derive(Debug, Clone)]
pub enum StatusMonitor {
    Disabled,
    Watching(StatusProbe),
}

/// Verdict of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCheck {
    /// The upstream is unchanged since the previous fingerprint was recorded.
    UpToDate,
    /// A fetch is needed; carries the fingerprint to store, when monitoring.
    Refetch { fingerprint: Option<String> },
}

impl StatusMonitor {
    /// Build the monitor matching the manifest's status declaration.
    pub fn from_manifest(manifest: &ApiManifest) -> Self {
        match &manifest.status {
            Some(probe) => StatusMonitor::Watching(probe.clone()),
            None => StatusMonitor::Disabled,
        }
    }

    /// Decide whether a fetch cycle is needed.
    pub async fn check(
        &self,
        client: &Client,
        base_url: &str,
        previous: Option<&str>,
    ) -> Result<StatusCheck> {
        let probe = match self {
            StatusMonitor::Disabled => {
                return Ok(StatusCheck::Refetch { fingerprint: None });
            }
            StatusMonitor::Watching(probe) => probe,
        };

        let url = format!("{}{}", base_url, probe.api);
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ManagerError::StatusLookup(format!(
                "status endpoint returned HTTP {}",
                response.status()
            )));
        }
        let document: Value = response.json().await?;

        let fingerprint = fingerprint_of(drill(&document, &probe.keys)?);
        debug!(%fingerprint, "status fingerprint computed");

        if previous == Some(fingerprint.as_str()) {
            Ok(StatusCheck::UpToDate)
        } else {
            Ok(StatusCheck::Refetch {
                fingerprint: Some(fingerprint),
            })
        }
    }
}

/// Walk `keys` into the JSON document, expecting an indexable node at every
/// step and a scalar at the end.
fn drill<'a>(document: &'a Value, keys: &[String]) -> Result<&'a Value> {
    let mut node = document;
    for key in keys {
        node = match node {
            Value::Object(map) => map.get(key).ok_or_else(|| {
                ManagerError::StatusLookup(format!("key '{key}' not found in status response"))
            })?,
            Value::Array(items) => {
                let index: usize = key.parse().map_err(|_| {
                    ManagerError::StatusLookup(format!("key '{key}' cannot index an array"))
                })?;
                items.get(index).ok_or_else(|| {
                    ManagerError::StatusLookup(format!(
                        "index {index} out of bounds in status response"
                    ))
                })?
            }
            other => {
                return Err(ManagerError::StatusLookup(format!(
                    "key '{key}' cannot index a {}",
                    json_type(other)
                )));
            }
        };
    }

    match node {
        Value::Object(_) | Value::Array(_) => Err(ManagerError::StatusLookup(
            "status keys did not resolve to a scalar value".to_string(),
        )),
        scalar => Ok(scalar),
    }
}

/// SHA-1 hex digest of the scalar's string form.
fn fingerprint_of(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
