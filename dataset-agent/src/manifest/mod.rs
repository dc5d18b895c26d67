//! Declarative API manifests.
//!
//! A manifest is a YAML document with a single root mapping: the key is the
//! API's display name, the value declares the base URL, the ordered endpoint
//! list, and an optional status descriptor used for change detection:
//!
//! ```yaml
//! covid-tracking:
//!   api: https://api.covidtracking.com
//!   status:
//!     api: /v1/status.json
//!     keys: [buildTime]
//!   endpoints:
//!     - name: us-historical
//!       api: /v1/us/daily.csv
//!       fields: [date, deathIncrease, positiveIncrease]
//! ```

mod builder;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::utils::errors::ManagerError;
use crate::Result;

pub use builder::ManifestBuilder;

/// One named, independently fetchable resource under the API base URL.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Unique key within the manifest
    pub name: String,

    /// Path appended to the base URL to form the request URL
    pub api_path: String,

    /// Columns retained when the payload is loaded as a table
    pub fields: Option<Vec<String>>,

    /// Where the last fetched payload was written, if any
    pub cached: Option<PathBuf>,
}

/// Status-check descriptor: a cheap endpoint whose drilled-out value changes
/// whenever the upstream dataset does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusProbe {
    /// Path appended to the base URL
    pub api: String,

    /// Keys walked, in order, into the JSON status document
    pub keys: Vec<String>,
}

/// Parsed manifest: base URL plus the ordered endpoint registry.
#[derive(Debug, Clone)]
pub struct ApiManifest {
    pub name: String,
    pub base_url: String,
    pub endpoints: Vec<Endpoint>,
    pub status: Option<StatusProbe>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    /// Overrides the display name taken from the root mapping key
    name: Option<String>,
    api: Option<String>,
    status: Option<StatusProbe>,
    endpoints: Option<Vec<RawEndpoint>>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    name: Option<String>,
    api: String,
    fields: Option<Vec<String>>,
}

impl ApiManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let doc: BTreeMap<String, RawManifest> = serde_yaml::from_str(source)
            .map_err(|e| ManagerError::Config(format!("malformed manifest: {e}")))?;

        if doc.len() > 1 {
            return Err(ManagerError::Config(format!(
                "expected a single top-level entry, found {}",
                doc.len()
            )));
        }
        let Some((root_key, raw)) = doc.into_iter().next() else {
            return Err(ManagerError::Config("empty manifest".to_string()));
        };

        let name = promote_name(root_key, raw.name);
        let base_url = raw.api.ok_or_else(|| {
            ManagerError::Config(format!("manifest '{name}' is missing the 'api' base URL"))
        })?;

        let raw_endpoints = raw.endpoints.unwrap_or_default();
        if raw_endpoints.is_empty() {
            return Err(ManagerError::Config(format!(
                "manifest '{name}' declares no endpoints"
            )));
        }

        let endpoints = raw_endpoints
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Endpoint {
                name: promote_name(index.to_string(), raw.name),
                api_path: raw.api,
                fields: raw.fields,
                cached: None,
            })
            .collect();

        Ok(Self {
            name,
            base_url,
            endpoints,
            status: raw.status,
        })
    }

    /// Parse a manifest from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

/// Promote a declared `name` field over the fallback key.
///
/// Applied to the manifest root (fallback: the root mapping key) and to each
/// endpoint descriptor (fallback: its position in the list).
fn promote_name(fallback: String, declared: Option<String>) -> String {
    declared.unwrap_or(fallback)
}
