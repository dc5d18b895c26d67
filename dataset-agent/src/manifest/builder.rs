//! Programmatic manifest construction.
//!
//! Callers that template many endpoints (one per state, say) build the
//! manifest in code and write it to disk for later runs.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::StatusProbe;
use crate::utils::errors::ManagerError;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
struct RawManifestOut {
    api: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<StatusProbe>,
    endpoints: Vec<RawEndpointOut>,
}

#[derive(Debug, Clone, Serialize)]
struct RawEndpointOut {
    name: String,
    api: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

/// Builder for the YAML manifest format consumed by [`super::ApiManifest`].
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    name: String,
    base_url: String,
    status: Option<StatusProbe>,
    endpoints: Vec<RawEndpointOut>,
}

impl ManifestBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            status: None,
            endpoints: Vec::new(),
        }
    }

    /// Declare the status-check descriptor.
    pub fn status(mut self, api: impl Into<String>, keys: Vec<String>) -> Self {
        self.status = Some(StatusProbe {
            api: api.into(),
            keys,
        });
        self
    }

    /// Add an endpoint.
    pub fn endpoint(mut self, name: impl Into<String>, api: impl Into<String>) -> Self {
        self.endpoints.push(RawEndpointOut {
            name: name.into(),
            api: api.into(),
            fields: None,
        });
        self
    }

    /// Add an endpoint that keeps only the given columns on tabular retrieval.
    pub fn endpoint_with_fields(
        mut self,
        name: impl Into<String>,
        api: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        self.endpoints.push(RawEndpointOut {
            name: name.into(),
            api: api.into(),
            fields: Some(fields),
        });
        self
    }

    /// Render the manifest as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        let mut doc = BTreeMap::new();
        doc.insert(
            self.name.clone(),
            RawManifestOut {
                api: self.base_url.clone(),
                status: self.status.clone(),
                endpoints: self.endpoints.clone(),
            },
        );
        serde_yaml::to_string(&doc)
            .map_err(|e| ManagerError::Config(format!("could not render manifest: {e}")))
    }

    /// Write the manifest to a YAML file.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::ApiManifest;
    use super::*;

    #[test]
    fn built_manifest_parses_back() {
        let builder = ManifestBuilder::new("covid-tracking", "https://api.covidtracking.com")
            .status("/v1/status.json", vec!["buildTime".to_string()])
            .endpoint("us-historical", "/v1/us/daily.csv")
            .endpoint_with_fields(
                "states-info",
                "/v1/states/info.csv",
                vec!["state".to_string(), "name".to_string()],
            );

        let manifest = ApiManifest::from_yaml(&builder.to_yaml().unwrap()).unwrap();
        assert_eq!(manifest.name, "covid-tracking");
        assert_eq!(manifest.base_url, "https://api.covidtracking.com");
        assert_eq!(manifest.endpoints.len(), 2);
        assert_eq!(manifest.endpoints[0].name, "us-historical");
        assert_eq!(
            manifest.endpoints[1].fields.as_deref().unwrap(),
            ["state", "name"]
        );
        assert_eq!(manifest.status.unwrap().keys, ["buildTime"]);
    }

    #[test]
    fn status_block_is_omitted_when_not_declared() {
        let yaml = ManifestBuilder::new("census", "https://api.census.gov")
            .endpoint("population", "/data/2019/pep/population")
            .to_yaml()
            .unwrap();
        assert!(!yaml.contains("status"));

        let manifest = ApiManifest::from_yaml(&yaml).unwrap();
        assert!(manifest.status.is_none());
    }

    #[test]
    fn write_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("census.yml");

        ManifestBuilder::new("census", "https://api.census.gov")
            .endpoint("population", "/data/2019/pep/population")
            .write(&path)
            .unwrap();

        let manifest = ApiManifest::from_file(&path).unwrap();
        assert_eq!(manifest.name, "census");
        assert_eq!(manifest.endpoints[0].name, "population");
    }
}
