//! Fetch engine.
//!
//! One fetch cycle walks every endpoint in manifest order, GETs it, and
//! writes the response body under `base_dir/<endpoint>/`. When the manifest
//! declares a status descriptor, an unchanged fingerprint short-circuits the
//! whole cycle.

use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::HttpConfig;
use crate::manifest::ApiManifest;
use crate::status::{StatusCheck, StatusMonitor};
use crate::utils::errors::ManagerError;
use crate::Result;

/// Runtime state of a manager. Not persisted: every process starts with an
/// empty fingerprint, forcing one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Completion time of the last successful cycle
    pub last_fetch: Option<DateTime<Utc>>,

    /// Fingerprint recorded by the last status check
    pub fingerprint: Option<String>,
}

/// Result of one `fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every endpoint was fetched and cached.
    Completed {
        endpoints: usize,
        finished_at: DateTime<Utc>,
    },
    /// The status fingerprint was unchanged; nothing was requested or written.
    UpToDate {
        last_fetch: Option<DateTime<Utc>>,
    },
}

/// Owns a manifest, its cache directory, and the HTTP client; runs fetch
/// cycles and serves the retrieval accessors.
#[derive(Debug)]
pub struct FetchManager {
    pub(crate) manifest: ApiManifest,
    base_dir: PathBuf,
    client: Client,
    monitor: StatusMonitor,
    state: FetchState,
}

impl FetchManager {
    /// Create a manager with default HTTP settings.
    pub fn new(manifest: ApiManifest, base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_http(manifest, base_dir, &HttpConfig::default())
    }

    /// Create a manager with explicit HTTP settings.
    pub fn with_http(
        manifest: ApiManifest,
        base_dir: impl Into<PathBuf>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()?;
        let monitor = StatusMonitor::from_manifest(&manifest);

        Ok(Self {
            manifest,
            base_dir: base_dir.into(),
            client,
            monitor,
            state: FetchState::default(),
        })
    }

    pub fn manifest(&self) -> &ApiManifest {
        &self.manifest
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Run one fetch cycle.
    ///
    /// Endpoints are fetched sequentially in manifest order, one attempt
    /// each; the first failure aborts the remaining loop and files written
    /// earlier in the cycle stay in place. Re-invoking with `force` retries
    /// idempotently, since each endpoint's file is simply overwritten.
    /// Manifests without a status descriptor refetch on every call.
    pub async fn fetch(&mut self, force: bool) -> Result<FetchOutcome> {
        let check = self
            .monitor
            .check(
                &self.client,
                &self.manifest.base_url,
                self.state.fingerprint.as_deref(),
            )
            .await?;
        if let StatusCheck::Refetch {
            fingerprint: Some(fingerprint),
        } = &check
        {
            self.state.fingerprint = Some(fingerprint.clone());
        }

        if check == StatusCheck::UpToDate && !force {
            info!(
                last_fetch = ?self.state.last_fetch,
                "cached files are up to date, skipping fetch (pass force to override)"
            );
            return Ok(FetchOutcome::UpToDate {
                last_fetch: self.state.last_fetch,
            });
        }

        let total = self.manifest.endpoints.len();
        info!("fetching {} endpoints from {}", total, self.manifest.name);

        let base_url = self.manifest.base_url.clone();
        for (index, endpoint) in self.manifest.endpoints.iter_mut().enumerate() {
            let url = format!("{}{}", base_url, endpoint.api_path);
            info!("[{}/{}] {}: requesting {}", index + 1, total, endpoint.name, url);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| request_error(&endpoint.name, e))?;
            if !response.status().is_success() {
                return Err(ManagerError::Fetch {
                    endpoint: endpoint.name.clone(),
                    reason: format!("HTTP {}", response.status()),
                });
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| request_error(&endpoint.name, e))?;

            let dir = self.base_dir.join(&endpoint.name);
            tokio::fs::create_dir_all(&dir).await?;
            let target = dir.join(derive_filename(&endpoint.api_path));
            tokio::fs::write(&target, &body).await?;
            info!(
                "[{}/{}] {}: wrote {} bytes to {}",
                index + 1,
                total,
                endpoint.name,
                body.len(),
                target.display()
            );

            endpoint.cached = Some(target);
        }

        let finished_at = Utc::now();
        self.state.last_fetch = Some(finished_at);
        info!("fetch cycle complete");

        Ok(FetchOutcome::Completed {
            endpoints: total,
            finished_at,
        })
    }

    /// Probe the status endpoint and return the current fingerprint, or
    /// `None` when the manifest declares no status descriptor.
    pub async fn probe_status(&self) -> Result<Option<String>> {
        match self
            .monitor
            .check(&self.client, &self.manifest.base_url, None)
            .await?
        {
            StatusCheck::Refetch { fingerprint } => Ok(fingerprint),
            // with no previous fingerprint the check can never be up to date
            StatusCheck::UpToDate => Ok(None),
        }
    }
}

fn request_error(endpoint: &str, err: reqwest::Error) -> ManagerError {
    if err.is_timeout() {
        ManagerError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        ManagerError::Fetch {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Derive the cache filename from the last segment of an endpoint path.
///
/// A segment with no ASCII punctuation is used verbatim; otherwise only its
/// alphabetic characters are kept, so `daily.csv` caches as `dailycsv`.
pub(crate) fn derive_filename(api_path: &str) -> String {
    let segment = api_path.rsplit('/').next().unwrap_or(api_path);
    if segment.chars().any(|c| c.is_ascii_punctuation()) {
        segment.chars().filter(|c| c.is_alphabetic()).collect()
    } else {
        segment.to_string()
    }
}
