//! Retrieval accessors for cached payloads.
//!
//! Retrieval never triggers a fetch: an endpoint that has not been fetched in
//! this process resolves to `None`.

use std::path::Path;

use crate::fetch::FetchManager;
use crate::utils::errors::ManagerError;
use crate::Result;

/// Delimited tabular payload, optionally narrowed to a column subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FetchManager {
    /// Path of the cached payload, or `None` before the first successful
    /// fetch of this endpoint.
    pub fn retrieve_path(&self, endpoint: &str) -> Result<Option<&Path>> {
        let endpoint = self
            .manifest
            .endpoint(endpoint)
            .ok_or_else(|| ManagerError::UnknownEndpoint(endpoint.to_string()))?;
        Ok(endpoint.cached.as_deref())
    }

    /// Raw bytes of the cached payload.
    pub fn retrieve_bytes(&self, endpoint: &str) -> Result<Option<Vec<u8>>> {
        match self.retrieve_path(endpoint)? {
            Some(path) => Ok(Some(std::fs::read(path)?)),
            None => Ok(None),
        }
    }

    /// Cached payload parsed as a delimited table.
    ///
    /// `columns` narrows and orders the result; when absent, the endpoint's
    /// declared `fields` apply; when neither is given, every column is kept.
    pub fn retrieve_table(&self, endpoint: &str, columns: Option<&[String]>) -> Result<Option<Table>> {
        let endpoint = self
            .manifest
            .endpoint(endpoint)
            .ok_or_else(|| ManagerError::UnknownEndpoint(endpoint.to_string()))?;
        let Some(path) = endpoint.cached.as_deref() else {
            return Ok(None);
        };

        let filter = columns.or(endpoint.fields.as_deref());
        read_table(path, filter).map(Some)
    }
}

/// Read a CSV file, keeping only `columns` (in that order) when given.
fn read_table(path: &Path, columns: Option<&[String]>) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let selection: Option<Vec<usize>> = match columns {
        Some(wanted) => Some(
            wanted
                .iter()
                .map(|name| {
                    headers
                        .iter()
                        .position(|header| header == name)
                        .ok_or_else(|| ManagerError::UnknownColumn(name.clone()))
                })
                .collect::<Result<_>>()?,
        ),
        None => None,
    };

    let out_headers: Vec<String> = match &selection {
        Some(indices) => indices.iter().map(|&i| headers[i].to_string()).collect(),
        None => headers.iter().map(str::to_string).collect(),
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<String> = match &selection {
            Some(indices) => indices
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect(),
            None => record.iter().map(str::to_string).collect(),
        };
        rows.push(row);
    }

    Ok(Table {
        headers: out_headers,
        rows,
    })
}
