//! JSON record loading.

use crate::models::{Claim, Policy, SummaryCounters};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while acquiring records.
///
/// These are caller errors (missing file, wrong top-level shape), not data
/// quality problems; field-level problems are absorbed by the models.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything one actor's ledger export contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBundle {
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryCounters>,
}

/// Where the records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// A single file with `policies`, `claims` and an optional `summary`.
    Bundle(PathBuf),
    /// Two files, each holding a JSON array.
    Split { policies: PathBuf, claims: PathBuf },
}

impl RecordSource {
    /// Load and decode every record.
    pub async fn load(&self) -> Result<RecordBundle, SourceError> {
        let bundle = match self {
            RecordSource::Bundle(path) => read_json::<RecordBundle>(path).await?,
            RecordSource::Split { policies, claims } => {
                let (policies, claims) = tokio::try_join!(
                    read_json::<Vec<Policy>>(policies),
                    read_json::<Vec<Claim>>(claims)
                )?;
                RecordBundle {
                    policies,
                    claims,
                    summary: None,
                }
            }
        };

        info!(
            "Loaded {} policies and {} claims",
            bundle.policies.len(),
            bundle.claims.len()
        );

        Ok(bundle)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    debug!("Reading records from {}", path.display());

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
