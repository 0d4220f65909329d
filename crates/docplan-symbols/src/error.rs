use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a [`crate::SymbolManifest`].
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unable to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest root name must not be empty")]
    EmptyRootName,

    #[error("manifest entry under {parent} has an empty name")]
    EmptyMemberName { parent: String },
}
