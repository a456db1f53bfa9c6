//! Model artifact storage and the process-wide artifact cache.
//!
//! [`ArtifactStore`] names where the two artifacts live. [`ArtifactCache`]
//! loads them on first use and serves the same immutable [`Artifacts`] to
//! every caller afterwards.
//!
//! # Concurrency
//!
//! The cache is a single-initialization cell: concurrent first callers block
//! until one load finishes, and a successful load happens-before every `get`
//! that observes it. A failed load stores nothing, so the next `get` reads
//! storage again. Once populated the cache is read-only and can be shared
//! across threads without further synchronization.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::codec::LabelCodec;
use crate::model::YieldModel;
use crate::persist::{self, ReadError};

/// Default model artifact file name.
pub const DEFAULT_MODEL_FILE: &str = "yield_model.json";

/// Default codec artifact file name.
pub const DEFAULT_CODEC_FILE: &str = "crop_codec.json";

/// Which artifact an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Codec,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Codec => f.write_str("crop codec"),
        }
    }
}

/// Failures loading artifacts. All of them are terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact file does not exist.
    #[error("{kind} artifact not found at {}", .path.display())]
    NotFound { kind: ArtifactKind, path: PathBuf },

    /// The artifact exists but could not be decoded or failed validation.
    #[error("{kind} artifact at {} is corrupt: {source}", .path.display())]
    Corrupt {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    /// Any other I/O failure (permissions, is a directory, ...).
    #[error("failed reading {kind} artifact at {}: {source}", .path.display())]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArtifactError {
    fn from_read(kind: ArtifactKind, path: &Path, err: ReadError) -> Self {
        let path = path.to_path_buf();
        match err {
            ReadError::Io(e) if e.kind() == io::ErrorKind::NotFound => Self::NotFound { kind, path },
            ReadError::Io(source) => Self::Io { kind, path, source },
            ReadError::Json(e) if e.is_io() => Self::Io {
                kind,
                path,
                source: io::Error::from(e),
            },
            source => Self::Corrupt { kind, path, source },
        }
    }

    /// The artifact this error is about.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::NotFound { kind, .. } | Self::Corrupt { kind, .. } | Self::Io { kind, .. } => {
                *kind
            }
        }
    }

    /// Path of the offending artifact.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. } | Self::Corrupt { path, .. } | Self::Io { path, .. } => {
                path
            }
        }
    }
}

// =============================================================================
// ArtifactStore
// =============================================================================

/// Location of the model and codec artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
    model_file: String,
    codec_file: String,
}

impl ArtifactStore {
    /// Store rooted at `dir` with the default file names.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_file: DEFAULT_MODEL_FILE.to_owned(),
            codec_file: DEFAULT_CODEC_FILE.to_owned(),
        }
    }

    pub fn with_model_file(mut self, name: impl Into<String>) -> Self {
        self.model_file = name.into();
        self
    }

    pub fn with_codec_file(mut self, name: impl Into<String>) -> Self {
        self.codec_file = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn codec_path(&self) -> PathBuf {
        self.dir.join(&self.codec_file)
    }

    /// Read both artifacts from storage.
    pub fn load(&self) -> Result<Artifacts, ArtifactError> {
        let model_path = self.model_path();
        let codec_path = self.codec_path();

        debug!(model = %model_path.display(), codec = %codec_path.display(), "loading artifacts");

        let model = persist::load_model(&model_path)
            .map_err(|e| ArtifactError::from_read(ArtifactKind::Model, &model_path, e))?;
        let codec = persist::load_codec(&codec_path)
            .map_err(|e| ArtifactError::from_read(ArtifactKind::Codec, &codec_path, e))?;

        info!(
            model = %model_path.display(),
            n_trees = model.forest().n_trees(),
            n_features = model.n_features(),
            n_crops = codec.len(),
            "artifacts loaded"
        );

        Ok(Artifacts::new(model, codec))
    }
}

// =============================================================================
// Artifacts
// =============================================================================

/// The loaded model and codec pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    model: YieldModel,
    codec: LabelCodec,
}

impl Artifacts {
    pub fn new(model: YieldModel, codec: LabelCodec) -> Self {
        Self { model, codec }
    }

    pub fn model(&self) -> &YieldModel {
        &self.model
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    /// Both halves at once.
    pub fn parts(&self) -> (&YieldModel, &LabelCodec) {
        (&self.model, &self.codec)
    }
}

// =============================================================================
// ArtifactCache
// =============================================================================

/// Lazily loaded, read-only artifact holder.
///
/// Share one cache per process (e.g. behind an `Arc`); every clone of the
/// `Arc` sees the same load.
#[derive(Debug)]
pub struct ArtifactCache {
    store: ArtifactStore,
    cell: OnceCell<Artifacts>,
}

impl ArtifactCache {
    /// Cache that will load from `store` on first [`get`](Self::get).
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            cell: OnceCell::new(),
        }
    }

    /// Cache that is already populated. `store` is kept for diagnostics only.
    pub fn preloaded(store: ArtifactStore, artifacts: Artifacts) -> Self {
        Self {
            store,
            cell: OnceCell::with_value(artifacts),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The artifacts, loading them if this is the first call.
    ///
    /// # Errors
    ///
    /// [`ArtifactError`] if either artifact is missing or unreadable. Nothing
    /// is cached on failure.
    pub fn get(&self) -> Result<&Artifacts, ArtifactError> {
        self.cell.get_or_try_init(|| self.store.load())
    }

    /// Whether a load has already succeeded.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
