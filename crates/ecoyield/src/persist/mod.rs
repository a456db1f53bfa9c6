//! Artifact persistence.
//!
//! Both artifacts are JSON documents tagged with a format version:
//!
//! - the model artifact ([`ModelEnvelope`]) holding the fitted forest and its
//!   input schema,
//! - the codec artifact ([`CodecSchema`]) holding the crop vocabulary.
//!
//! Readers validate everything they load; a structurally broken artifact is
//! reported as [`ReadError::Validation`] rather than surfacing later as a
//! wrong prediction.

mod convert;
pub mod schema;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub use schema::{CodecSchema, ModelEnvelope, FORMAT_VERSION};

use crate::codec::LabelCodec;
use crate::model::YieldModel;

/// Errors while reading an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("unexpected model type '{0}'")]
    UnexpectedModelType(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Errors while writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Model
// =============================================================================

/// Read a model artifact from any reader.
pub fn read_model_json<R: Read>(reader: R) -> Result<YieldModel, ReadError> {
    let envelope: ModelEnvelope = serde_json::from_reader(reader)?;
    YieldModel::try_from(envelope)
}

/// Write a model artifact to any writer.
pub fn write_model_json<W: Write>(model: &YieldModel, writer: W, pretty: bool) -> Result<(), WriteError> {
    let envelope = ModelEnvelope::from(model);
    if pretty {
        serde_json::to_writer_pretty(writer, &envelope)?;
    } else {
        serde_json::to_writer(writer, &envelope)?;
    }
    Ok(())
}

/// Load a model artifact from a file.
pub fn load_model(path: impl AsRef<Path>) -> Result<YieldModel, ReadError> {
    let file = File::open(path.as_ref())?;
    read_model_json(BufReader::new(file))
}

/// Save a model artifact to a file.
pub fn save_model(model: &YieldModel, path: impl AsRef<Path>) -> Result<(), WriteError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_model_json(model, &mut writer, true)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Codec
// =============================================================================

/// Read a codec artifact from any reader.
pub fn read_codec_json<R: Read>(reader: R) -> Result<LabelCodec, ReadError> {
    let schema: CodecSchema = serde_json::from_reader(reader)?;
    LabelCodec::try_from(schema)
}

/// Write a codec artifact to any writer.
pub fn write_codec_json<W: Write>(codec: &LabelCodec, writer: W) -> Result<(), WriteError> {
    serde_json::to_writer_pretty(writer, &CodecSchema::from(codec))?;
    Ok(())
}

/// Load a codec artifact from a file.
pub fn load_codec(path: impl AsRef<Path>) -> Result<LabelCodec, ReadError> {
    let file = File::open(path.as_ref())?;
    read_codec_json(BufReader::new(file))
}

/// Save a codec artifact to a file.
pub fn save_codec(codec: &LabelCodec, path: impl AsRef<Path>) -> Result<(), WriteError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_codec_json(codec, &mut writer)?;
    writer.flush()?;
    Ok(())
}
