//! Crop label codec.
//!
//! [`LabelCodec`] maps crop names to the integer index the model was fitted
//! on, and back. The vocabulary is fixed at training time and the mapping is
//! a bijection over it.

use std::collections::{BTreeSet, HashMap};

/// Errors raised by [`LabelCodec`] lookups and construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The crop name is not part of the training vocabulary.
    #[error("unknown crop '{name}' (vocabulary has {vocabulary_size} crops)")]
    UnknownCrop { name: String, vocabulary_size: usize },

    /// The index does not correspond to any crop.
    #[error("crop index {index} out of range (vocabulary has {vocabulary_size} crops)")]
    InvalidIndex { index: usize, vocabulary_size: usize },

    /// The same crop name appears twice in the vocabulary.
    #[error("duplicate crop '{0}' in vocabulary")]
    DuplicateCrop(String),

    /// A crop name is empty.
    #[error("empty crop name at position {0}")]
    EmptyCrop(usize),
}

/// Bijective crop name <-> index dictionary.
///
/// Immutable after construction. Indices are positions in [`classes`](Self::classes),
/// which keeps the order recorded at training time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCodec {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelCodec {
    /// Create a codec from an ordered vocabulary.
    ///
    /// Rejects empty and duplicate names, since either would break the bijection.
    pub fn new(classes: Vec<String>) -> Result<Self, CodecError> {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, name) in classes.iter().enumerate() {
            if name.is_empty() {
                return Err(CodecError::EmptyCrop(i));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(CodecError::DuplicateCrop(name.clone()));
            }
        }
        Ok(Self { classes, index })
    }

    /// Fit a codec on the raw crop column of a training set.
    ///
    /// Classes are de-duplicated and sorted, so the same vocabulary always
    /// produces the same indices.
    pub fn fit<I, S>(labels: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect();
        Self::new(unique.into_iter().collect())
    }

    /// Index of `name`.
    pub fn encode(&self, name: &str) -> Result<usize, CodecError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::UnknownCrop {
                name: name.to_owned(),
                vocabulary_size: self.classes.len(),
            })
    }

    /// Crop name at `index`.
    pub fn decode(&self, index: usize) -> Result<&str, CodecError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(CodecError::InvalidIndex {
                index,
                vocabulary_size: self.classes.len(),
            })
    }

    /// The vocabulary in training order.
    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether `name` is part of the vocabulary.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of crops.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
