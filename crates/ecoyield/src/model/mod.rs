//! High-level model wrappers.
//!
//! - [`YieldModel`]: Tree-ensemble yield regressor
//! - [`ModelMeta`]: Input schema recorded at training time
//!
//! # Example
//!
//! ```ignore
//! use ecoyield::model::YieldModel;
//!
//! let model = YieldModel::load("models/yield_model.json")?;
//! let tons_per_ha = model.predict_row(&row);
//! ```

mod meta;
mod regressor;

pub use meta::ModelMeta;
pub use regressor::YieldModel;
