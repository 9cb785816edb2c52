// file: src/document/mod.rs
// description: document model module exports

pub mod fingerprint;
pub mod front_matter;
pub mod model;

pub use fingerprint::Fingerprint;
pub use front_matter::{Field, FieldStyle, FieldValue, FrontMatter, MissingFieldError, MixedFormatError};
pub use model::Document;
