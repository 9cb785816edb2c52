// file: src/images/mod.rs
// description: image reference extraction, classification and resolution

pub mod reference;
pub mod resolver;
pub mod retry;

pub use reference::{ClassifiedReference, ImageKind, ImageReference};
pub use resolver::{ImageResolver, ResolutionReport, ResolvedImage};
pub use retry::RetryPolicy;
