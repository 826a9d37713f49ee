//! Service layer: validation applied before posts reach the store.

pub mod validation;
pub use validation::{PostValidator, MAX_CONTENT_CHARS};
