//! Utility functions for string sanitizing and value coercion.

pub mod format;

pub use format::{coerce_number, sanitize_field, sanitize_text, truncate_string};
