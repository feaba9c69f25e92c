//! Attach a value to a small execution helper and run plugins against it.
//!
//! ```
//! use context_wrapper::ContextWrapper;
//! use serde_json::json;
//! use std::convert::Infallible;
//!
//! let mut w: ContextWrapper<Vec<i64>> = ContextWrapper::new(vec![1, 2, 3]);
//! let total = w
//!     .stage([json!(10)])
//!     .apply(|v, args| Ok::<_, Infallible>(v.iter().sum::<i64>() + args[0].as_i64().unwrap_or(0)))
//!     .unwrap();
//! assert_eq!(total, 16);
//! assert!(w.staged().is_empty());
//! ```

pub mod errors;
pub mod binding;
pub mod plugins; // named plugins over JSON values
mod wrapper;

pub use binding::{bind, curry, unbind, BoxedPlugin, Positional};
pub use wrapper::ContextWrapper;

/// Convenience: wrap a JSON value.
pub fn wrap(value: serde_json::Value) -> ContextWrapper<serde_json::Value> {
    ContextWrapper::new(value)
}
