//! # cerror — Chained Error
//!
//! Errors built from a constant message template plus arguments, wrapped
//! into chains that render outer to inner, with one call stack shared by
//! the whole chain.
//!
//! ## Design
//!
//! A [`CError`] level holds:
//!
//! - a **template** (`"bad request for URL %v"`), the error's identity:
//!   matching compares templates, never rendered text;
//! - **arguments**, kept as [`Value`]s: the leading ones fill the
//!   template's placeholders and all of them travel as debug values;
//! - an optional **cause**, either another `CError` (the chain continues)
//!   or any external `std::error::Error` (an opaque leaf);
//! - the **stack** captured where the chain originated. Wrapping a
//!   `CError` shares its stack; wrapping an external error captures one.
//!
//! ```text
//!   e3  "bad request for URL %v" [url, r] ─┐
//!   e2  "malformed request body"   []     ─┤ one Stack (Arc)
//!   io  "unexpected end of file"  (opaque) │ captured at e2
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cerror::{cerr, wrap_err, CResult, ResultExt};
//!
//! // Templates are plain constants; they double as the error's identity.
//! const MALFORMED_BODY: &str = "malformed request body";
//! const BAD_REQUEST: &str = "bad request for URL %v";
//!
//! #[derive(Debug)]
//! struct Request { method: &'static str }
//!
//! fn parse(body: &str) -> CResult<u32> {
//!     body.parse::<u32>().wrap_err(MALFORMED_BODY)
//! }
//!
//! fn handle(url: &str, body: &str) -> CResult<u32> {
//!     let req = Request { method: "POST" };
//!     parse(body).map_err(|e| wrap_err!(e, BAD_REQUEST, url.to_string(), ?req))
//! }
//!
//! let err = handle("/users", "").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "bad request for URL /users: malformed request body: cannot parse integer from empty string"
//! );
//! assert!(err.is(BAD_REQUEST));
//! assert!(err.contains(MALFORMED_BODY));
//! assert_eq!(err.debug().len(), 2);
//! assert!(!err.stack().is_empty());
//!
//! let root = cerr!("invalid value for field %v", "userId");
//! assert_eq!(root.to_string(), "invalid value for field userId");
//! ```
//!
//! ## Configuration
//!
//! | Variable             | Default | Effect |
//! |----------------------|---------|--------|
//! | `CERROR_STACK`       | `true`  | Walk the real stack; when off, record only the constructing call |
//! | `CERROR_STACK_DEPTH` | `32`    | Maximum frames kept per stack |
//!
//! Read once on first use. [`config::init`] and [`stack::install`]
//! override them programmatically.
//!
//! ## Feature Flags
//!
//! | Flag        | Effect |
//! |-------------|--------|
//! | `backtrace` | (default) Real stack walking via the `backtrace` crate |
//! | `serde`     | `Serialize` for [`Frame`], `Report::to_json` |

#[macro_use]
mod macros;
pub mod template;
mod value;
pub mod stack;
pub mod config;
mod error;
mod matching;
mod convert;
mod report;

// ── Public API ────────────────────────────────────────────────────

pub use config::{Config, InstallError};
pub use convert::ResultExt;
pub use error::{CError, Cause, Chain};
pub use matching::{contains, is};
pub use report::Report;
pub use stack::{Capture, Frame, LocationCapture, Stack};
pub use value::Value;

#[cfg(feature = "backtrace")]
pub use stack::BacktraceCapture;

#[cfg(feature = "serde")]
pub use report::ReportFields;

/// Convenience Result alias.
pub type CResult<T> = Result<T, CError>;
