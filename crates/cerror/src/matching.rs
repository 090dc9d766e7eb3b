//! Template matching for any error.
//!
//! A [`CError`] matches on its template. Any other error has no template,
//! so it matches only when its rendered message equals the candidate
//! template exactly. A template with placeholders therefore never matches
//! an external error unless the message carries the placeholder text
//! verbatim.
//!
//! ```
//! use cerror::{cerr, is, contains};
//! use std::error::Error;
//!
//! const NOT_FOUND: &str = "user %v not found";
//!
//! let err = cerr!(NOT_FOUND, 42);
//! assert!(is(Some(&err), NOT_FOUND));
//!
//! let io = std::io::Error::other("connection reset");
//! assert!(is(Some(&io), "connection reset"));
//! assert!(!contains(None::<&(dyn Error + 'static)>, NOT_FOUND));
//! ```

use core::fmt::{self, Write};
use std::error::Error;

use crate::error::CError;

/// True if `err`'s own template (or, for external errors, its message) is
/// exactly `template`. An absent error matches nothing.
pub fn is(err: Option<&(dyn Error + 'static)>, template: &str) -> bool {
    match err {
        None => false,
        Some(err) => match err.downcast_ref::<CError>() {
            Some(chain) => chain.is(template),
            None => message_matches(err, template),
        },
    }
}

/// True if `template` matches `err` or any `CError` cause below it. An
/// external error is a leaf: only its own message is compared.
pub fn contains(err: Option<&(dyn Error + 'static)>, template: &str) -> bool {
    match err {
        None => false,
        Some(err) => match err.downcast_ref::<CError>() {
            Some(chain) => chain.contains(template),
            None => message_matches(err, template),
        },
    }
}

/// Compares `err`'s Display output against `expected` without allocating.
fn message_matches(err: &dyn Error, expected: &str) -> bool {
    let mut probe = Prefix { rest: expected };
    write!(probe, "{}", err).is_ok() && probe.rest.is_empty()
}

/// A writer that fails as soon as the output stops matching.
struct Prefix<'a> {
    rest: &'a str,
}

impl Write for Prefix<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.rest.strip_prefix(s) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(fmt::Error),
        }
    }
}
