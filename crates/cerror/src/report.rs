//! Reporting views of a [`CError`].
//!
//! The library leaves presentation policy to callers; a [`Report`] only
//! bundles the three things a report usually needs (message, debug values,
//! stack) in a few ready-made shapes:
//!
//! - `{}` prints the chain message, exactly as the error itself does.
//! - `{:#}` adds the aggregated debug values and the stack, one per line.
//! - [`Report::emit`] sends one structured `tracing` event.
//! - [`Report::to_json`] (feature `serde`) builds a JSON document.
//!
//! ```
//! use cerror::cerr;
//!
//! let err = cerr!("invalid value for field %v", "userId", ?(7, "ann"));
//! let full = format!("{:#}", err.report());
//! assert!(full.starts_with("invalid value for field userId\ndebug:\n"));
//! assert!(full.contains("(7, \"ann\")"));
//! ```

use core::fmt;

use tracing::Level;

use crate::error::CError;
use crate::stack::Frame;
use crate::value::Value;

/// A reporting view borrowed from a [`CError`]. See the module docs.
#[derive(Clone, Copy)]
pub struct Report<'a> {
    error: &'a CError,
}

impl<'a> Report<'a> {
    pub fn new(error: &'a CError) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &'a CError {
        self.error
    }

    /// Debug values of the whole chain, outer level first.
    pub fn values(&self) -> Vec<Value> {
        self.error.debug()
    }

    /// Templates of every `CError` level, outer first.
    pub fn templates(&self) -> Vec<&'a str> {
        self.error.chain().map(CError::template).collect()
    }

    /// The first frame of the chain's stack.
    pub fn origin(&self) -> Option<&'a Frame> {
        self.error.stack().frames().first()
    }

    /// Emit one `tracing` event at `level` carrying the message, template,
    /// debug values and origin frame as fields.
    pub fn emit(&self, level: Level) {
        let error = self.error;
        let values = self.values();
        let origin = self
            .origin()
            .map(ToString::to_string)
            .unwrap_or_default();

        macro_rules! emit_at {
            ($lvl:expr) => {
                tracing::event!(
                    $lvl,
                    template = error.template(),
                    debug = ?values,
                    origin = %origin,
                    "{}",
                    error
                )
            };
        }

        match level {
            Level::ERROR => emit_at!(Level::ERROR),
            Level::WARN => emit_at!(Level::WARN),
            Level::INFO => emit_at!(Level::INFO),
            Level::DEBUG => emit_at!(Level::DEBUG),
            _ => emit_at!(Level::TRACE),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.error, f)?;
        if !f.alternate() {
            return Ok(());
        }

        let values = self.values();
        if !values.is_empty() {
            f.write_str("\ndebug:")?;
            for (i, value) in values.iter().enumerate() {
                write!(f, "\n{:>4}: {:?}", i, value)?;
            }
        }

        let stack = self.error.stack();
        if !stack.is_empty() {
            write!(f, "\nstack:\n{}", stack)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("message", &format_args!("{}", self.error))
            .field("templates", &self.templates())
            .field("debug", &self.values())
            .field("stack", self.error.stack())
            .finish()
    }
}

#[cfg(feature = "serde")]
mod json {
    use serde::Serialize;

    use super::Report;
    use crate::stack::Frame;

    /// Serializable fields of a [`Report`].
    #[derive(Debug, Serialize)]
    pub struct ReportFields<'a> {
        pub message: String,
        pub templates: Vec<&'a str>,
        pub debug: Vec<String>,
        pub location: String,
        pub stack: &'a [Frame],
    }

    impl<'a> Report<'a> {
        /// The report as serializable fields. Debug values are rendered
        /// with `Debug`.
        pub fn fields(&self) -> ReportFields<'a> {
            let error = self.error();
            let loc = error.location();
            ReportFields {
                message: error.to_string(),
                templates: self.templates(),
                debug: self.values().iter().map(|v| format!("{:?}", v)).collect(),
                location: format!("{}:{}", loc.file(), loc.line()),
                stack: error.stack().frames(),
            }
        }

        /// The report as a JSON value.
        pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
            serde_json::to_value(self.fields())
        }

        /// The report as a pretty JSON string (for logs or UI).
        pub fn to_json_pretty(&self) -> serde_json::Result<String> {
            serde_json::to_string_pretty(&self.fields())
        }
    }
}

#[cfg(feature = "serde")]
pub use json::ReportFields;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Frame;
    use core::panic::Location;
    use std::io;

    fn fake(_: &'static Location<'static>) -> Vec<Frame> {
        vec![
            Frame::new("app::parse").at("src/parse.rs", 41),
            Frame::new("app::main").at("src/main.rs", 9),
        ]
    }

    fn sample() -> CError {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of file");
        let e2 = CError::wrap_in(&fake, eof, "malformed request body", vec![]);
        CError::wrap_in(
            &fake,
            e2,
            "bad request for URL %v",
            vec![Value::display("/users"), Value::debug(("GET", 1))],
        )
    }

    #[test]
    fn plain_display_is_the_message() {
        let e = sample();
        assert_eq!(e.report().to_string(), e.to_string());
    }

    #[test]
    fn alternate_display_adds_debug_and_stack() {
        let e = sample();
        let full = format!("{:#}", e.report());
        let expected = "\
bad request for URL /users: malformed request body: unexpected end of file
debug:
   0: \"/users\"
   1: (\"GET\", 1)
stack:
   0: app::parse at src/parse.rs:41
   1: app::main at src/main.rs:9";
        assert_eq!(full, expected);
    }

    #[test]
    fn alternate_display_skips_empty_sections() {
        let e = CError::new_in(&|_: &'static Location<'static>| Vec::<Frame>::new(), "bare", vec![]);
        assert_eq!(format!("{:#}", e.report()), "bare");
    }

    #[test]
    fn templates_and_origin() {
        let e = sample();
        let r = e.report();
        assert_eq!(r.templates(), ["bad request for URL %v", "malformed request body"]);
        assert_eq!(r.origin(), Some(&Frame::new("app::parse").at("src/parse.rs", 41)));
    }

    #[test]
    fn emit_without_subscriber_is_silent() {
        let e = sample();
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            e.report().emit(level);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fields() {
        let e = sample();
        let value = e.report().to_json().expect("serializable");
        assert_eq!(
            value["message"],
            "bad request for URL /users: malformed request body: unexpected end of file"
        );
        assert_eq!(value["templates"][1], "malformed request body");
        assert_eq!(value["debug"][0], "\"/users\"");
        assert_eq!(value["stack"][0]["function"], "app::parse");
        assert_eq!(value["stack"][1]["line"], 9);

        let pretty = e.report().to_json_pretty().expect("serializable");
        assert!(pretty.contains("\"templates\""));
    }
}
