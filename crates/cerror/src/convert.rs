use std::borrow::Cow;
use std::error::Error;

use crate::{CError, CResult, Value};

// ── ResultExt — wrapping on Results ───────────────────────────────

/// Extension trait for wrapping any `Result`'s error in a `CError`.
///
/// Works for external errors and for `CError` alike; a `CError` cause keeps
/// its stack, anything else gets one captured at the call.
///
/// ```
/// use cerror::{ResultExt, Value};
///
/// const READ_CONFIG: &str = "reading config %v";
///
/// let res: Result<(), std::io::Error> = Err(std::io::Error::other("permission denied"));
/// let err = res
///     .wrap_err_with(READ_CONFIG, || vec![Value::display("app.toml")])
///     .unwrap_err();
/// assert_eq!(err.to_string(), "reading config app.toml: permission denied");
/// assert!(err.is(READ_CONFIG));
/// ```
pub trait ResultExt<T> {
    /// Wrap the error with a template that takes no arguments.
    fn wrap_err(self, template: impl Into<Cow<'static, str>>) -> CResult<T>;

    /// Wrap the error, building the arguments only on the error path.
    fn wrap_err_with<F>(self, template: impl Into<Cow<'static, str>>, args: F) -> CResult<T>
    where
        F: FnOnce() -> Vec<Value>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    #[track_caller]
    fn wrap_err(self, template: impl Into<Cow<'static, str>>) -> CResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(CError::wrap(e, template, Vec::new())),
        }
    }

    #[track_caller]
    fn wrap_err_with<F>(self, template: impl Into<Cow<'static, str>>, args: F) -> CResult<T>
    where
        F: FnOnce() -> Vec<Value>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(CError::wrap(e, template, args())),
        }
    }
}
