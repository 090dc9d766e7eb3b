/// Construct a root `CError` from a template and its arguments.
///
/// # Argument forms
///
/// ```ignore
/// cerr!(TEMPLATE)                     // no arguments
/// cerr!(TEMPLATE, field)              // Display: Value::display(field)
/// cerr!(TEMPLATE, field, ?request)    // Debug:   Value::debug(request)
/// cerr!(TEMPLATE, @prebuilt_value)    // a Value, passed as is
/// ```
///
/// Leading arguments fill the template's placeholders in order; every
/// argument is kept as a debug value.
///
/// ```
/// use cerror::cerr;
///
/// #[derive(Debug)]
/// struct Request { id: u32 }
///
/// const INVALID_FIELD: &str = "invalid value for field %v";
///
/// let err = cerr!(INVALID_FIELD, "userId", ?Request { id: 7 });
/// assert_eq!(err.to_string(), "invalid value for field userId");
/// assert_eq!(err.debug().len(), 2);
/// ```
#[macro_export]
macro_rules! cerr {
    ($template:expr $(,)?) => {
        $crate::CError::new($template, ::std::vec::Vec::new())
    };
    ($template:expr, $($args:tt)+) => {
        $crate::CError::new($template, $crate::__values!(@acc [] $($args)+))
    };
}

/// Wrap `cause` in a new `CError`. Takes the same argument forms as
/// [`cerr!`].
///
/// ```
/// use cerror::{cerr, wrap_err};
///
/// const MALFORMED_BODY: &str = "malformed request body";
/// const BAD_REQUEST: &str = "bad request for URL %v";
///
/// let e2 = wrap_err!(std::io::Error::other("unexpected end of file"), MALFORMED_BODY);
/// let e3 = wrap_err!(e2, BAD_REQUEST, "/users");
/// assert_eq!(
///     e3.to_string(),
///     "bad request for URL /users: malformed request body: unexpected end of file"
/// );
/// assert!(e3.contains(MALFORMED_BODY));
/// ```
#[macro_export]
macro_rules! wrap_err {
    ($cause:expr, $template:expr $(,)?) => {
        $crate::CError::wrap($cause, $template, ::std::vec::Vec::new())
    };
    ($cause:expr, $template:expr, $($args:tt)+) => {
        $crate::CError::wrap($cause, $template, $crate::__values!(@acc [] $($args)+))
    };
}

/// Return early with a `cerr!` error if a condition is false.
///
/// ```ignore
/// ensure!(user_id > 0, INVALID_FIELD, "userId", ?request);
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($rest:tt)+) => {
        if !$cond {
            return ::core::result::Result::Err(::core::convert::From::from(
                $crate::cerr!($($rest)+),
            ));
        }
    };
}

/// Return early with a `cerr!` error.
///
/// ```ignore
/// bail!(UNKNOWN_ROUTE, path);
/// ```
#[macro_export]
macro_rules! bail {
    ($($rest:tt)+) => {
        return ::core::result::Result::Err(::core::convert::From::from(
            $crate::cerr!($($rest)+),
        ))
    };
}

/// Internal helper for the constructor macros: turns an argument list into
/// a `Vec<Value>`.
#[doc(hidden)]
#[macro_export]
macro_rules! __values {
    // Terminal: everything consumed.
    (@acc [$($out:expr),*]) => {
        ::std::vec![$($out),*]
    };

    // ?expr: rendered with Debug
    (@acc [$($out:expr),*] ? $value:expr $(, $($rest:tt)*)?) => {
        $crate::__values!(@acc [$($out,)* $crate::Value::debug($value)] $($($rest)*)?)
    };

    // @expr: already a Value
    (@acc [$($out:expr),*] @ $value:expr $(, $($rest:tt)*)?) => {
        $crate::__values!(@acc [$($out,)* $value] $($($rest)*)?)
    };

    // expr: rendered with Display
    (@acc [$($out:expr),*] $value:expr $(, $($rest:tt)*)?) => {
        $crate::__values!(@acc [$($out,)* $crate::Value::display($value)] $($($rest)*)?)
    };
}
