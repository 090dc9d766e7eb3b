//! Type-erased constructor arguments.
//!
//! Every argument given to a constructor is kept as a [`Value`]: the leading
//! ones fill the template's placeholders, and all of them travel with the
//! error as debug values. A `Value` remembers how it should render:
//!
//! - [`Value::display`] renders through `Display` (strings, numbers, ids).
//! - [`Value::debug`] renders through `Debug`, for payloads such as request
//!   structs that have no user-facing form.
//!
//! The original value stays reachable through [`Value::downcast_ref`].

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use crate::template::Verb;

/// A constructor argument. Cheap to clone: the wrapped value is shared.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Payload>,
}

trait Payload: Send + Sync {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn inspect(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
}

struct Shown<T>(T);

struct Inspected<T>(T);

impl<T> Payload for Shown<T>
where
    T: fmt::Display + fmt::Debug + Send + Sync + 'static,
{
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }

    fn inspect(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

impl<T> Payload for Inspected<T>
where
    T: fmt::Debug + Send + Sync + 'static,
{
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }

    fn inspect(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

impl Value {
    /// Wrap a value that renders through `Display`.
    ///
    /// ```
    /// use cerror::Value;
    /// let v = Value::display("userId");
    /// assert_eq!(v.to_string(), "userId");
    /// assert_eq!(format!("{:?}", v), "\"userId\"");
    /// ```
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self { inner: Arc::new(Shown(value)) }
    }

    /// Wrap a value that renders through `Debug`, in messages too.
    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Self { inner: Arc::new(Inspected(value)) }
    }

    /// The wrapped value, if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// True if the wrapped value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    /// True if both handles share one wrapped value.
    #[inline]
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Value {
    /// Format through `verb`. Radix and exponent verbs apply to primitive
    /// numbers; anything else falls back to the value's own rendering.
    pub(crate) fn fmt_as(&self, verb: Verb, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match verb {
            Verb::Display => self.inner.render(f),
            Verb::Debug => self.inner.inspect(f),
            _ => match write_number(self.inner.as_any(), verb, f) {
                Some(res) => res,
                None => self.inner.render(f),
            },
        }
    }
}

fn write_number(any: &dyn Any, verb: Verb, f: &mut fmt::Formatter<'_>) -> Option<fmt::Result> {
    macro_rules! integers {
        ($($t:ty),*) => {$(
            if let Some(n) = any.downcast_ref::<$t>() {
                return Some(match verb {
                    Verb::LowerHex => fmt::LowerHex::fmt(n, f),
                    Verb::UpperHex => fmt::UpperHex::fmt(n, f),
                    Verb::Octal => fmt::Octal::fmt(n, f),
                    Verb::Binary => fmt::Binary::fmt(n, f),
                    Verb::LowerExp => fmt::LowerExp::fmt(n, f),
                    Verb::UpperExp => fmt::UpperExp::fmt(n, f),
                    Verb::Display | Verb::Debug => fmt::Display::fmt(n, f),
                });
            }
        )*};
    }

    macro_rules! floats {
        ($($t:ty),*) => {$(
            if let Some(n) = any.downcast_ref::<$t>() {
                return match verb {
                    Verb::LowerExp => Some(fmt::LowerExp::fmt(n, f)),
                    Verb::UpperExp => Some(fmt::UpperExp::fmt(n, f)),
                    _ => None,
                };
            }
        )*};
    }

    integers!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
    floats!(f32, f64);
    None
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.render(f)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.inspect(f)
    }
}
