use core::fmt;
use core::panic::Location;
use std::borrow::Cow;
use std::error::Error;

use crate::matching;
use crate::report::Report;
use crate::stack::{self, Capture, Stack};
use crate::template;
use crate::value::Value;

/// Chain Error: a templated error value with debug values, a captured
/// stack, and an optional cause.
///
/// - The **template** identifies the error kind and is the key for
///   [`is`](CError::is) / [`contains`](CError::contains).
/// - The leading constructor **args** fill the template's placeholders;
///   all of them are kept as debug values.
/// - The **stack** is captured where the chain originates and shared by
///   every wrapper above it.
/// - The **cause** is owned; chains are built bottom-up and never mutated.
///
/// Immutable after construction, `Send + Sync`.
pub struct CError {
    inner: Box<Inner>,
}

struct Inner {
    template:     Cow<'static, str>,
    args:         Vec<Value>,
    placeholders: usize,
    cause:        Option<Cause>,
    stack:        Stack,
    location:     &'static Location<'static>,
}

/// The wrapped cause of a [`CError`].
#[derive(Debug)]
pub enum Cause {
    /// Another chain error. Its stack is the wrapper's stack.
    Chain(Box<CError>),
    /// Any other error: it renders, but has no template, debug values or
    /// stack of its own.
    External(Box<dyn Error + Send + Sync>),
}

impl Cause {
    /// Sort a boxed error into the chain or external variant.
    fn classify(err: Box<dyn Error + Send + Sync>) -> Self {
        match err.downcast::<CError>() {
            Ok(chain) => Cause::Chain(chain),
            Err(other) => Cause::External(other),
        }
    }

    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        match self {
            Cause::Chain(err) => &**err as &(dyn Error + Send + Sync + 'static),
            Cause::External(err) => &**err,
        }
    }

    /// The cause as a chain error, if it is one.
    pub fn as_chain(&self) -> Option<&CError> {
        match self {
            Cause::Chain(err) => Some(&**err),
            Cause::External(_) => None,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Chain(err) => fmt::Display::fmt(err, f),
            Cause::External(err) => fmt::Display::fmt(err, f),
        }
    }
}

// ── Constructors ──────────────────────────────────────────────────

impl CError {
    /// Create a root error, capturing the stack with the process-wide
    /// capturer.
    ///
    /// Prefer the `cerr!` macro, which builds the argument list.
    ///
    /// ```
    /// use cerror::{CError, Value};
    ///
    /// let err = CError::new("invalid value for field %v", vec![Value::display("userId")]);
    /// assert_eq!(err.to_string(), "invalid value for field userId");
    /// ```
    #[track_caller]
    pub fn new(template: impl Into<Cow<'static, str>>, args: Vec<Value>) -> Self {
        Self::new_in(stack::capturer(), template, args)
    }

    /// Create a root error, capturing the stack with `capturer`.
    #[track_caller]
    pub fn new_in(
        capturer: &dyn Capture,
        template: impl Into<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self {
        let location = Location::caller();
        let stack = stack::capture_with(capturer, location);
        Self::assemble(template.into(), args, None, stack, location)
    }

    /// Wrap `cause` in a new error.
    ///
    /// A `CError` cause lends its stack to the wrapper; any other error
    /// gets a fresh stack captured here, since this is the first point the
    /// chain can see.
    ///
    /// Prefer the `wrap_err!` macro, which builds the argument list.
    #[track_caller]
    pub fn wrap<E>(cause: E, template: impl Into<Cow<'static, str>>, args: Vec<Value>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap_boxed_in(stack::capturer(), Box::new(cause), template, args)
    }

    /// [`wrap`](CError::wrap) with an explicit capturer.
    #[track_caller]
    pub fn wrap_in<E>(
        capturer: &dyn Capture,
        cause: E,
        template: impl Into<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap_boxed_in(capturer, Box::new(cause), template, args)
    }

    /// Wrap an already boxed error. A boxed `CError` is still recognized.
    #[track_caller]
    pub fn wrap_boxed(
        cause: Box<dyn Error + Send + Sync>,
        template: impl Into<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self {
        Self::wrap_boxed_in(stack::capturer(), cause, template, args)
    }

    /// [`wrap_boxed`](CError::wrap_boxed) with an explicit capturer.
    #[track_caller]
    pub fn wrap_boxed_in(
        capturer: &dyn Capture,
        cause: Box<dyn Error + Send + Sync>,
        template: impl Into<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self {
        let location = Location::caller();
        let cause = Cause::classify(cause);
        let stack = match &cause {
            Cause::Chain(inner) => inner.stack().clone(),
            Cause::External(err) => {
                tracing::trace!(cause = %err, at = %location, "capturing stack for external cause");
                stack::capture_with(capturer, location)
            }
        };
        Self::assemble(template.into(), args, Some(cause), stack, location)
    }

    /// Wrap an error that may be absent.
    ///
    /// # Panics
    ///
    /// Panics on `None`: a wrap without a cause is a bug at the call site,
    /// use [`new`](CError::new) for root errors.
    #[track_caller]
    pub fn wrap_opt<E>(
        cause: Option<E>,
        template: impl Into<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        match cause {
            Some(cause) => Self::wrap(cause, template, args),
            None => {
                let template: Cow<'static, str> = template.into();
                panic!("CError::wrap_opt called without a cause (template {:?})", template)
            }
        }
    }

    fn assemble(
        template: Cow<'static, str>,
        args: Vec<Value>,
        cause: Option<Cause>,
        stack: Stack,
        location: &'static Location<'static>,
    ) -> Self {
        let placeholders = template::placeholder_count(&template);
        Self {
            inner: Box::new(Inner {
                template,
                args,
                placeholders,
                cause,
                stack,
                location,
            }),
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────────

impl CError {
    /// The template this error was built from.
    #[inline]
    pub fn template(&self) -> &str {
        &self.inner.template
    }

    /// Number of placeholders found in the template.
    #[inline]
    pub fn placeholders(&self) -> usize {
        self.inner.placeholders
    }

    /// This level's rendered message, without the cause.
    pub fn message(&self) -> String {
        template::render(&self.inner.template, self.render_args())
    }

    /// The arguments consumed by the template's placeholders.
    #[inline]
    pub fn render_args(&self) -> &[Value] {
        let n = self.inner.placeholders.min(self.inner.args.len());
        &self.inner.args[..n]
    }

    /// This level's debug values: every constructor argument, in order.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.inner.args
    }

    /// Debug values of the whole chain, outer level first.
    ///
    /// External causes contribute nothing.
    pub fn debug(&self) -> Vec<Value> {
        self.chain()
            .flat_map(|level| level.values().iter().cloned())
            .collect()
    }

    /// The stack captured where this chain originated.
    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.inner.stack
    }

    /// Where this level was constructed.
    #[inline]
    pub fn location(&self) -> &'static Location<'static> {
        self.inner.location
    }

    /// The wrapped cause, if any.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.inner.cause.as_ref()
    }

    /// The wrapped cause, when it is itself a `CError`.
    #[inline]
    pub fn cause_error(&self) -> Option<&CError> {
        self.inner.cause.as_ref().and_then(Cause::as_chain)
    }

    /// Iterate the `CError` levels of the chain, starting with `self`.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// The innermost `CError` of the chain.
    pub fn root(&self) -> &CError {
        let mut level = self;
        while let Some(next) = level.cause_error() {
            level = next;
        }
        level
    }

    /// A reporting view of this error.
    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

// ── Matching ──────────────────────────────────────────────────────

impl CError {
    /// True if this level's template is exactly `template`. Causes are not
    /// inspected.
    #[inline]
    pub fn is(&self, template: &str) -> bool {
        self.template() == template
    }

    /// True if `template` matches this level or any cause below it.
    ///
    /// An external cause matches when its message equals `template`.
    pub fn contains(&self, template: &str) -> bool {
        if self.is(template) {
            return true;
        }
        match &self.inner.cause {
            Some(cause) => {
                matching::contains(Some(cause.as_error() as &(dyn Error + 'static)), template)
            }
            None => false,
        }
    }
}

/// Iterator over the `CError` levels of a chain. See [`CError::chain`].
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a CError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a CError;

    fn next(&mut self) -> Option<&'a CError> {
        let current = self.next?;
        self.next = current.cause_error();
        Some(current)
    }
}

// ── std::error::Error ─────────────────────────────────────────────

impl Error for CError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner
            .cause
            .as_ref()
            .map(|c| c.as_error() as &(dyn Error + 'static))
    }
}

// ── Display ───────────────────────────────────────────────────────

impl fmt::Display for CError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        template::write_rendered(f, &self.inner.template, self.render_args())?;
        if let Some(cause) = &self.inner.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

// ── Debug ─────────────────────────────────────────────────────────

impl fmt::Debug for CError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CError");
        d.field("template", &self.template());
        d.field("message", &self.message());

        if !self.values().is_empty() {
            d.field("values", &self.values());
        }

        let loc = self.location();
        d.field("location", &format_args!("{}:{}", loc.file(), loc.line()));

        if let Some(cause) = &self.inner.cause {
            d.field("cause", cause);
        }

        if !self.stack().is_empty() {
            d.field("stack", &format_args!("<{} frames>", self.stack().len()));
        }

        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Frame;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INVALID_FIELD: &str = "invalid value for field %v";
    const MALFORMED_BODY: &str = "malformed request body";
    const BAD_REQUEST: &str = "bad request for URL %v";

    #[derive(Debug, PartialEq)]
    struct Request {
        id: u32,
    }

    fn fake(_: &'static Location<'static>) -> Vec<Frame> {
        vec![Frame::new("handler").at("src/handler.rs", 10)]
    }

    fn eof() -> io::Error {
        io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of file")
    }

    fn rendered(values: &[Value]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn root_renders_and_keeps_all_args() {
        let e1 = CError::new_in(
            &fake,
            INVALID_FIELD,
            vec![Value::display("userId"), Value::debug(Request { id: 7 })],
        );
        assert_eq!(e1.to_string(), "invalid value for field userId");
        assert_eq!(e1.placeholders(), 1);
        assert_eq!(e1.render_args().len(), 1);

        let debug = e1.debug();
        assert_eq!(debug.len(), 2);
        assert_eq!(debug[0].downcast_ref::<&str>(), Some(&"userId"));
        assert_eq!(debug[1].downcast_ref::<Request>(), Some(&Request { id: 7 }));
        assert!(e1.cause().is_none());
    }

    #[test]
    fn wrap_external_appends_native_message() {
        let e2 = CError::wrap_in(&fake, eof(), MALFORMED_BODY, vec![]);
        assert_eq!(e2.to_string(), "malformed request body: unexpected end of file");
        assert!(e2.debug().is_empty());
        assert!(e2.cause_error().is_none());
        assert!(matches!(e2.cause(), Some(Cause::External(_))));
    }

    #[test]
    fn wrap_chain_scenario() {
        let e2 = CError::wrap_in(&fake, eof(), MALFORMED_BODY, vec![]);
        let e3 = CError::wrap_in(
            &fake,
            e2,
            BAD_REQUEST,
            vec![Value::display("/users/7"), Value::debug(Request { id: 7 })],
        );

        assert_eq!(
            e3.to_string(),
            "bad request for URL /users/7: malformed request body: unexpected end of file"
        );
        assert!(e3.is(BAD_REQUEST));
        assert!(!e3.is(MALFORMED_BODY));
        assert!(e3.contains(MALFORMED_BODY));
        assert!(e3.contains("unexpected end of file"));
        assert!(!e3.contains(INVALID_FIELD));
        assert_eq!(rendered(&e3.debug()), ["/users/7", "Request { id: 7 }"]);
    }

    #[test]
    fn debug_aggregates_outer_to_inner() {
        let root = CError::new_in(&fake, "a %v", vec![Value::display(1), Value::display(2)]);
        let mid = CError::wrap_in(&fake, root, "b", vec![Value::display(3)]);
        let top = CError::wrap_in(&fake, mid, "c %v %v", vec![Value::display(4), Value::display(5)]);
        assert_eq!(rendered(&top.debug()), ["4", "5", "3", "1", "2"]);
        assert_eq!(top.to_string(), "c 4 5: b: a 1");
    }

    #[test]
    fn wrapping_a_chain_error_shares_its_stack() {
        let calls = AtomicUsize::new(0);
        let counting = |_: &'static Location<'static>| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![Frame::new(format!("capture-{}", calls.load(Ordering::SeqCst)))]
        };

        let root = CError::new_in(&counting, "root", vec![]);
        let root_stack = root.stack().clone();
        let mid = CError::wrap_in(&counting, root, "mid", vec![]);
        let top = CError::wrap_in(&counting, mid, "top", vec![]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Stack::ptr_eq(top.stack(), &root_stack));
        assert!(Stack::ptr_eq(top.stack(), top.root().stack()));
    }

    #[test]
    fn wrapping_an_external_error_captures_fresh() {
        let calls = AtomicUsize::new(0);
        let counting = |_: &'static Location<'static>| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![Frame::new("origin")]
        };

        let e2 = CError::wrap_in(&counting, eof(), MALFORMED_BODY, vec![]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(e2.stack().frames(), &[Frame::new("origin")]);
    }

    #[test]
    fn boxed_chain_error_is_recognized() {
        let root = CError::new_in(&fake, "root", vec![Value::display("x")]);
        let boxed: Box<dyn Error + Send + Sync> = Box::new(root);
        let top = CError::wrap_boxed_in(&fake, boxed, "top", vec![]);
        assert!(top.cause_error().is_some());
        assert_eq!(rendered(&top.debug()), ["x"]);
    }

    #[test]
    fn chain_and_root() {
        let root = CError::new_in(&fake, "root", vec![]);
        let mid = CError::wrap_in(&fake, root, "mid", vec![]);
        let top = CError::wrap_in(&fake, mid, "top", vec![]);

        let templates: Vec<_> = top.chain().map(CError::template).collect();
        assert_eq!(templates, ["top", "mid", "root"]);
        assert_eq!(top.root().template(), "root");
    }

    #[test]
    fn chain_stops_at_external_cause() {
        let e2 = CError::wrap_in(&fake, eof(), MALFORMED_BODY, vec![]);
        assert_eq!(e2.chain().count(), 1);
        assert!(std::ptr::eq(e2.root(), &e2));
    }

    #[test]
    fn source_walks_both_variants() {
        let e2 = CError::wrap_in(&fake, eof(), MALFORMED_BODY, vec![]);
        let e3 = CError::wrap_in(&fake, e2, "outer", vec![]);

        let mid = e3.source().expect("chain cause");
        assert_eq!(mid.to_string(), "malformed request body: unexpected end of file");
        let leaf = mid.source().expect("external cause");
        assert_eq!(leaf.to_string(), "unexpected end of file");
        assert!(leaf.source().is_none());
    }

    #[test]
    fn message_excludes_cause() {
        let e2 = CError::wrap_in(&fake, eof(), MALFORMED_BODY, vec![]);
        assert_eq!(e2.message(), MALFORMED_BODY);
    }

    #[test]
    fn missing_args_render_placeholder() {
        let e = CError::new_in(&fake, "expected %v, got %v", vec![Value::display(3)]);
        assert_eq!(e.to_string(), "expected 3, got %v");
        assert_eq!(e.render_args().len(), 1);
    }

    #[test]
    fn rendering_is_repeatable() {
        let e = CError::new_in(&fake, "user %v", vec![Value::display("ann")]);
        assert_eq!(e.to_string(), e.to_string());
    }

    #[test]
    fn location_points_at_caller() {
        let line = line!() + 1;
        let e = CError::new_in(&fake, "here", vec![]);
        assert_eq!(e.location().line(), line);
        assert_eq!(e.location().file(), file!());
    }

    #[test]
    #[should_panic(expected = "without a cause")]
    fn wrap_opt_none_panics() {
        let _ = CError::wrap_opt(None::<io::Error>, MALFORMED_BODY, vec![]);
    }

    #[test]
    fn wrap_opt_some_wraps() {
        let e = CError::wrap_opt(Some(eof()), MALFORMED_BODY, vec![]);
        assert!(e.contains("unexpected end of file"));
    }

    #[test]
    fn debug_format_lists_fields() {
        let e = CError::new_in(&fake, INVALID_FIELD, vec![Value::display("userId")]);
        let s = format!("{:?}", e);
        assert!(s.contains("template: \"invalid value for field %v\""), "{}", s);
        assert!(s.contains("values: [\"userId\"]"), "{}", s);
        assert!(s.contains("<1 frames>"), "{}", s);
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<CError>();
    }
}
