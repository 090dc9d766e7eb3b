//! Call-stack snapshots.
//!
//! A [`Stack`] is captured once per chain origin and shared by every error
//! that wraps it. Capture goes through the [`Capture`] capability so that
//! callers (and tests) can swap the platform stack walk for anything that
//! returns an ordered list of [`Frame`]s.
//!
//! ```text
//! CError::new / wrap(external)
//!       │  #[track_caller] origin
//!       ▼
//! stack::capturer().capture(origin) ─▶ Vec<Frame> ─▶ Stack (Arc<[Frame]>)
//!                                                       │
//! CError::wrap(CError) ── clones the Arc ◀──────────────┘
//! ```
//!
//! The default capturer walks the real stack with the `backtrace` crate
//! (feature `backtrace`, on by default) up to `Config::max_frames` frames.
//! Without the feature, or with `CERROR_STACK=0`, a stack holds the single
//! frame of the constructing call.

use core::fmt;
use core::panic::Location;
use std::sync::{Arc, OnceLock};

use crate::config::{self, Config, InstallError};

/// One frame of a captured stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    /// Demangled function path, when the symbol resolved.
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    /// A frame naming only a function.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            file: None,
            line: None,
        }
    }

    /// Attach a source position.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// A frame for a `#[track_caller]` location. The function is unknown.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            function: None,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function.as_deref().unwrap_or("<unknown>"))?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " at {}:{}", file, line),
            (Some(file), None) => write!(f, " at {}", file),
            _ => Ok(()),
        }
    }
}

/// An ordered frame sequence, innermost call first. Cheap to clone.
#[derive(Clone)]
pub struct Stack {
    frames: Arc<[Frame]>,
}

impl Stack {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames: Arc::from(frames) }
    }

    /// A stack with no frames.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// True if both stacks came from the same capture.
    #[inline]
    pub fn ptr_eq(a: &Stack, b: &Stack) -> bool {
        Arc::ptr_eq(&a.frames, &b.frames)
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Stack {
    fn eq(&self, other: &Self) -> bool {
        self.frames == other.frames
    }
}

impl Eq for Stack {}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Frame;
    type IntoIter = core::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{:>4}: {}", i, frame)?;
        }
        Ok(())
    }
}

// ── Capture ───────────────────────────────────────────────────────

/// Produces the frames of the current call stack.
///
/// `origin` is the `#[track_caller]` location of the constructing call.
/// Implemented for plain closures, so a fake capturer is one line:
///
/// ```
/// use cerror::{CError, Frame};
///
/// let fake = |_: &'static core::panic::Location<'static>| vec![Frame::new("handler")];
/// let err = CError::new_in(&fake, "boom", vec![]);
/// assert_eq!(err.stack().frames(), &[Frame::new("handler")]);
/// ```
pub trait Capture: Send + Sync {
    fn capture(&self, origin: &'static Location<'static>) -> Vec<Frame>;
}

impl<F> Capture for F
where
    F: Fn(&'static Location<'static>) -> Vec<Frame> + Send + Sync,
{
    fn capture(&self, origin: &'static Location<'static>) -> Vec<Frame> {
        self(origin)
    }
}

/// Records only the constructing call's location. No stack walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationCapture;

impl Capture for LocationCapture {
    fn capture(&self, origin: &'static Location<'static>) -> Vec<Frame> {
        vec![Frame::from_location(origin)]
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "backtrace")] {
        /// Walks the real call stack with the `backtrace` crate.
        ///
        /// Frames belonging to this crate and to the walker itself are
        /// dropped from the top, so the first frame is the caller's. If no
        /// symbol resolves (stripped binaries), the origin location stands in.
        #[derive(Debug, Clone, Copy)]
        pub struct BacktraceCapture {
            max_frames: usize,
        }

        impl BacktraceCapture {
            pub fn new(max_frames: usize) -> Self {
                Self { max_frames: max_frames.max(1) }
            }
        }

        impl Capture for BacktraceCapture {
            fn capture(&self, origin: &'static Location<'static>) -> Vec<Frame> {
                let mut frames = Vec::new();
                let mut prologue = true;

                backtrace::trace(|raw| {
                    backtrace::resolve_frame(raw, |symbol| {
                        let function = symbol.name().map(|name| format!("{:#}", name));
                        if prologue && function.as_deref().is_some_and(is_internal) {
                            return;
                        }
                        prologue = false;
                        frames.push(Frame {
                            function,
                            file: symbol.filename().map(|p| p.display().to_string()),
                            line: symbol.lineno(),
                        });
                    });
                    frames.len() < self.max_frames
                });

                // One raw frame can resolve to several inlined symbols.
                frames.truncate(self.max_frames);
                if frames.is_empty() {
                    frames.push(Frame::from_location(origin));
                }
                frames
            }
        }

        fn is_internal(name: &str) -> bool {
            let path = name.trim_start_matches('<');
            path.starts_with("backtrace::")
                || path.starts_with("cerror::")
                || name.contains(" as cerror::")
        }

        fn default_capturer(config: &Config) -> Box<dyn Capture> {
            if config.capture_stack {
                Box::new(BacktraceCapture::new(config.max_frames))
            } else {
                Box::new(LocationCapture)
            }
        }
    } else {
        fn default_capturer(_config: &Config) -> Box<dyn Capture> {
            Box::new(LocationCapture)
        }
    }
}

static CAPTURER: OnceLock<Box<dyn Capture>> = OnceLock::new();

/// Replace the default capturer for the rest of the process.
///
/// Must run before the first error is constructed.
pub fn install<C: Capture + 'static>(capturer: C) -> Result<(), InstallError> {
    CAPTURER
        .set(Box::new(capturer))
        .map_err(|_| InstallError::CapturerInstalled)
}

/// The process-wide capturer, chosen from [`config::get`] on first use.
pub fn capturer() -> &'static dyn Capture {
    CAPTURER
        .get_or_init(|| default_capturer(config::get()))
        .as_ref()
}

#[inline]
pub(crate) fn capture_with(capturer: &dyn Capture, origin: &'static Location<'static>) -> Stack {
    Stack::new(capturer.capture(origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_display() {
        assert_eq!(Frame::new("app::handler").to_string(), "app::handler");
        assert_eq!(
            Frame::new("app::handler").at("src/app.rs", 12).to_string(),
            "app::handler at src/app.rs:12"
        );
        let loc = Frame {
            function: None,
            file: Some("src/main.rs".into()),
            line: Some(3),
        };
        assert_eq!(loc.to_string(), "<unknown> at src/main.rs:3");
    }

    #[test]
    fn stack_display_numbers_frames() {
        let stack = Stack::new(vec![Frame::new("inner"), Frame::new("outer")]);
        assert_eq!(stack.to_string(), "   0: inner\n   1: outer");
        assert_eq!(stack.len(), 2);
        assert!(!stack.is_empty());
        assert!(Stack::default().is_empty());
    }

    #[test]
    fn clones_share_frames() {
        let a = Stack::new(vec![Frame::new("f")]);
        let b = a.clone();
        assert!(Stack::ptr_eq(&a, &b));

        let c = Stack::new(vec![Frame::new("f")]);
        assert_eq!(a, c);
        assert!(!Stack::ptr_eq(&a, &c));
    }

    #[test]
    fn location_capture_uses_origin() {
        let origin = Location::caller();
        let frames = LocationCapture.capture(origin);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].file.as_deref(), Some(file!()));
        assert_eq!(frames[0].line, Some(origin.line()));
    }

    #[test]
    fn closure_capture() {
        let fake = |_: &'static Location<'static>| vec![Frame::new("a"), Frame::new("b")];
        let stack = capture_with(&fake, Location::caller());
        let names: Vec<_> = stack.iter().filter_map(|f| f.function.as_deref()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn backtrace_capture_is_bounded() {
        let frames = BacktraceCapture::new(4).capture(Location::caller());
        assert!(!frames.is_empty());
        assert!(frames.len() <= 4);
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn internal_frames_are_recognized() {
        assert!(is_internal("cerror::error::CError::new"));
        assert!(is_internal("backtrace::backtrace::trace"));
        assert!(is_internal("<cerror::stack::LocationCapture as cerror::stack::Capture>::capture"));
        assert!(is_internal("<F as cerror::stack::Capture>::capture"));
        assert!(!is_internal("app::main"));
        assert!(!is_internal("<app::Handler as core::ops::Drop>::drop"));
    }
}
