//! Process-wide capturer and configuration installation.
//!
//! Both are one-shot per process, so everything runs inside a single test.

use core::panic::Location;
use std::io;

use cerror::config::{self, Config};
use cerror::{cerr, stack, wrap_err, Frame, InstallError, Stack};

fn handler_frames(origin: &'static Location<'static>) -> Vec<Frame> {
    vec![
        Frame::new("svc::handler").at(origin.file(), origin.line()),
        Frame::new("svc::main").at("src/main.rs", 1),
    ]
}

#[test]
fn install_once_then_construct() {
    let cfg = Config::default().max_frames(4).capture_stack(false);
    assert_eq!(config::init(cfg), Ok(()));
    assert_eq!(
        config::init(Config::default()),
        Err(InstallError::AlreadyInitialized)
    );
    assert_eq!(*config::get(), cfg);

    assert_eq!(stack::install(handler_frames), Ok(()));
    assert_eq!(
        stack::install(stack::LocationCapture),
        Err(InstallError::CapturerInstalled)
    );

    let line = line!() + 1;
    let e1 = cerr!("invalid value for field %v", "userId");
    let frames = e1.stack().frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].function.as_deref(), Some("svc::handler"));
    assert_eq!(frames[0].line, Some(line));

    // External cause: fresh capture through the installed capturer.
    let e2 = wrap_err!(io::Error::other("unexpected end of file"), "malformed request body");
    assert_eq!(e2.stack().frames()[0].function.as_deref(), Some("svc::handler"));
    assert!(!Stack::ptr_eq(e1.stack(), e2.stack()));

    // Chain cause: no capture at all.
    let e3 = wrap_err!(e2, "bad request for URL %v", "/users");
    assert!(Stack::ptr_eq(e3.stack(), e3.root().stack()));
}
