//! Request-handling example
//!
//! Runs a few requests through a handler that routes, decodes a body and
//! validates it, then reports each failure as a message, a structured
//! `tracing` event, and a full report with debug values and stack.
//!
//! # Environment Variables
//!
//! - `RUST_LOG=debug` - log filter (error, warn, info, debug, trace)
//! - `CERROR_STACK=0` - record only the constructing call instead of a full stack
//! - `CERROR_STACK_DEPTH=8` - frames kept per stack

use cerror::{bail, cerr, ensure, wrap_err, CResult, ResultExt};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;

const INVALID_FIELD: &str = "invalid value for field %v";
const MALFORMED_BODY: &str = "malformed request body";
const BAD_REQUEST: &str = "bad request for URL %v";
const UNKNOWN_ROUTE: &str = "no route for %v %v";

/// Error of the toy body decoder. Foreign to the chain, so it stays opaque.
#[derive(Debug, Error)]
enum DecodeError {
    #[error("unexpected end of file")]
    Eof,
    #[error("expected `{expected}` at offset {offset}")]
    Unexpected { expected: char, offset: usize },
}

#[derive(Debug, Clone)]
struct Request {
    method: &'static str,
    url: &'static str,
    body: &'static str,
}

#[derive(Debug)]
struct User {
    id: u32,
    name: String,
}

/// Decodes `{<id>:<name>}`.
fn decode(body: &str) -> Result<User, DecodeError> {
    let inner = body
        .strip_prefix('{')
        .ok_or(DecodeError::Unexpected { expected: '{', offset: 0 })?;
    let inner = inner.strip_suffix('}').ok_or(DecodeError::Eof)?;
    let (id, name) = inner.split_once(':').ok_or(DecodeError::Unexpected {
        expected: ':',
        offset: 1 + inner.len(),
    })?;
    let id: u32 = id
        .parse()
        .map_err(|_| DecodeError::Unexpected { expected: '0', offset: 1 })?;
    Ok(User {
        id,
        name: name.to_string(),
    })
}

fn parse_body(req: &Request) -> CResult<User> {
    let user = decode(req.body).wrap_err(MALFORMED_BODY)?;
    ensure!(user.id > 0, INVALID_FIELD, "id", ?req.clone());
    Ok(user)
}

fn handle(req: &Request) -> CResult<User> {
    if req.method != "POST" || req.url != "/users" {
        bail!(UNKNOWN_ROUTE, req.method, req.url);
    }
    parse_body(req).map_err(|e| wrap_err!(e, BAD_REQUEST, req.url, ?req.clone()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== cerror Request Example ===\n");

    let requests = [
        Request { method: "POST", url: "/users", body: "{7:ann}" },
        Request { method: "POST", url: "/users", body: "{7:ann" },
        Request { method: "POST", url: "/users", body: "{0:root}" },
        Request { method: "GET", url: "/admin", body: "" },
    ];

    for req in &requests {
        match handle(req) {
            Ok(user) => {
                tracing::info!(id = user.id, name = %user.name, "created user");
                println!("{} {} -> ok\n", req.method, req.url);
            }
            Err(err) => {
                println!("{} {} -> {}", req.method, req.url, err);

                let kind = if err.is(UNKNOWN_ROUTE) {
                    "routing"
                } else if err.contains(MALFORMED_BODY) {
                    "decoding"
                } else if err.contains(INVALID_FIELD) {
                    "validation"
                } else {
                    "other"
                };
                println!("  kind: {}", kind);

                err.report().emit(Level::WARN);
                println!("{:#}\n", err.report());
            }
        }
    }

    // Plain errors match on their message.
    let eof = DecodeError::Eof;
    println!(
        "is(DecodeError::Eof, \"unexpected end of file\") = {}",
        cerror::is(Some(&eof), "unexpected end of file")
    );

    let standalone = cerr!(INVALID_FIELD, "userId", ?(7, "ann"));
    println!("{:?}", standalone);

    println!("\n=== Example Complete ===");
}
