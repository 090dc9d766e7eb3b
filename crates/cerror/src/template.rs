//! Template scanning and positional rendering.
//!
//! A template is a message format identifying an error kind. Placeholders
//! follow the printf family:
//!
//! ```text
//! %v  %s  %d  %f ...   one ASCII letter verb, rendered with Display
//! %q  %#v  %+v         rendered with Debug
//! %x  %X  %o  %b       hex, octal, binary for integer arguments
//! %e  %E               exponent form for integer and float arguments
//! %-8.3f               flags `- 0 + #`, width, precision
//! %%                   a literal '%', not a placeholder
//! % d                  literal text: a space is not a flag ("50% off")
//! ```
//!
//! Width pads on the left (`-` pads on the right, `0` pads with zeros after
//! any sign). Precision is handed to the argument's formatting impl, so
//! `%.2f` rounds floats and `%.3s` truncates strings. `+` forces a sign on
//! numbers and `#` asks for the alternate form (`%#x` is `0xff`), except on
//! `%v` where either one selects Debug.
//!
//! Radix and exponent verbs apply to arguments holding a primitive integer
//! (or float, for `%e`); any other argument renders in its usual form.
//!
//! Anything else starting with `%` is literal text. A placeholder with no
//! argument left to fill it is written back verbatim.

use core::fmt::{self, Write};

use crate::value::Value;

/// Largest width or precision honoured; larger numbers are clamped.
const MAX_WIDTH: usize = u16::MAX as usize;

/// Which formatting trait a placeholder renders through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Display,
    Debug,
    LowerHex,
    UpperHex,
    Octal,
    Binary,
    LowerExp,
    UpperExp,
}

impl Verb {
    fn from_letter(letter: u8) -> Self {
        match letter {
            b'q' => Verb::Debug,
            b'x' => Verb::LowerHex,
            b'X' => Verb::UpperHex,
            b'o' => Verb::Octal,
            b'b' => Verb::Binary,
            b'e' => Verb::LowerExp,
            b'E' => Verb::UpperExp,
            _ => Verb::Display,
        }
    }
}

/// Parsed flags, width and precision of one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Spec {
    pub(crate) verb: Verb,
    pub(crate) left: bool,
    pub(crate) zero: bool,
    pub(crate) plus: bool,
    pub(crate) alt: bool,
    pub(crate) width: Option<usize>,
    pub(crate) precision: Option<usize>,
}

impl Spec {
    #[cfg(test)]
    fn verb(verb: Verb) -> Self {
        Self {
            verb,
            left: false,
            zero: false,
            plus: false,
            alt: false,
            width: None,
            precision: None,
        }
    }
}

/// One lexical piece of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    Literal(&'a str),
    Placeholder { text: &'a str, spec: Spec },
}

/// Iterator over the pieces of a template, left to right.
pub(crate) struct Pieces<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Pieces<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Piece<'a>> {
        let rest = &self.src[self.pos..];
        let bytes = rest.as_bytes();
        match bytes.first()? {
            b'%' => {
                if let Some((len, spec)) = scan_placeholder(bytes) {
                    self.pos += len;
                    return Some(Piece::Placeholder { text: &rest[..len], spec });
                }
                // "%%" collapses to one literal percent; a stray '%' stays as is.
                self.pos += if bytes.get(1) == Some(&b'%') { 2 } else { 1 };
                Some(Piece::Literal("%"))
            }
            _ => {
                let end = rest.find('%').unwrap_or(rest.len());
                self.pos += end;
                Some(Piece::Literal(&rest[..end]))
            }
        }
    }
}

/// Length and spec of the placeholder at the start of `bytes` (which
/// begins with `%`).
fn scan_placeholder(bytes: &[u8]) -> Option<(usize, Spec)> {
    let mut i = 1;
    let (mut left, mut zero, mut plus, mut alt) = (false, false, false, false);

    while let Some(&b) = bytes.get(i) {
        match b {
            b'-' => left = true,
            b'0' => zero = true,
            b'+' => plus = true,
            b'#' => alt = true,
            _ => break,
        }
        i += 1;
    }

    let width = scan_number(bytes, &mut i);
    let precision = if bytes.get(i) == Some(&b'.') {
        i += 1;
        // A bare '.' means precision zero, as in printf.
        Some(scan_number(bytes, &mut i).unwrap_or(0))
    } else {
        None
    };

    let letter = *bytes.get(i).filter(|b| b.is_ascii_alphabetic())?;
    let mut verb = Verb::from_letter(letter);
    if letter == b'v' && (alt || plus) {
        verb = Verb::Debug;
    }
    if verb == Verb::Debug {
        // Debug takes neither flag: `{:#?}` would pretty-print.
        alt = false;
        plus = false;
    }

    let spec = Spec {
        verb,
        left,
        zero: zero && !left,
        plus,
        alt,
        width,
        precision,
    };
    Some((i + 1, spec))
}

fn scan_number(bytes: &[u8], i: &mut usize) -> Option<usize> {
    let start = *i;
    let mut n: usize = 0;
    while let Some(&b) = bytes.get(*i).filter(|b| b.is_ascii_digit()) {
        n = n.saturating_mul(10).saturating_add(usize::from(b - b'0'));
        *i += 1;
    }
    (*i > start).then_some(n.min(MAX_WIDTH))
}

/// Number of placeholders in `template`.
///
/// ```
/// use cerror::template::placeholder_count;
///
/// assert_eq!(placeholder_count("invalid value for field %v"), 1);
/// assert_eq!(placeholder_count("took %.2f s, code %#x"), 2);
/// assert_eq!(placeholder_count("100%% done"), 0);
/// ```
pub fn placeholder_count(template: &str) -> usize {
    Pieces::new(template)
        .filter(|p| matches!(p, Piece::Placeholder { .. }))
        .count()
}

/// Render `template` with `args` substituted positionally.
///
/// Extra arguments are ignored; missing ones leave their placeholder text
/// in place. If an argument's own formatting impl fails, the string ends
/// where that argument would have started.
///
/// ```
/// use cerror::{template::render, Value};
///
/// let args = [Value::display(1.23456), Value::display(255u32)];
/// assert_eq!(render("took %.2f s, code %#x", &args), "took 1.23 s, code 0xff");
/// ```
pub fn render(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    // Err only comes from an argument's formatting impl; keep the prefix.
    let _ = write_rendered(&mut out, template, args);
    out
}

pub(crate) fn write_rendered<W: Write>(out: &mut W, template: &str, args: &[Value]) -> fmt::Result {
    let mut args = args.iter();
    for piece in Pieces::new(template) {
        match piece {
            Piece::Literal(text) => out.write_str(text)?,
            Piece::Placeholder { text, spec } => match args.next() {
                Some(arg) => write_arg(out, arg, &spec)?,
                None => out.write_str(text)?,
            },
        }
    }
    Ok(())
}

/// A value viewed through one verb; precision and flags come from the
/// surrounding formatter.
struct Formatted<'a> {
    value: &'a Value,
    verb: Verb,
}

impl fmt::Display for Formatted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt_as(self.verb, f)
    }
}

fn write_arg<W: Write>(out: &mut W, arg: &Value, spec: &Spec) -> fmt::Result {
    let width = spec.width.unwrap_or(0);
    if width == 0 {
        return write_body(out, arg, spec);
    }

    let mut body = String::new();
    write_body(&mut body, arg, spec)?;
    let fill = width.saturating_sub(body.chars().count());
    if fill == 0 {
        return out.write_str(&body);
    }

    if spec.left {
        out.write_str(&body)?;
        write_fill(out, ' ', fill)
    } else if spec.zero {
        let split = sign_and_prefix_len(&body, spec);
        out.write_str(&body[..split])?;
        write_fill(out, '0', fill)?;
        out.write_str(&body[split..])
    } else {
        write_fill(out, ' ', fill)?;
        out.write_str(&body)
    }
}

fn write_body<W: Write>(out: &mut W, value: &Value, spec: &Spec) -> fmt::Result {
    let shown = Formatted { value, verb: spec.verb };
    match (spec.plus, spec.alt, spec.precision) {
        (false, false, None) => write!(out, "{}", shown),
        (false, false, Some(p)) => write!(out, "{:.*}", p, shown),
        (true, false, None) => write!(out, "{:+}", shown),
        (true, false, Some(p)) => write!(out, "{:+.*}", p, shown),
        (false, true, None) => write!(out, "{:#}", shown),
        (false, true, Some(p)) => write!(out, "{:#.*}", p, shown),
        (true, true, None) => write!(out, "{:+#}", shown),
        (true, true, Some(p)) => write!(out, "{:+#.*}", p, shown),
    }
}

/// Bytes of `body` that zero padding goes after: a sign, then a radix
/// prefix when `#` asked for one.
fn sign_and_prefix_len(body: &str, spec: &Spec) -> usize {
    let sign = usize::from(body.starts_with(['+', '-']));
    let radix = matches!(
        spec.verb,
        Verb::LowerHex | Verb::UpperHex | Verb::Octal | Verb::Binary
    );
    let rest = &body[sign..];
    if spec.alt && radix && ["0x", "0o", "0b"].iter().any(|p| rest.starts_with(p)) {
        sign + 2
    } else {
        sign
    }
}

fn write_fill<W: Write>(out: &mut W, c: char, n: usize) -> fmt::Result {
    for _ in 0..n {
        out.write_char(c)?;
    }
    Ok(())
}
