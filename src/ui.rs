// Presentation layer: prints the response body and shows a spinner on stderr
// while a request is in flight.

use crate::api::ApiResponse;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io::{self, Write};

/// What the output sink can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCaps {
    /// Raw UTF-8 may be written; otherwise non-ASCII is `\u` escaped.
    pub utf8: bool,
}

impl OutputCaps {
    /// Inspect the locale the way the C library would: `LC_ALL`, then
    /// `LC_CTYPE`, then `LANG`. Anything unset or non-UTF-8 is treated as
    /// ASCII only.
    pub fn detect() -> Self {
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.is_empty());
        OutputCaps {
            utf8: locale.map_or(false, |value| locale_is_utf8(&value)),
        }
    }
}

fn locale_is_utf8(locale: &str) -> bool {
    let upper = locale.to_ascii_uppercase();
    upper.contains("UTF-8") || upper.contains("UTF8")
}

/// Write `response` to `out`: JSON pretty-printed, anything else untouched.
pub fn present<W: Write>(response: &ApiResponse, caps: OutputCaps, out: &mut W) -> Result<()> {
    if is_json(&response.content_type) {
        match render_json(&response.body, caps) {
            Ok(rendered) => {
                out.write_all(&rendered).context("Failed to write response")?;
                return out.flush().context("Failed to write response");
            }
            Err(e) => tracing::warn!(error = %e, "response is not valid JSON, printing it raw"),
        }
    }
    out.write_all(&response.body).context("Failed to write response")?;
    out.flush().context("Failed to write response")
}

pub fn is_json(content_type: &str) -> bool {
    content_type
        .get(..16)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("application/json"))
}

/// Re-indent a JSON document with two spaces, keeping keys in the order they
/// were received. Ends with a newline.
pub fn render_json(body: &[u8], caps: OutputCaps) -> serde_json::Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let mut out = Vec::with_capacity(body.len() + body.len() / 2);
    let formatter = EscapingFormatter {
        pretty: PrettyFormatter::with_indent(b"  "),
        escape_non_ascii: !caps.utf8,
    };
    let mut ser = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

/// Pretty formatter that can also escape non-ASCII as `\uXXXX`.
struct EscapingFormatter<'a> {
    pretty: PrettyFormatter<'a>,
    escape_non_ascii: bool,
}

impl Formatter for EscapingFormatter<'_> {
    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if !self.escape_non_ascii {
            return writer.write_all(fragment.as_bytes());
        }
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

/// Spinner shown on stderr while waiting for the server. It stays hidden
/// when stderr is not a terminal. Drawn once, without a ticker thread.
pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.tick();
    spinner
}
