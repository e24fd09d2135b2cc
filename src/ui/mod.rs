//! Server-rendered HTML GUI.
//!
//! No client-side framework: every page is a full document built from plain
//! strings, forms post back to the server, and the stylesheet is the only
//! static asset. Keeps the whole GUI inspectable and testable over HTTP.

pub mod pages;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters that cannot appear raw inside a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Percent-encode one URL path segment. Server and tool names come from
/// whatever the servers advertise, so links cannot assume they are tame.
pub fn encode_segment(input: &str) -> String {
    utf8_percent_encode(input, SEGMENT).to_string()
}

/// Minimal HTML escaping for user-controlled strings.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
