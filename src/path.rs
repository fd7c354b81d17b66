// Copyright 2025 Oxide Computer Company

//! Pointer stack tracking the location of the walk in the document graph.
//!
//! Locations are rendered as `#` followed by `/segment` for each level of
//! descent. Two kinds of segment exist:
//!
//! - **Fields**: fixed OpenAPI field names such as `properties` or
//!   `requestBody`. These are pushed verbatim.
//! - **Keys**: literal keys taken from the document (path strings, component
//!   names, media types, property names). These are escaped per RFC 6901 so
//!   that `/users/{id}` renders as `~1users~1{id}`.
//!
//! The stack has no notion of references: when the walk follows a `$ref`,
//! the pointer keeps describing the place the reference was reached from, so
//! a difference inside a shared component surfaces once per location that
//! reaches it.

use std::fmt;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct PointerStack {
    segments: Vec<String>,
}

impl PointerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fixed field name.
    pub(crate) fn push_field(&mut self, field: &str) {
        self.segments.push(field.to_string());
    }

    /// Push a literal document key, escaping special characters.
    pub(crate) fn push_key(&mut self, key: &str) {
        self.segments.push(escape_json_pointer_segment(key));
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Render the stack as a pointer string.
    pub fn current_pointer(&self) -> String {
        let mut out = String::from("#");
        for segment in &self.segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Debug for PointerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.current_pointer())
    }
}

impl fmt::Display for PointerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.current_pointer())
    }
}

/// Escape a segment for use in a JSON pointer per RFC 6901.
pub(crate) fn escape_json_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverse [`escape_json_pointer_segment`].
pub(crate) fn unescape_json_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
