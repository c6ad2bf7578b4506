//! Typed paths into a document tree
//!
//! A [`DocPath`] is an ordered list of object keys and array indices. Paths
//! are usually produced by the validation engine, which reports failing
//! locations as JSON pointers (`/ResourceHeader/Contact/0/Role`), so parsing
//! and rendering follow RFC 6901 escaping.

use std::fmt;

use crate::{Error, Result};

/// One step of a document path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member name
    Key(String),
    /// Array position
    Index(usize),
}

impl PathSegment {
    /// Token form used inside a JSON pointer (unescaped).
    pub fn token(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }

    /// Interpret this segment as an array index, if it can be one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(key) => parse_index(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Ordered location inside a document. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse an RFC 6901 JSON pointer.
    ///
    /// Tokens made only of digits (without a leading zero) become
    /// [`PathSegment::Index`]; everything else is a key. Navigation is lenient
    /// in both directions, so an all-digit object key still resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when the pointer does not start with `/`
    /// or contains an invalid `~` escape.
    pub fn from_pointer(pointer: &str) -> Result<Self> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(Error::invalid_path(pointer, "pointer must start with '/'"));
        };

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let token = unescape(raw).ok_or_else(|| {
                Error::invalid_path(pointer, format!("invalid escape in token '{raw}'"))
            })?;
            match parse_index(&token) {
                Some(index) => segments.push(PathSegment::Index(index)),
                None => segments.push(PathSegment::Key(token)),
            }
        }
        Ok(Self { segments })
    }

    /// Render as an RFC 6901 JSON pointer
    pub fn to_pointer(&self) -> String {
        self.to_string()
    }

    /// Append an object key
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an array index
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Push a segment in place
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into the parent path and the final segment.
    /// Returns `None` for the root.
    pub fn split_last(&self) -> Option<(DocPath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((DocPath::new(parent.to_vec()), last))
    }

    /// Final segment, if any
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for DocPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
