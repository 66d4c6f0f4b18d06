//! Path templates with named `:param` segments.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path template '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("path template '{0}' has an unnamed parameter")]
    EmptyParam(String),

    #[error("path template '{template}' binds '{name}' more than once")]
    DuplicateParam { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A route path such as `/posts/:postId`.
///
/// Segments starting with `:` bind the concrete segment at the same position
/// to a named parameter. A single trailing slash is ignored on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template does not start with `/`, has an
    /// empty `:` segment, or uses a parameter name twice.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if !source.starts_with('/') {
            return Err(TemplateError::MissingLeadingSlash(source.to_string()));
        }

        let mut names = HashSet::new();
        let mut segments = Vec::new();

        for part in split(source) {
            match part.strip_prefix(':') {
                Some("") => return Err(TemplateError::EmptyParam(source.to_string())),
                Some(name) => {
                    if !names.insert(name) {
                        return Err(TemplateError::DuplicateParam {
                            template: source.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a concrete path, returning the bound parameters as strings.
    ///
    /// Literal segments compare against the raw path. Bound segments are
    /// percent-decoded; one that does not decode to UTF-8 fails the match.
    /// Parameters never bind an empty segment.
    pub fn matches(&self, path: &str) -> Option<Map<String, Value>> {
        if !path.starts_with('/') {
            return None;
        }

        let parts = split(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Map::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    params.insert(name.clone(), Value::String(value.into_owned()));
                }
                _ => return None,
            }
        }

        Some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Splits `/a/b/` into `["a", "b"]`; `/` yields no segments.
fn split(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}
