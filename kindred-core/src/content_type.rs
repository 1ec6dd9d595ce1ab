//! Hierarchical content-type identifiers.
//!
//! A [`ContentType`] looks like a media type: a dot-separated hierarchy
//! (`app.widget.button`) with an optional class suffix after a single `+`
//! (`app.widget.button+render`). Less specific types are reached with
//! [`ContentType::parent`], which is what hierarchical resolution walks.

use crate::error::ContentTypeError;
use std::{fmt, str::FromStr};

/// An immutable, structurally compared content-type identifier.
///
/// # Example
///
/// ```rust
/// use kindred_core::ContentType;
///
/// let ct: ContentType = "ui.input.textbox+render".parse().unwrap();
/// assert_eq!(ct.type_and_subtype(), "ui.input.textbox");
/// assert_eq!(ct.suffix(), "render");
/// assert_eq!(ct.parent().to_string(), "ui.input+render");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentType {
    type_and_subtype: String,
    suffix: String,
}

impl ContentType {
    /// Separator between hierarchy segments.
    pub const SEGMENT_SEPARATOR: char = '.';
    /// Separator between the type hierarchy and the class suffix.
    pub const SUFFIX_SEPARATOR: char = '+';

    /// The "none" sentinel: no type, no suffix.
    pub const fn none() -> Self {
        Self {
            type_and_subtype: String::new(),
            suffix: String::new(),
        }
    }

    /// Parse a content type from its textual form.
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let mut parts = input.split(Self::SUFFIX_SEPARATOR);
        let type_and_subtype = parts.next().unwrap_or_default();
        let suffix = parts.next();
        if parts.next().is_some() {
            return Err(ContentTypeError::MultipleSuffixes(input.to_string()));
        }

        validate_hierarchy(input, type_and_subtype)?;
        if let Some(suffix) = suffix {
            validate_suffix(input, suffix)?;
        }

        Ok(Self {
            type_and_subtype: type_and_subtype.to_string(),
            suffix: suffix.unwrap_or_default().to_string(),
        })
    }

    /// The dot-separated hierarchy, without suffix.
    pub fn type_and_subtype(&self) -> &str {
        &self.type_and_subtype
    }

    /// The class suffix, empty when absent.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether a suffix is present.
    pub fn has_suffix(&self) -> bool {
        !self.suffix.is_empty()
    }

    /// Whether this is the "none" sentinel (empty hierarchy).
    ///
    /// A suffix-only value such as `+render` is also none: it has nothing
    /// left to resolve.
    pub fn is_none(&self) -> bool {
        self.type_and_subtype.is_empty()
    }

    /// Number of hierarchy segments. Zero for none.
    pub fn depth(&self) -> usize {
        if self.is_none() {
            0
        } else {
            self.type_and_subtype
                .matches(Self::SEGMENT_SEPARATOR)
                .count()
                + 1
        }
    }

    /// The next less specific content type.
    ///
    /// Drops the last segment and keeps the suffix. A single-segment type
    /// has the none sentinel as its parent.
    pub fn parent(&self) -> Self {
        match self.type_and_subtype.rfind(Self::SEGMENT_SEPARATOR) {
            Some(idx) => Self {
                type_and_subtype: self.type_and_subtype[..idx].to_string(),
                suffix: self.suffix.clone(),
            },
            None => Self::none(),
        }
    }

    /// Iterate from this content type up to its root, excluding none.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: (!self.is_none()).then(|| self.clone()),
        }
    }

    /// Whether `self` is `other` or one of its ancestors, ignoring suffixes.
    pub fn is_ancestor_of(&self, other: &ContentType) -> bool {
        if self.is_none() {
            return false;
        }
        match other.type_and_subtype.strip_prefix(&self.type_and_subtype) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEGMENT_SEPARATOR),
            None => false,
        }
    }

    /// Attach a suffix to a content type that has none.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, ContentTypeError> {
        if self.has_suffix() {
            return Err(ContentTypeError::MultipleSuffixes(format!(
                "{self}{}{suffix}",
                Self::SUFFIX_SEPARATOR
            )));
        }
        validate_suffix(suffix, suffix)?;
        Ok(Self {
            type_and_subtype: self.type_and_subtype.clone(),
            suffix: suffix.to_string(),
        })
    }

    /// The same hierarchy without its suffix.
    pub fn without_suffix(&self) -> Self {
        Self {
            type_and_subtype: self.type_and_subtype.clone(),
            suffix: String::new(),
        }
    }
}

fn validate_hierarchy(input: &str, hierarchy: &str) -> Result<(), ContentTypeError> {
    if hierarchy.is_empty() {
        return Ok(());
    }
    if let Some(ch) = hierarchy.chars().find(|c| c.is_whitespace()) {
        return Err(ContentTypeError::InvalidCharacter {
            input: input.to_string(),
            ch,
        });
    }
    if hierarchy
        .split(ContentType::SEGMENT_SEPARATOR)
        .any(str::is_empty)
    {
        return Err(ContentTypeError::EmptySegment(input.to_string()));
    }
    Ok(())
}

fn validate_suffix(input: &str, suffix: &str) -> Result<(), ContentTypeError> {
    if suffix.is_empty() {
        return Err(ContentTypeError::EmptySuffix(input.to_string()));
    }
    if suffix.contains(ContentType::SUFFIX_SEPARATOR) {
        return Err(ContentTypeError::MultipleSuffixes(input.to_string()));
    }
    if let Some(ch) = suffix.chars().find(|c| c.is_whitespace()) {
        return Err(ContentTypeError::InvalidCharacter {
            input: input.to_string(),
            ch,
        });
    }
    Ok(())
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_and_subtype)?;
        if self.has_suffix() {
            write!(f, "{}{}", Self::SUFFIX_SEPARATOR, self.suffix)?;
        }
        Ok(())
    }
}

impl FromStr for ContentType {
    type Err = ContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ContentType {
    type Error = ContentTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ContentType {
    type Error = ContentTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Iterator returned by [`ContentType::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<ContentType>,
}

impl Iterator for Ancestors {
    type Item = ContentType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let parent = current.parent();
        if !parent.is_none() {
            self.next = Some(parent);
        }
        Some(current)
    }
}
