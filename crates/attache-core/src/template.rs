//! Persistent name templates.
//!
//! A template turns a record into the name its file lives under inside the
//! persistent root, e.g. `photos/{id}{ext}`. Two placeholders exist:
//!
//! - `{id}`: the owning record's primary key;
//! - `{ext}`: the staged file's extension, including the leading dot
//!   (possibly empty).
//!
//! A template is resolved once per staged file, at or after insert, and the
//! resolved name is never recomputed afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::naming::validate_persistent_name;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Id,
    Ext,
}

/// A parsed persistent-name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    parts: Vec<Part>,
}

impl NameTemplate {
    /// Parse a template string.
    ///
    /// Rejects unknown placeholders and unbalanced braces with
    /// [`Error::InvalidInput`]. The rendered output is validated separately
    /// on every [`render`](Self::render).
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::InvalidInput("empty name template".to_string()));
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' => {
                    let rest = &source[i + 1..];
                    let Some(close) = rest.find('}') else {
                        return Err(Error::InvalidInput(format!(
                            "unterminated placeholder in name template: {}",
                            source
                        )));
                    };
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    let placeholder = &rest[..close];
                    match placeholder {
                        "id" => parts.push(Part::Id),
                        "ext" => parts.push(Part::Ext),
                        other => {
                            return Err(Error::InvalidInput(format!(
                                "unknown placeholder {{{}}} in name template: {}",
                                other, source
                            )));
                        }
                    }
                    // Skip past the placeholder body and its closing brace.
                    for _ in 0..=close {
                        chars.next();
                    }
                }
                '}' => {
                    return Err(Error::InvalidInput(format!(
                        "stray '}}' in name template: {}",
                        source
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Whether rendering needs the record's primary key.
    ///
    /// When true and the key is not known yet (the record has not been
    /// inserted), name resolution must be deferred to after insert.
    pub fn requires_id(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Id))
    }

    /// Render the final persistent name.
    ///
    /// `ext` is the staged file's extension with its leading dot (empty for
    /// none). A template that needs `{id}` without one supplied is
    /// [`Error::InvalidInput`]; the rendered name is checked against the
    /// persistent-name rules before it is returned.
    pub fn render(&self, id: Option<i64>, ext: &str) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() + ext.len() + 8);
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Id => match id {
                    Some(id) => {
                        out.push_str(&id.to_string());
                    }
                    None => {
                        return Err(Error::InvalidInput(format!(
                            "name template requires a record id: {}",
                            self.source
                        )));
                    }
                },
                Part::Ext => out.push_str(ext),
            }
        }
        validate_persistent_name(&out)?;
        Ok(out)
    }

    /// The original template string.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for NameTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for NameTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for NameTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_template_needs_no_id() {
        let t = NameTemplate::parse("obj").unwrap();
        assert!(!t.requires_id());
        assert_eq!(t.render(None, ".png").unwrap(), "obj");
    }

    #[test]
    fn id_and_ext_placeholders() {
        let t = NameTemplate::parse("photos/{id}{ext}").unwrap();
        assert!(t.requires_id());
        assert_eq!(t.render(Some(42), ".png").unwrap(), "photos/42.png");
        assert_eq!(t.render(Some(7), "").unwrap(), "photos/7");
    }

    #[test]
    fn missing_id_is_invalid_input() {
        let t = NameTemplate::parse("obj/{id}").unwrap();
        assert!(matches!(
            t.render(None, ".png"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_placeholder_rejected() {
        assert!(matches!(
            NameTemplate::parse("obj/{pk}"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn unbalanced_braces_rejected() {
        assert!(matches!(
            NameTemplate::parse("obj/{id"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            NameTemplate::parse("obj}"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            NameTemplate::parse(""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rendered_output_is_validated() {
        // An extension that would climb out of the root is refused at render
        // time even though the template itself is well-formed.
        let t = NameTemplate::parse("{ext}").unwrap();
        assert!(matches!(t.render(None, ".."), Err(Error::IllegalName(_))));

        let abs = NameTemplate::parse("/abs/{id}").unwrap();
        assert!(matches!(
            abs.render(Some(1), ""),
            Err(Error::IllegalName(_))
        ));
    }

    #[test]
    fn display_and_from_str_round_trip() {
        let t: NameTemplate = "docs/{id}{ext}".parse().unwrap();
        assert_eq!(t.to_string(), "docs/{id}{ext}");
        assert_eq!(t.source(), "docs/{id}{ext}");
    }

    #[test]
    fn serde_round_trips_as_string() {
        let t = NameTemplate::parse("docs/{id}{ext}").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"docs/{id}{ext}\"");
        let back: NameTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn serde_rejects_bad_templates() {
        let err = serde_json::from_str::<NameTemplate>("\"x/{nope}\"");
        assert!(err.is_err());
    }
}
