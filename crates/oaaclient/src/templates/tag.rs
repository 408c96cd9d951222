//! Key/value tags attached to payload entities.

use serde::Serialize;

use crate::error::TemplateError;
use crate::validation::{is_valid_tag_key, is_valid_tag_value};

/// Validated tag. The value may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    /// Builds a tag after validating its key and value.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidTagKey`] or
    /// [`TemplateError::InvalidTagValue`] when either part holds characters
    /// the platform rejects.
    ///
    /// # Examples
    ///
    /// ```
    /// use oaaclient::templates::Tag;
    ///
    /// let tag = Tag::new("environment", "prod").expect("valid tag");
    /// assert_eq!(tag.key(), "environment");
    /// assert!(Tag::new("bad key", "").is_err());
    /// ```
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, TemplateError> {
        let tag = Self {
            key: key.into(),
            value: value.into(),
        };
        if !is_valid_tag_key(&tag.key) {
            return Err(TemplateError::InvalidTagKey { key: tag.key });
        }
        if !is_valid_tag_value(&tag.value) {
            return Err(TemplateError::InvalidTagValue { value: tag.value });
        }
        Ok(tag)
    }

    /// Tag key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag value, possibly empty.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Appends a new tag unless an equal one is already present.
pub(crate) fn push_unique(tags: &mut Vec<Tag>, key: &str, value: &str) -> Result<(), TemplateError> {
    let tag = Tag::new(key, value)?;
    if !tags.contains(&tag) {
        tags.push(tag);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Tag validation and de-duplication.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("owner", "")]
    #[case::email("contact", "ops@example.com")]
    #[case::spaced("team", "platform, infra-1.0")]
    fn accepts_valid_tags(#[case] key: &str, #[case] value: &str) {
        let tag = Tag::new(key, value).expect("valid tag");
        assert_eq!(tag.value(), value);
    }

    #[rstest]
    #[case::key_space("bad key", "", "tag key")]
    #[case::key_symbol("bad!", "", "tag key")]
    #[case::value_symbol("key", "bad!", "tag value")]
    fn rejects_invalid_tags(#[case] key: &str, #[case] value: &str, #[case] fragment: &str) {
        let error = Tag::new(key, value).expect_err("invalid tag");
        assert!(
            error.to_string().contains(fragment),
            "error should mention the invalid part: {error}"
        );
    }

    #[test]
    fn push_unique_skips_duplicates() {
        let mut tags = Vec::new();
        push_unique(&mut tags, "env", "prod").expect("valid tag");
        push_unique(&mut tags, "env", "prod").expect("valid tag");
        push_unique(&mut tags, "env", "dev").expect("valid tag");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn serializes_key_and_value() {
        let tag = Tag::new("env", "").expect("valid tag");
        let json = serde_json::to_value(&tag).expect("serializes");
        assert_eq!(json, serde_json::json!({"key": "env", "value": ""}));
    }
}
