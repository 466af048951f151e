//! Shared domain enumerations and value types aligned with persisted columns.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "post_status", rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heading depth, `1` for `<h1>` through `6` for `<h6>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct HeadingLevel(i16);

impl HeadingLevel {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 6;

    pub fn new(level: i16) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(DomainError::validation(
                "level",
                format!("must be between {} and {}, got {level}", Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn get(self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for HeadingLevel {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HeadingLevel> for i16 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_accepts_h1_through_h6() {
        for level in 1..=6 {
            assert_eq!(HeadingLevel::new(level).expect("valid level").get(), level);
        }
    }

    #[test]
    fn heading_level_rejects_out_of_range() {
        assert_eq!(HeadingLevel::new(0).expect_err("zero").field(), "level");
        assert!(HeadingLevel::new(7).is_err());
    }

    #[test]
    fn heading_level_deserializes_with_validation() {
        let level: HeadingLevel = serde_json::from_str("3").expect("level");
        assert_eq!(level.get(), 3);
        assert!(serde_json::from_str::<HeadingLevel>("9").is_err());
    }

    #[test]
    fn post_status_uses_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&PostStatus::Published).expect("json"),
            "\"published\""
        );
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }
}
