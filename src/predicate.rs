//! Series predicates
//!
//! A predicate is a boolean tree over series tag values. The provider never
//! inspects it; it travels to the storage backend exactly as the query
//! compiler produced it. In-process backends use [`Predicate::matches`] to
//! evaluate it against a series' tag set.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag key holding the measurement name
pub const MEASUREMENT_TAG: &str = "_measurement";
/// Tag key holding the field name
pub const FIELD_TAG: &str = "_field";

/// A predicate over series tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Equality: tag = value
    Eq(String, String),
    /// Not equal: tag != value (also true when the tag is absent)
    NotEq(String, String),
    /// Regex match: tag =~ /pattern/
    Match(String, String),
    /// Negated regex match: tag !~ /pattern/
    NotMatch(String, String),
    /// Logical AND
    And(Box<Predicate>, Box<Predicate>),
    /// Logical OR
    Or(Box<Predicate>, Box<Predicate>),
    /// Logical NOT
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq(tag.into(), value.into())
    }

    pub fn not_eq(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::NotEq(tag.into(), value.into())
    }

    pub fn matches_regex(tag: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Match(tag.into(), pattern.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate against a series tag set
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> Result<bool> {
        Ok(match self {
            Predicate::Eq(tag, value) => tags.get(tag).is_some_and(|v| v == value),
            Predicate::NotEq(tag, value) => tags.get(tag).map_or(true, |v| v != value),
            Predicate::Match(tag, pattern) => {
                let re = compile(pattern)?;
                tags.get(tag).is_some_and(|v| re.is_match(v))
            }
            Predicate::NotMatch(tag, pattern) => {
                let re = compile(pattern)?;
                tags.get(tag).map_or(true, |v| !re.is_match(v))
            }
            Predicate::And(left, right) => left.matches(tags)? && right.matches(tags)?,
            Predicate::Or(left, right) => left.matches(tags)? || right.matches(tags)?,
            Predicate::Not(inner) => !inner.matches(tags)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::Invalid(format!("invalid regex /{pattern}/ in predicate: {e}")))
}
