//! Field constraint checks shared by the request types.

use std::sync::LazyLock;

use common::Money;
use regex::Regex;

use crate::error::{DomainError, FieldError};

pub static ISBN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9-]{10,17}$").expect("ISBN pattern is valid")
});

pub static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\d\s\-\+\(\)]+$").expect("phone pattern is valid")
});

pub static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Collects field errors so a request reports every violation at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, field: &'static str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Fails when the value is empty or only whitespace.
    pub fn not_blank(&mut self, field: &'static str, value: &str, message: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), message)
    }

    /// Fails when the value is longer than `max` characters.
    pub fn max_len(
        &mut self,
        field: &'static str,
        value: &str,
        max: usize,
        message: &str,
    ) -> &mut Self {
        self.check(field, value.chars().count() <= max, message)
    }

    /// Like [`Validator::max_len`], for optional fields.
    pub fn max_len_opt(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        max: usize,
        message: &str,
    ) -> &mut Self {
        match value {
            Some(value) => self.max_len(field, value, max, message),
            None => self,
        }
    }

    /// Fails when a non-blank value does not match `pattern`.
    ///
    /// Blank values are left to [`Validator::not_blank`].
    pub fn pattern(
        &mut self,
        field: &'static str,
        value: &str,
        pattern: &Regex,
        message: &str,
    ) -> &mut Self {
        let ok = value.trim().is_empty() || pattern.is_match(value);
        self.check(field, ok, message)
    }

    /// Price checks: present, greater than zero, at most ten integer digits.
    pub fn price(&mut self, field: &'static str, price: Option<Money>) -> &mut Self {
        match price {
            None => self.check(field, false, "Price is required"),
            Some(price) => self
                .check(field, price.is_positive(), "Price must be greater than 0")
                .check(field, price.integer_digits() <= 10, "Invalid price format"),
        }
    }

    /// Returns `DomainError::Validation` if anything failed.
    pub fn finish(&mut self) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(std::mem::take(&mut self.errors)))
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_pattern() {
        assert!(ISBN_PATTERN.is_match("978-0441013593"));
        assert!(ISBN_PATTERN.is_match("0441013593"));
        assert!(!ISBN_PATTERN.is_match("12345"));
        assert!(!ISBN_PATTERN.is_match("978-04410135X3"));
    }

    #[test]
    fn phone_pattern() {
        assert!(PHONE_PATTERN.is_match("+1 (555) 010-0000"));
        assert!(!PHONE_PATTERN.is_match("call me"));
    }

    #[test]
    fn email_pattern() {
        assert!(EMAIL_PATTERN.is_match("grace@example.com"));
        assert!(EMAIL_PATTERN.is_match("first.last+tag@sub.example.org"));
        assert!(!EMAIL_PATTERN.is_match("not-an-email"));
        assert!(!EMAIL_PATTERN.is_match("two@@example.com"));
        assert!(!EMAIL_PATTERN.is_match("spaces in@example.com"));
    }

    #[test]
    fn collects_every_failure() {
        let mut v = Validator::new();
        v.not_blank("title", " ", "Title is required")
            .max_len("author", &"a".repeat(101), 100, "Too long")
            .price("price", None);

        match v.finish() {
            Err(DomainError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, ["title", "author", "price"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_value_skips_pattern_check() {
        let mut v = Validator::new();
        v.pattern("isbn", "", &ISBN_PATTERN, "Invalid ISBN format");
        assert!(v.is_empty());
    }

    #[test]
    fn price_rules() {
        let mut v = Validator::new();
        v.price("price", Some(Money::from_cents(0)));
        assert!(v.finish().is_err());

        let mut v = Validator::new();
        v.price("price", Some(Money::from_units(10_000_000_000)));
        assert!(v.finish().is_err());

        let mut v = Validator::new();
        v.price("price", Some(Money::from_cents(2999)));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn length_counts_characters() {
        let mut v = Validator::new();
        v.max_len("title", "ééééé", 5, "Too long");
        assert!(v.is_empty());
    }
}
