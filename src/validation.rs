//! Amount validation
//!
//! Pure functions turning raw amount text into a [`ValidationOutcome`].
//! `Invalid` blocks a rate lookup; `Warning` is shown next to a successful
//! conversion but never blocks one.

use crate::catalog::Currency;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub const NOT_A_NUMBER: &str = "must be a number";
pub const NEGATIVE_AMOUNT: &str = "cannot be negative";

/// Result of validating an amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Valid,
    Invalid { reason: String },
    Warning { reason: String },
}

impl ValidationOutcome {
    fn invalid(reason: &str) -> Self {
        ValidationOutcome::Invalid {
            reason: reason.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Whether a rate lookup may proceed
    pub fn allows_fetch(&self) -> bool {
        !matches!(self, ValidationOutcome::Invalid { .. })
    }

    /// Text to show under the sending field, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid { reason } | ValidationOutcome::Warning { reason } => {
                Some(reason)
            }
        }
    }
}

/// Parse amount text. Empty or malformed text yields `None`.
///
/// Only plain decimal notation is accepted: an optional leading `-`, ASCII
/// digits and at most one `.`. Digit separators, `+` and exponents are
/// rejected even where `Decimal` itself would take them.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    if !is_plain_decimal(text) {
        return None;
    }
    Decimal::from_str(text).ok()
}

fn is_plain_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Check that `text` is a non-negative decimal. Zero is accepted.
pub fn check_syntax(text: &str) -> ValidationOutcome {
    match parse_amount(text) {
        None => ValidationOutcome::invalid(NOT_A_NUMBER),
        Some(amount) if amount < Decimal::ZERO => ValidationOutcome::invalid(NEGATIVE_AMOUNT),
        Some(_) => ValidationOutcome::Valid,
    }
}

/// Check `amount` against the currency's sending limit. Exactly at the
/// limit is still valid.
pub fn check_limit(amount: Decimal, currency: &Currency) -> ValidationOutcome {
    if amount > currency.sending_limit {
        ValidationOutcome::Warning {
            reason: limit_message(currency),
        }
    } else {
        ValidationOutcome::Valid
    }
}

/// Syntax check followed by the limit check
pub fn full_validation(text: &str, currency: &Currency) -> ValidationOutcome {
    let syntax = check_syntax(text);
    if !syntax.is_valid() {
        return syntax;
    }
    match parse_amount(text) {
        Some(amount) => check_limit(amount, currency),
        None => ValidationOutcome::invalid(NOT_A_NUMBER),
    }
}

fn limit_message(currency: &Currency) -> String {
    format!(
        "exceeds limit of {} {}",
        currency.sending_limit.normalize(),
        currency.code
    )
}
