//! Field-level checks for request payloads.
//!
//! Messages follow the `The <field> field ...` form clients already rely on,
//! with underscores in field names rendered as spaces.

use tallybank_core::{Amount, AmountError, FieldErrors};

/// A request field as received, before any rule is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldInput {
    /// Absent or `null`.
    #[default]
    Missing,
    Text(String),
    /// A numeric literal in its textual form.
    Number(String),
    /// Booleans, arrays and objects.
    Other,
}

impl FieldInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(literal: impl ToString) -> Self {
        Self::Number(literal.to_string())
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AmountRule {
    /// Zero allowed (opening deposits).
    NonNegative,
    /// At least one minor unit (transfers).
    Positive,
}

pub(crate) fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Validate a required amount field, recording problems into `errors`.
pub fn amount_field(
    field: &str,
    value: &FieldInput,
    rule: AmountRule,
    errors: &mut FieldErrors,
) -> Option<Amount> {
    let name = label(field);
    if value.is_blank() {
        errors.push(field, format!("The {name} field is required."));
        return None;
    }

    let minimum = match rule {
        AmountRule::NonNegative => "0",
        AmountRule::Positive => "0.01",
    };

    let parsed = match value {
        FieldInput::Number(literal) => Amount::parse_number(literal),
        FieldInput::Text(text) => Amount::parse(text),
        FieldInput::Missing | FieldInput::Other => Err(AmountError::NotANumber),
    };

    match parsed {
        Ok(amount) if rule == AmountRule::Positive && amount.is_zero() => {
            errors.push(field, format!("The {name} field must be at least {minimum}."));
            None
        }
        Ok(amount) => Some(amount),
        Err(AmountError::NotANumber) => {
            errors.push(field, format!("The {name} field must be a number."));
            None
        }
        Err(AmountError::Negative) => {
            errors.push(field, format!("The {name} field must be at least {minimum}."));
            None
        }
        Err(AmountError::TooManyDecimals) => {
            errors.push(
                field,
                format!("The {name} field must have at most {} decimal places.", Amount::SCALE),
            );
            None
        }
        Err(AmountError::OutOfRange) => {
            errors.push(field, format!("The {name} field is too large."));
            None
        }
    }
}

/// Validate a required account identifier field (string or integer).
pub fn identifier_field(field: &str, value: &FieldInput, errors: &mut FieldErrors) -> Option<String> {
    let name = label(field);
    if value.is_blank() {
        errors.push(field, format!("The {name} field is required."));
        return None;
    }
    match value {
        FieldInput::Text(s) => Some(s.trim().to_string()),
        FieldInput::Number(n) if n.parse::<i64>().is_ok() || n.parse::<u64>().is_ok() => {
            Some(n.clone())
        }
        _ => {
            errors.push(field, format!("The {name} field must be a string."));
            None
        }
    }
}
