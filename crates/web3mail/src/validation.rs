//! Input validation.
//!
//! Every value that crosses the public API goes through one of these
//! functions before it reaches the order or secret pipelines. They are pure:
//! each returns the normalized value or a [`ValidationError`] naming the field
//! and the rule it broke.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Maximum subject length (one RFC 2822 header line).
pub const MAX_SUBJECT_LENGTH: usize = 78;

/// Maximum content length accepted by the mail provider.
pub const MAX_CONTENT_LENGTH: usize = 512_000;

/// Allowed sender name length.
pub const SENDER_NAME_LENGTH: (usize, usize) = (3, 20);

/// Allowed label length.
pub const LABEL_LENGTH: (usize, usize) = (3, 10);

const ENS_SUFFIX: &str = ".eth";
const ENS_MIN_LENGTH: usize = 7;

/// The rule a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value is empty.
    Required,
    /// Value is neither a chain address nor an ENS name.
    AddressOrEns,
    /// Value is not a chain address.
    Address,
    /// Value is longer than allowed.
    MaxLength(usize),
    /// Value length falls outside an inclusive range.
    LengthRange(usize, usize),
    /// Value is not a supported content type.
    ContentType,
    /// Value is not an absolute URL.
    Url,
}

/// Validation error for a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: &'static str,
    rule: Rule,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub const fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Get the violated rule.
    #[must_use]
    pub const fn rule(&self) -> Rule {
        self.rule
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field;
        match self.rule {
            Rule::Required => write!(f, "{field} is a required field"),
            Rule::AddressOrEns => {
                write!(f, "{field} should be an ethereum address or a ENS name")
            }
            Rule::Address => write!(f, "{field} should be an ethereum address"),
            Rule::MaxLength(max) => write!(f, "{field} must be at most {max} characters"),
            Rule::LengthRange(min, max) => {
                write!(f, "{field} must be between {min} and {max} characters")
            }
            Rule::ContentType => write!(
                f,
                "{field} must be one of the following values: {}, {}",
                ContentType::Plain,
                ContentType::Html
            ),
            Rule::Url => write!(f, "{field} must be a valid URL"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a single field.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Email body format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentType {
    /// `text/plain`.
    #[default]
    #[serde(rename = "text/plain")]
    Plain,
    /// `text/html`.
    #[serde(rename = "text/html")]
    Html,
}

impl ContentType {
    /// MIME type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text/plain" => Ok(Self::Plain),
            "text/html" => Ok(Self::Html),
            _ => Err(ValidationError::new("contentType", Rule::ContentType)),
        }
    }
}

/// Checks the `0x` + 40 hex characters shape of a chain address.
#[must_use]
pub fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Checks for an ENS name: ends with `.eth` and is longer than six characters.
#[must_use]
pub fn is_ens(value: &str) -> bool {
    value.ends_with(ENS_SUFFIX) && value.len() >= ENS_MIN_LENGTH
}

/// Validates an address or ENS name and lower-cases it.
///
/// # Errors
///
/// Returns an error if the value is empty or matches neither shape.
pub fn address_or_ens(field: &'static str, value: &str) -> ValidationResult<String> {
    let value = value.to_lowercase();
    if value.is_empty() {
        return Err(ValidationError::new(field, Rule::Required));
    }
    if is_address(&value) || is_ens(&value) {
        Ok(value)
    } else {
        Err(ValidationError::new(field, Rule::AddressOrEns))
    }
}

/// Validates a chain address and lower-cases it.
///
/// # Errors
///
/// Returns an error if the value is empty or is not a chain address.
pub fn address(field: &'static str, value: &str) -> ValidationResult<String> {
    let value = value.to_lowercase();
    if value.is_empty() {
        return Err(ValidationError::new(field, Rule::Required));
    }
    if is_address(&value) {
        Ok(value)
    } else {
        Err(ValidationError::new(field, Rule::Address))
    }
}

/// Parses an absolute URL.
///
/// # Errors
///
/// Returns an error if the value is not an absolute URL.
pub fn url(field: &'static str, value: &str) -> ValidationResult<Url> {
    Url::parse(value).map_err(|_| ValidationError::new(field, Rule::Url))
}

/// Validates an email subject.
///
/// # Errors
///
/// Returns an error if the subject is empty or too long.
pub fn email_subject(value: &str) -> ValidationResult<&str> {
    bounded_required("emailSubject", value, MAX_SUBJECT_LENGTH)
}

/// Validates an email body.
///
/// # Errors
///
/// Returns an error if the content is empty or too long.
pub fn email_content(value: &str) -> ValidationResult<&str> {
    bounded_required("emailContent", value, MAX_CONTENT_LENGTH)
}

/// Validates an optional sender name.
///
/// # Errors
///
/// Returns an error if a name is present and its length is out of range.
pub fn sender_name(value: Option<&str>) -> ValidationResult<Option<&str>> {
    optional_in_range("senderName", value, SENDER_NAME_LENGTH)
}

/// Validates an optional task label.
///
/// # Errors
///
/// Returns an error if a label is present and its length is out of range.
pub fn label(value: Option<&str>) -> ValidationResult<Option<&str>> {
    optional_in_range("label", value, LABEL_LENGTH)
}

fn bounded_required<'a>(
    field: &'static str,
    value: &'a str,
    max: usize,
) -> ValidationResult<&'a str> {
    if value.is_empty() {
        return Err(ValidationError::new(field, Rule::Required));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(field, Rule::MaxLength(max)));
    }
    Ok(value)
}

fn optional_in_range<'a>(
    field: &'static str,
    value: Option<&'a str>,
    (min, max): (usize, usize),
) -> ValidationResult<Option<&'a str>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(Some(value))
    } else {
        Err(ValidationError::new(field, Rule::LengthRange(min, max)))
    }
}
