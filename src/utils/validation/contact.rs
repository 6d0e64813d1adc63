//! Contact field checks for the booking form
//!
//! Empty values are not errors here: completeness is judged separately by
//! the wizard, these checks only flag malformed input.

/// Minimum number of digits in a phone number
pub const MIN_PHONE_DIGITS: usize = 10;

pub const EMAIL_ERROR: &str = "Please enter a valid email address";
pub const PHONE_ERROR: &str = "Phone number must have at least 10 digits";

/// Validator for contact details
pub struct ContactValidator;

impl ContactValidator {
    /// `local@domain.tld` shape: no whitespace, exactly one `@`, a dot after it
    /// with characters on both sides
    #[must_use]
    pub fn is_valid_email(value: &str) -> bool {
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        // Any dot works as long as both sides are non-empty
        domain
            .char_indices()
            .filter(|&(_, c)| c == '.')
            .any(|(i, _)| i > 0 && i + 1 < domain.len())
    }

    /// Digits only count; separators and a leading `+` are ignored
    #[must_use]
    pub fn is_valid_phone(value: &str) -> bool {
        Self::phone_digits(value) >= MIN_PHONE_DIGITS
    }

    #[must_use]
    pub fn phone_digits(value: &str) -> usize {
        value.chars().filter(char::is_ascii_digit).count()
    }

    /// Error message for an email field, `None` when empty or valid
    #[must_use]
    pub fn email_error(value: &str) -> Option<&'static str> {
        (!value.is_empty() && !Self::is_valid_email(value)).then_some(EMAIL_ERROR)
    }

    /// Error message for a phone field, `None` when empty or valid
    #[must_use]
    pub fn phone_error(value: &str) -> Option<&'static str> {
        (!value.is_empty() && !Self::is_valid_phone(value)).then_some(PHONE_ERROR)
    }
}
