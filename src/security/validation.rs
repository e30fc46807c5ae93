use bigdecimal::{BigDecimal, Signed};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// Field-level validation failure. `Display` yields the message shown next
/// to the form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(String),
    TooLong { field: String, max: usize, actual: usize },
    InvalidEmail(String),
    InvalidNumber { field: String, expected: String },
    InvalidRange { field: String, min: String },
    TooManyDigits { field: String, max_digits: u64, decimal_places: i64 },
    InvalidChoice(String),
    Custom(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(_) => write!(f, "Ce champ est obligatoire."),
            Self::TooLong { max, actual, .. } => write!(
                f,
                "Assurez-vous que cette valeur comporte au plus {} caractères (actuellement {}).",
                max, actual
            ),
            Self::InvalidEmail(_) => write!(f, "Saisissez une adresse e-mail valide."),
            Self::InvalidNumber { expected, .. } => write!(f, "Saisissez {}.", expected),
            Self::InvalidRange { min, .. } => write!(
                f,
                "Assurez-vous que cette valeur est supérieure ou égale à {}.",
                min
            ),
            Self::TooManyDigits {
                max_digits,
                decimal_places,
                ..
            } => write!(
                f,
                "Assurez-vous qu'il n'y a pas plus de {} chiffres au total, dont {} après la virgule.",
                max_digits, decimal_places
            ),
            Self::InvalidChoice(_) => write!(
                f,
                "Sélectionnez un choix valide. Ce choix ne fait pas partie de ceux disponibles."
            ),
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).expect("Invalid email regex")
});

pub fn validate_required<'a>(value: Option<&'a str>, field_name: &str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Required(field_name.to_string())),
    }
}

/// Length is counted in characters, not bytes, to match the column limits.
pub fn validate_length(value: &str, field_name: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: field_name.to_string(),
            max,
            actual: len,
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Lower-cases the domain part, leaving the local part untouched.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Parses a non-negative decimal with at most `max_digits` digits, of which
/// at most `decimal_places` after the separator. A comma separator is
/// accepted.
pub fn validate_decimal(
    value: &str,
    field_name: &str,
    max_digits: u64,
    decimal_places: i64,
) -> Result<BigDecimal, ValidationError> {
    let normalized = value.trim().replace(',', ".");
    let number = BigDecimal::from_str(&normalized).map_err(|_| ValidationError::InvalidNumber {
        field: field_name.to_string(),
        expected: "un nombre".to_string(),
    })?;

    if number.is_negative() {
        return Err(ValidationError::InvalidRange {
            field: field_name.to_string(),
            min: "0".to_string(),
        });
    }

    // whole digits from the exponent; no rescaling before the bound checks
    let number = number.normalized();
    let (_, scale) = number.as_bigint_and_exponent();
    let whole_digits = i64::try_from(number.digits())
        .unwrap_or(i64::MAX)
        .saturating_sub(scale)
        .max(0);
    let max_whole_digits = i64::try_from(max_digits).unwrap_or(i64::MAX) - decimal_places;
    if scale > decimal_places || whole_digits > max_whole_digits {
        return Err(ValidationError::TooManyDigits {
            field: field_name.to_string(),
            max_digits,
            decimal_places,
        });
    }

    Ok(number.with_scale(decimal_places))
}

pub fn validate_non_negative_int(value: &str, field_name: &str) -> Result<i32, ValidationError> {
    let number: i32 = value.trim().parse().map_err(|_| ValidationError::InvalidNumber {
        field: field_name.to_string(),
        expected: "un nombre entier".to_string(),
    })?;

    if number < 0 {
        return Err(ValidationError::InvalidRange {
            field: field_name.to_string(),
            min: "0".to_string(),
        });
    }
    Ok(number)
}
