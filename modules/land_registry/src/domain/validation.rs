//! Input validation for accounts and settings

use crate::contract::RegistryError;

/// Shortest accepted site name, in characters
pub const SITE_NAME_MIN: usize = 3;
/// Longest accepted site name, in characters
pub const SITE_NAME_MAX: usize = 50;

/// Reject empty or whitespace-only required fields
///
/// `fields` pairs each field name with its value; every missing name is listed
/// in the error.
pub fn validate_required(fields: &[(&str, &str)]) -> Result<(), RegistryError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Validate password length (in characters, not bytes)
pub fn validate_password(password: &str, min_length: usize) -> Result<(), RegistryError> {
    if password.chars().count() < min_length {
        return Err(RegistryError::validation(format!(
            "Password must be at least {} characters long",
            min_length
        )));
    }
    Ok(())
}

/// Validate email shape: `local@domain.tld`, no whitespace
///
/// Accepts:
/// - "ion@example.ro"
/// - "primar.valea-mare@gov.example.ro"
pub fn validate_email(email: &str) -> Result<(), RegistryError> {
    let invalid = || RegistryError::validation(format!("Invalid email address: '{}'", email));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };

    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    // Domain needs at least one dot with non-empty labels around it
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate the site display name
pub fn validate_site_name(name: &str) -> Result<(), RegistryError> {
    let len = name.trim().chars().count();
    if len < SITE_NAME_MIN {
        return Err(RegistryError::validation(format!(
            "Site name must be at least {} characters long",
            SITE_NAME_MIN
        )));
    }
    if len > SITE_NAME_MAX {
        return Err(RegistryError::validation(format!(
            "Site name must be at most {} characters long",
            SITE_NAME_MAX
        )));
    }
    Ok(())
}

/// Normalise an optional text field: trims, and turns empty into `None`
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
