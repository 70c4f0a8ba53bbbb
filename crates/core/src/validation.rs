//! Input validation shared by the household entity handlers.

use crate::error::CoreError;

/// Maximum length of a category, task, or wish name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Maximum length of a device push token.
pub const MAX_PUSH_TOKEN_LENGTH: usize = 512;

/// Validate a display name: non-blank and within [`MAX_NAME_LENGTH`].
pub fn validate_name(field: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "description must not exceed {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a `#RRGGBB` or `#RRGGBBAA` color.
pub fn validate_color(color: &str) -> Result<(), CoreError> {
    let hex = color.strip_prefix('#').unwrap_or_default();
    let ok = matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Expected #RRGGBB or #RRGGBBAA"
        )))
    }
}

pub fn validate_push_token(token: &str) -> Result<(), CoreError> {
    if token.trim().is_empty() || token.len() > MAX_PUSH_TOKEN_LENGTH {
        return Err(CoreError::Validation(format!(
            "push token must be 1..={MAX_PUSH_TOKEN_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn names() {
        assert!(validate_name("name", "Kitchen").is_ok());
        assert_matches!(validate_name("name", "   "), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_name("title", &"a".repeat(MAX_NAME_LENGTH + 1)),
            Err(CoreError::Validation(msg)) if msg.starts_with("title")
        );
    }

    #[test]
    fn colors() {
        assert!(validate_color("#a1B2c3").is_ok());
        assert!(validate_color("#a1B2c3ff").is_ok());
        assert!(validate_color("a1b2c3").is_err());
        assert!(validate_color("#12345").is_err());
        assert!(validate_color("#gggggg").is_err());
    }

    #[test]
    fn push_tokens() {
        assert!(validate_push_token("ExponentPushToken[abc]").is_ok());
        assert!(validate_push_token("").is_err());
        assert!(validate_push_token(&"x".repeat(MAX_PUSH_TOKEN_LENGTH + 1)).is_err());
    }

    #[test]
    fn descriptions() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"d".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
    }
}
