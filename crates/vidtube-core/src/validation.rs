//! Field validation helpers shared by request handlers.

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field is missing or only whitespace.
    #[error("{0} is required")]
    Required(&'static str),

    /// Field is present but malformed.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    /// Field exceeds its maximum length (in characters).
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Return the trimmed value, or `Required` if it is missing or blank.
pub fn require_non_blank<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Required(field)),
    }
}

/// Usernames are stored lower-cased without surrounding whitespace.
pub fn normalize_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim().to_lowercase();
    if username.is_empty() {
        return Err(ValidationError::Required("username"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::Invalid {
            field: "username",
            reason: "must not contain whitespace",
        });
    }
    Ok(username)
}

/// Lower-case an email and check it has the `local@domain` shape.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    let mut parts = email.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::Invalid {
            field: "email",
            reason: "must look like name@domain",
        });
    }
    Ok(email)
}

/// Reject values longer than `max` characters.
pub fn check_max_chars(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Escape regex metacharacters so user input matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_blank_trims() {
        assert_eq!(require_non_blank(Some("  hi "), "content").unwrap(), "hi");
    }

    #[test]
    fn require_non_blank_rejects_missing_and_blank() {
        assert_eq!(
            require_non_blank(None, "title"),
            Err(ValidationError::Required("title"))
        );
        assert_eq!(
            require_non_blank(Some("   "), "title"),
            Err(ValidationError::Required("title"))
        );
    }

    #[test]
    fn username_is_lowercased() {
        assert_eq!(normalize_username("  ChaiCode ").unwrap(), "chaicode");
        assert!(normalize_username("two words").is_err());
        assert!(normalize_username("").is_err());
    }

    #[test]
    fn email_shape() {
        assert_eq!(normalize_email("A@B.io").unwrap(), "a@b.io");
        assert!(normalize_email("nope").is_err());
        assert!(normalize_email("@domain").is_err());
        assert!(normalize_email("a@b@c").is_err());
        assert!(normalize_email("a b@c").is_err());
    }

    #[test]
    fn max_chars_counts_characters() {
        assert!(check_max_chars("héllo", "content", 5).is_ok());
        assert_eq!(
            check_max_chars("hello!", "content", 5),
            Err(ValidationError::TooLong {
                field: "content",
                max: 5
            })
        );
    }

    #[test]
    fn escape_regex_metacharacters() {
        assert_eq!(escape_regex("a.b*c"), r"a\.b\*c");
        assert_eq!(escape_regex("(rust)"), r"\(rust\)");
        assert_eq!(escape_regex("plain title"), "plain title");
    }
}
