//! Stock rules for [`FormValidator`](super::FormValidator) chains.
//!
//! Every rule except [`required`] and [`password`] accepts an empty value, so a
//! field is only mandatory when its chain starts with `required()`.

use regex::Regex;
use std::sync::LazyLock;

use super::Rule;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{10,}$").expect("valid phone regex"));

pub const PASSWORD_MIN_LENGTH: usize = 8;

pub fn required() -> Rule {
    Box::new(|value| value.trim().is_empty().then(|| "This field is required".to_string()))
}

pub fn email() -> Rule {
    Box::new(|value| {
        (!value.is_empty() && !EMAIL_RE.is_match(value.trim()))
            .then(|| "Please enter a valid email address".to_string())
    })
}

pub fn min_length(min: usize) -> Rule {
    Box::new(move |value| {
        (!value.is_empty() && value.chars().count() < min)
            .then(|| format!("Must be at least {min} characters"))
    })
}

pub fn max_length(max: usize) -> Rule {
    Box::new(move |value| {
        (value.chars().count() > max).then(|| format!("Must be no more than {max} characters"))
    })
}

/// At least eight characters with an uppercase letter, a lowercase letter,
/// a digit and a special character. Empty input fails.
pub fn password() -> Rule {
    Box::new(|value| {
        if value.chars().count() < PASSWORD_MIN_LENGTH {
            return Some(format!(
                "Password must be at least {PASSWORD_MIN_LENGTH} characters"
            ));
        }
        if !value.chars().any(|c| c.is_uppercase()) {
            return Some("Password must contain at least one uppercase letter".to_string());
        }
        if !value.chars().any(|c| c.is_lowercase()) {
            return Some("Password must contain at least one lowercase letter".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_digit()) {
            return Some("Password must contain at least one number".to_string());
        }
        if !value
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            return Some("Password must contain at least one special character".to_string());
        }
        None
    })
}

/// Matches the value against the password the user typed first.
pub fn confirm_password(original: impl Into<String>) -> Rule {
    let original = original.into();
    Box::new(move |value| (value != original).then(|| "Passwords do not match".to_string()))
}

pub fn phone() -> Rule {
    Box::new(|value| {
        (!value.is_empty() && !PHONE_RE.is_match(value.trim()))
            .then(|| "Please enter a valid phone number".to_string())
    })
}

/// Absolute `http` or `https` URL.
pub fn url() -> Rule {
    Box::new(|value| {
        if value.is_empty() {
            return None;
        }
        match url::Url::parse(value.trim()) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => None,
            _ => Some("Please enter a valid URL".to_string()),
        }
    })
}

pub fn numeric() -> Rule {
    Box::new(|value| {
        (!value.is_empty() && value.trim().parse::<f64>().map_or(true, |n| !n.is_finite()))
            .then(|| "Must be a number".to_string())
    })
}

pub fn one_of(allowed: &[&str]) -> Rule {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    Box::new(move |value| {
        (!value.is_empty() && !allowed.iter().any(|a| a == value))
            .then(|| format!("Must be one of: {}", allowed.join(", ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rule: &Rule, value: &str) -> Option<String> {
        rule(value)
    }

    #[test]
    fn required_rejects_blank() {
        let rule = required();
        assert!(check(&rule, "").is_some());
        assert!(check(&rule, "   ").is_some());
        assert!(check(&rule, "x").is_none());
    }

    #[test]
    fn email_shapes() {
        let rule = email();
        assert!(check(&rule, "jia@example.com").is_none());
        assert!(check(&rule, "").is_none());
        assert!(check(&rule, "jia@example").is_some());
        assert!(check(&rule, "jia example@x.com").is_some());
        assert!(check(&rule, "@example.com").is_some());
    }

    #[test]
    fn password_requires_every_class() {
        let rule = password();
        assert!(check(&rule, "Str0ng!pw").is_none());

        let too_short = check(&rule, "S0!a").unwrap();
        assert!(too_short.contains("at least 8"));
        assert!(check(&rule, "").unwrap().contains("at least 8"));
        assert!(check(&rule, "str0ng!pw").unwrap().contains("uppercase"));
        assert!(check(&rule, "STR0NG!PW").unwrap().contains("lowercase"));
        assert!(check(&rule, "Strong!pw").unwrap().contains("number"));
        assert!(check(&rule, "Str0ngpw1").unwrap().contains("special"));
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // 7 characters, more than 8 bytes
        assert!(check(&password(), "Ää1!aaa").unwrap().contains("at least 8"));
    }

    #[test]
    fn confirm_password_compares_exactly() {
        let rule = confirm_password("Str0ng!pw");
        assert!(check(&rule, "Str0ng!pw").is_none());
        assert_eq!(
            check(&rule, "str0ng!pw").as_deref(),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn lengths_count_characters() {
        assert!(check(&min_length(3), "ab").is_some());
        assert!(check(&min_length(3), "").is_none());
        assert!(check(&min_length(3), "abc").is_none());
        assert!(check(&max_length(3), "abcd").is_some());
        assert!(check(&max_length(3), "äöü").is_none());
    }

    #[test]
    fn phone_url_numeric_one_of() {
        assert!(check(&phone(), "+1 (555) 123-4567").is_none());
        assert!(check(&phone(), "12345").is_some());
        assert!(check(&url(), "https://northwind.dev/careers").is_none());
        assert!(check(&url(), "ftp://northwind.dev").is_some());
        assert!(check(&url(), "northwind.dev").is_some());
        assert!(check(&numeric(), "120000").is_none());
        assert!(check(&numeric(), "12.5").is_none());
        assert!(check(&numeric(), "lots").is_some());
        assert!(check(&numeric(), "NaN").is_some());
        let roles = one_of(&["job_seeker", "employer"]);
        assert!(check(&roles, "employer").is_none());
        assert!(check(&roles, "admin").is_some());
    }
}
