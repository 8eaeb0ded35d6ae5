//! Request payloads for the user routes and their validation rules.
//!
//! Payload fields are optional at the serde level so that missing or empty
//! values produce readable messages instead of a generic deserialization
//! failure. Every rule is checked and all failures are reported together.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

const MIN_PASSWORD_LEN: usize = 6;

/// One or more rule violations, displayed as a comma-separated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub Vec<String>);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SignupRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
    /// Topic tags used to filter the news feed.
    pub preferences: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub preferences: Vec<String>,
}

impl SignupRequest {
    pub fn validate(self) -> Result<SignupInput, ValidationError> {
        let mut errors = Vec::new();

        let name = match string_field("name", self.name.as_ref(), &mut errors) {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    errors.push("Name is required".to_string());
                }
                name.to_string()
            }
            None => String::new(),
        };
        let email = check_email(self.email.as_ref(), &mut errors);
        let password = check_password(self.password.as_ref(), MIN_PASSWORD_LEN, &mut errors);

        let preferences = match self.preferences {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => string_array(value).unwrap_or_else(|| {
                errors.push("Preferences must be an array of strings".to_string());
                Vec::new()
            }),
        };

        if errors.is_empty() {
            Ok(SignupInput {
                name,
                email,
                password,
                preferences,
            })
        } else {
            Err(ValidationError(errors))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<LoginInput, ValidationError> {
        let mut errors = Vec::new();
        let email = check_email(self.email.as_ref(), &mut errors);
        let password = check_password(self.password.as_ref(), 0, &mut errors);

        if errors.is_empty() {
            Ok(LoginInput { email, password })
        } else {
            Err(ValidationError(errors))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PreferencesRequest {
    pub preferences: Option<Value>,
}

impl PreferencesRequest {
    pub fn validate(self) -> Result<Vec<String>, ValidationError> {
        match self.preferences {
            None | Some(Value::Null) => Err(ValidationError(vec![
                "Preferences are required".to_string(),
            ])),
            Some(value @ Value::Array(_)) => string_array(value).ok_or_else(|| {
                ValidationError(vec!["Preferences must contain only strings".to_string()])
            }),
            Some(_) => Err(ValidationError(vec![
                "Preferences must be an array".to_string(),
            ])),
        }
    }
}

/// String content of a payload field. A present non-string value records a
/// type error and yields `None`; an absent or `null` field yields `Some("")`.
fn string_field<'a>(
    field: &str,
    raw: Option<&'a Value>,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match raw {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(text)) => Some(text.as_str()),
        Some(_) => {
            errors.push(format!("\"{field}\" must be a string"));
            None
        }
    }
}

fn check_email(raw: Option<&Value>, errors: &mut Vec<String>) -> String {
    let Some(email) = string_field("email", raw, errors) else {
        return String::new();
    };
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !EMAIL_PATTERN.is_match(&email) {
        errors.push("Invalid email format".to_string());
    }
    email
}

fn check_password(raw: Option<&Value>, min_len: usize, errors: &mut Vec<String>) -> String {
    let Some(password) = string_field("password", raw, errors) else {
        return String::new();
    };
    if password.is_empty() {
        errors.push("Password is required".to_string());
    } else if password.chars().count() < min_len {
        errors.push(format!(
            "Password must be at least {min_len} characters"
        ));
    }
    password.to_string()
}

fn string_array(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup(value: Value) -> Result<SignupInput, ValidationError> {
        serde_json::from_value::<SignupRequest>(value)
            .expect("payload deserializes")
            .validate()
    }

    #[test]
    fn signup_normalizes_fields() {
        let input = signup(json!({
            "name": "  Clark Kent ",
            "email": " Clark@Superman.COM ",
            "password": "Krypt0n",
            "preferences": ["movies", "comics"],
            "role": "admin"
        }))
        .expect("valid signup");

        assert_eq!(input.name, "Clark Kent");
        assert_eq!(input.email, "clark@superman.com");
        assert_eq!(input.password, "Krypt0n");
        assert_eq!(input.preferences, vec!["movies", "comics"]);
    }

    #[test]
    fn signup_defaults_preferences_to_empty() {
        let input = signup(json!({
            "name": "Bruce",
            "email": "bruce@wayne.com",
            "password": "batcave"
        }))
        .expect("valid signup");
        assert!(input.preferences.is_empty());
    }

    #[test]
    fn signup_reports_every_failure() {
        let err = signup(json!({"name": "   ", "email": "not-an-email", "password": "123"}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Name is required, Invalid email format, Password must be at least 6 characters"
        );
    }

    #[test]
    fn signup_requires_all_fields() {
        let err = signup(json!({})).unwrap_err();
        assert_eq!(
            err.0,
            vec!["Name is required", "Email is required", "Password is required"]
        );
    }

    #[test]
    fn signup_reports_wrong_field_types_per_field() {
        let err = signup(json!({"name": 5, "email": true, "password": "batcave"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"name\" must be a string, \"email\" must be a string"
        );

        let err = serde_json::from_value::<LoginRequest>(json!({"email": "a@b.co", "password": 123456}))
            .expect("payload deserializes")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "\"password\" must be a string");
    }

    #[test]
    fn signup_rejects_non_string_preferences() {
        let err = signup(json!({
            "name": "Diana",
            "email": "diana@themyscira.org",
            "password": "lasso123",
            "preferences": ["history", 42]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Preferences must be an array of strings");
    }

    #[test]
    fn login_requires_email_and_password() {
        let err = serde_json::from_value::<LoginRequest>(json!({"email": ""}))
            .expect("payload deserializes")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is required, Password is required");

        let ok = LoginRequest {
            email: Some("A@B.co".into()),
            password: Some("x".into()),
        }
        .validate()
        .expect("short passwords are fine for login");
        assert_eq!(ok.email, "a@b.co");
    }

    #[test]
    fn preferences_update_rules() {
        let missing = PreferencesRequest::default().validate().unwrap_err();
        assert_eq!(missing.to_string(), "Preferences are required");

        let not_array = PreferencesRequest {
            preferences: Some(json!("movies")),
        }
        .validate()
        .unwrap_err();
        assert_eq!(not_array.to_string(), "Preferences must be an array");

        let ok = PreferencesRequest {
            preferences: Some(json!(["movies", "comics", "games"])),
        }
        .validate()
        .expect("valid preferences");
        assert_eq!(ok, vec!["movies", "comics", "games"]);

        let empty = PreferencesRequest {
            preferences: Some(json!([])),
        }
        .validate()
        .expect("empty list allowed");
        assert!(empty.is_empty());
    }
}
