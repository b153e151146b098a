//! Input validation for API requests.
//!
//! Single-field checks return `Result<(), String>` so handlers can feed them
//! into a `ValidationErrorBuilder` and report every bad field at once.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::db::{GoalTargets, ProfileUpdate, WorkoutInput, WorkoutRequest, WorkoutType};

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_NAME_LENGTH: usize = 30;
pub const MAX_NOTES_LENGTH: usize = 2000;
/// One workout cannot outlast a day
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

lazy_static! {
    /// Letters, digits and @ . + - _
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();

    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$"
    ).unwrap();
}

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "letmein", "welcome1", "admin123",
    "football", "baseball", "sunshine", "princess", "trustno1", "abc12345",
];

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username is too long (max {} characters)",
            MAX_USERNAME_LENGTH
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username may contain only letters, digits and @/./+/-/_ characters".to_string(),
        );
    }

    Ok(())
}

/// Email is optional; when given it must look like an address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Ok(());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Enter a valid email address".to_string());
    }

    Ok(())
}

/// All password problems, empty when acceptable
pub fn password_problems(
    password: &str,
    confirm: &str,
    username: &str,
    min_length: usize,
) -> Vec<String> {
    let mut problems = Vec::new();

    if password != confirm {
        problems.push("The two password fields didn't match".to_string());
    }

    if password.chars().count() < min_length {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters",
            min_length
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric".to_string());
    }

    let lower = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        problems.push("This password is too common".to_string());
    }

    let name = username.to_lowercase();
    if name.len() >= 3 && !lower.is_empty() && (lower.contains(&name) || name.contains(&lower)) {
        problems.push("The password is too similar to the username".to_string());
    }

    problems
}

fn validate_name(value: &str) -> Result<(), String> {
    if value.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Must be at most {} characters", MAX_NAME_LENGTH));
    }
    Ok(())
}

fn validate_positive(value: Option<f64>, max: f64, what: &str) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(format!("{} must be a positive number", what)),
        Some(v) if v > max => Err(format!("{} must be at most {}", what, max)),
        _ => Ok(()),
    }
}

fn validate_minutes(value: Option<i64>) -> Result<(), String> {
    match value {
        Some(v) if v < 0 => Err("Minutes cannot be negative".to_string()),
        _ => Ok(()),
    }
}

/// Personal sheet fields
pub fn validate_profile(profile: &ProfileUpdate) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("first_name", validate_name(&profile.first_name));
    errors.check("last_name", validate_name(&profile.last_name));

    if let Some(age) = profile.age {
        if !(0..=150).contains(&age) {
            errors.add("age", "Age must be between 0 and 150");
        }
    }

    errors.check("height_cm", validate_positive(profile.height_cm, 300.0, "Height"));
    errors.check("weight_kg", validate_positive(profile.weight_kg, 500.0, "Weight"));
    errors.finish()
}

/// Coach targets: weight positive, minutes zero or more
pub fn validate_goal_targets(targets: &GoalTargets) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check(
        "target_weight",
        validate_positive(targets.target_weight, 500.0, "Target weight"),
    );
    errors.check("target_running_minutes", validate_minutes(targets.target_running_minutes));
    errors.check("target_swimming_minutes", validate_minutes(targets.target_swimming_minutes));
    errors.check("target_cycling_minutes", validate_minutes(targets.target_cycling_minutes));
    errors.finish()
}

/// Check a create/edit body and turn it into typed input
pub fn validate_workout(req: &WorkoutRequest) -> Result<WorkoutInput, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let workout_type = match req.workout_type.parse::<WorkoutType>() {
        Ok(t) => Some(t),
        Err(e) => {
            errors.add("type", e.to_string());
            None
        }
    };

    if req.duration_minutes <= 0 {
        errors.add("duration_minutes", "Duration must be a positive number of minutes");
    } else if req.duration_minutes > MAX_DURATION_MINUTES {
        errors.add(
            "duration_minutes",
            format!("Duration must be at most {} minutes", MAX_DURATION_MINUTES),
        );
    }

    if req.notes.chars().count() > MAX_NOTES_LENGTH {
        errors.add(
            "notes",
            format!("Notes are too long (max {} characters)", MAX_NOTES_LENGTH),
        );
    }

    match (errors.build(), workout_type) {
        (Some(err), _) => Err(err),
        (None, Some(workout_type)) => Ok(WorkoutInput {
            workout_type,
            duration_minutes: req.duration_minutes,
            notes: req.notes.trim().to_string(),
        }),
        (None, None) => Err(ApiError::validation_field("type", "Workout type is required")),
    }
}
