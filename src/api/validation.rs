use regex::Regex;
use std::sync::OnceLock;

use super::report::ReportForm;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

/// Loose `local@domain.tld` shape. Intentionally permissive.
pub fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_match(email)
}

/// At least 10 characters drawn from digits, spaces, hyphens, parens, plus.
pub fn is_valid_phone(phone: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[\d\s\-\+\(\)]{10,}$").is_match(phone)
}

const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Every violated password rule, accumulated.
pub fn password_errors(password: &str, confirm_password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password != confirm_password {
        errors.push("Password and Confirm Password do not match".to_string());
    }

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        errors.push("Password must contain both letters and numbers".to_string());
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        errors.push("Password must include at least one special character".to_string());
    }

    errors
}

/// Registration form checks minus the uniqueness probe, which needs the
/// store and stays with the account service.
pub fn registration_errors(
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Vec<String> {
    let mut errors = Vec::new();

    if full_name.trim().is_empty() {
        errors.push("Full name is required.".to_string());
    }

    if email.is_empty() {
        errors.push("Email address is required.".to_string());
    } else if !is_valid_email(email) {
        errors.push("Please enter a valid email address.".to_string());
    }

    errors.extend(password_errors(password, confirm_password));

    errors
}

/// Report form checks, all evaluated before any is reported.
pub fn report_errors(form: &ReportForm) -> Vec<String> {
    let mut errors = Vec::new();

    if form.first_name.chars().count() < 2 {
        errors.push("First name is required and must be at least 2 characters.".to_string());
    }

    if form.last_name.chars().count() < 2 {
        errors.push("Last name is required and must be at least 2 characters.".to_string());
    }

    if form.email.is_empty() {
        errors.push("Email address is required.".to_string());
    } else if !is_valid_email(&form.email) {
        errors.push("Please enter a valid email address.".to_string());
    }

    if !form.phone.is_empty() && !is_valid_phone(&form.phone) {
        errors.push("Please enter a valid phone number.".to_string());
    }

    if form.subject.is_empty() {
        errors.push("Please select a subject.".to_string());
    }

    let message_len = form.message.chars().count();
    if message_len < 10 {
        errors.push("Message is required and must be at least 10 characters.".to_string());
    } else if message_len > 1000 {
        errors.push("Message cannot exceed 1000 characters.".to_string());
    }

    if !form.privacy {
        errors.push("You must agree to the Privacy Policy and Terms of Use.".to_string());
    }

    errors
}
