//! Custom field rules shared by the `validator` derives on input forms.

use std::borrow::Cow;
use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Names are letters and spaces only.
pub fn letters_and_spaces(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        Ok(())
    } else {
        Err(failure(
            "letters_and_spaces",
            "Name can only contain letters and spaces",
        ))
    }
}

/// The domain must contain a dot and end in a top-level label of at least two
/// letters, so `grace@localhost` is rejected.
pub fn dotted_domain(value: &str) -> Result<(), ValidationError> {
    let valid = value.rsplit_once('@').is_some_and(|(_, domain)| {
        domain.rsplit_once('.').is_some_and(|(host, tld)| {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        })
    });
    if valid {
        Ok(())
    } else {
        Err(failure("email_domain", "Please enter a valid email address"))
    }
}

pub fn digits_only(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(failure("digits", "Must contain only digits"))
    }
}

/// `MM/YY` with a month between 01 and 12. Whether the date has passed is
/// checked separately because it depends on the clock.
pub fn expiry_format(value: &str) -> Result<(), ValidationError> {
    if parse_expiry(value).is_some() {
        Ok(())
    } else {
        Err(failure("expiry", "Please enter expiry in MM/YY format"))
    }
}

/// Splits `MM/YY` into `(year, month)`, with two-digit years in the 2000s.
pub fn parse_expiry(value: &str) -> Option<(i32, u32)> {
    let (mm, yy) = value.split_once('/')?;
    if mm.len() != 2 || yy.len() != 2 {
        return None;
    }
    digits_only(mm).ok()?;
    digits_only(yy).ok()?;
    let month: u32 = mm.parse().ok()?;
    let year: i32 = yy.parse().ok()?;
    (1..=12).contains(&month).then_some((2000 + year, month))
}

/// Profile images are referenced by file name and must look like a picture.
pub fn image_file_name(value: &str) -> Result<(), ValidationError> {
    const ALLOWED: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
    let allowed = value
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ALLOWED.contains(&ext.to_ascii_lowercase().as_str()))
        && !value.contains(['/', '\\']);
    if allowed {
        Ok(())
    } else {
        Err(failure(
            "image_file_name",
            "Only image files (JPG, PNG, GIF) are allowed",
        ))
    }
}
