use std::path::Path;

use validator::Validate;

use crate::api::errors::ApiError;
use crate::schemas::grade::SubmissionForm;

pub(crate) const MISSING_FIELDS: &str = "Missing name, email, or image";

/// Trims and checks the text fields. Blank counts as missing.
pub(crate) fn validate_form(
    name: Option<String>,
    email: Option<String>,
) -> Result<SubmissionForm, ApiError> {
    let name = name.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
    let email = email.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

    let (Some(name), Some(email)) = (name, email) else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };

    let form = SubmissionForm { name, email };
    form.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(form)
}

/// Returns the lowercased extension if it is on the allow-list.
pub(crate) fn validate_image_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| ApiError::bad_request("Image file must have an extension"))?;

    if allowed_extensions.iter().any(|allowed| allowed == &extension) {
        Ok(extension)
    } else {
        Err(ApiError::BadRequest(format!(
            "File extension '.{extension}' is not allowed (allowed: {})",
            allowed_extensions.join(", ")
        )))
    }
}
