use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::QueryRejection,
    extract::{Multipart, Query, State},
    response::{Html, IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::validation::{validate_form, validate_image_extension, MISSING_FIELDS};
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::schemas::grade::{GradeResponse, ReportFormat, SubmitQuery};
use crate::services::grading::{grade_sketch, GradeReport};
use crate::services::report::render_html;
use crate::services::uploads::TempUpload;


#[derive(Debug, Default)]
struct RawSubmission {
    name: Option<String>,
    email: Option<String>,
    image: Option<RawImage>,
}

#[derive(Debug)]
struct RawImage {
    filename: String,
    bytes: Vec<u8>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/submit", post(submit))
}

async fn submit(
    State(state): State<AppState>,
    query: Result<Query<SubmitQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let multipart =
        multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let storage = state.settings().storage();
    let raw = read_submission(multipart, storage.max_upload_bytes(), storage.max_upload_size_mb)
        .await?;

    let form = validate_form(raw.name, raw.email)?;
    let image = raw.image.ok_or_else(|| ApiError::bad_request(MISSING_FIELDS))?;
    if image.filename.trim().is_empty() {
        return Err(ApiError::bad_request("No image selected"));
    }
    let extension = validate_image_extension(&image.filename, &storage.allowed_image_extensions)?;
    if image.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded image is empty"));
    }

    let upload = TempUpload::persist(&storage.upload_dir, &extension, &image.bytes)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}"), "Failed to store upload"))?;
    drop(image);

    let payload = upload
        .load_payload()
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}"), "Failed to read upload"))?;

    let (normalized, outcome) =
        grade_sketch(state.provider(), state.settings().rubric().prompt(), &payload).await;
    upload.cleanup();

    let report = GradeReport::new(form.name, form.email, normalized, now_utc());
    tracing::info!(
        provider = state.provider().name(),
        outcome = outcome.as_str(),
        total = report.total(),
        format = ?query.format,
        "Submission graded"
    );

    let response = match query.format {
        ReportFormat::Json => Json(GradeResponse::from(&report)).into_response(),
        ReportFormat::Html => Html(render_html(&report)).into_response(),
    };
    Ok(response)
}

async fn read_submission(
    mut multipart: Multipart,
    max_bytes: u64,
    max_mb: u64,
) -> Result<RawSubmission, ApiError> {
    let mut raw = RawSubmission::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "name" | "email" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Invalid {name} field")))?;
                if name == "name" {
                    raw.name = Some(text);
                } else {
                    raw.email = Some(text);
                }
            }
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read image"))?
                {
                    if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                        return Err(ApiError::BadRequest(format!(
                            "Image exceeds {max_mb}MB limit"
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                raw.image = Some(RawImage { filename, bytes });
            }
            _ => {}
        }
    }

    Ok(raw)
}
