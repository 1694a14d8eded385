use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::report_errors;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageDto};
use crate::db::NewReport;

/// The submitted form, echoed back verbatim on rejection so the caller can
/// repopulate fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub address: String,
    pub message: String,
    pub newsletter: bool,
    pub privacy: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportRejection {
    pub form_data: ReportForm,
}

/// GET /report
pub async fn report_page() -> Json<ApiResponse<PageDto>> {
    Json(ApiResponse::success(PageDto {
        slug: "report",
        title: "Report a Problem",
    }))
}

/// POST /report
/// Validates everything before touching the database; a rejection carries
/// every error plus the submitted values.
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReportForm>,
) -> Result<Response, ApiError> {
    let form = ReportForm {
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        subject: payload.subject,
        address: payload.address.trim().to_string(),
        message: payload.message.trim().to_string(),
        newsletter: payload.newsletter,
        privacy: payload.privacy,
    };

    let errors = report_errors(&form);
    if !errors.is_empty() {
        let body = ApiResponse {
            success: false,
            data: Some(ReportRejection { form_data: form }),
            error: Some(errors.join(" ")),
            errors: Some(errors),
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let report = NewReport {
        name: format!("{} {}", form.first_name, form.last_name),
        email: form.email,
        phone: form.phone,
        address: form.address,
        subject: form.subject,
        message: form.message,
    };

    state.store().insert_report(report).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Thank you! Your message has been sent successfully. We will get back to you within 24 hours.",
    )))
    .into_response())
}
