// src/api/handlers/grading.rs
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::Serialize;

use crate::api::AppState;
use crate::errors::GradeError;
use crate::models::{ApiError, ModelCandidate, Submission};
use crate::runner;

#[derive(Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<ModelCandidate>,
}

/// POST /api/v1/grade - Grade one submission
pub async fn grade(
    state: web::Data<AppState>,
    req: web::Json<Submission>,
) -> Result<HttpResponse> {
    let submission = req.into_inner();

    match runner::grade_submission(
        &state.config,
        state.candidates.as_ref(),
        &state.provider,
        &submission,
    )
    .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => {
            log::error!("Grading failed ({}): {}", e.kind(), e);
            Ok(HttpResponse::build(error_status(&e)).json(ApiError::from(&e)))
        }
    }
}

/// GET /api/v1/candidates - Resolve the model candidates grading would use
pub async fn get_candidates(state: web::Data<AppState>) -> Result<HttpResponse> {
    match runner::list_candidates(state.candidates.as_ref()).await {
        Ok(candidates) => Ok(HttpResponse::Ok().json(CandidatesResponse { candidates })),
        Err(e) => {
            log::error!("Candidate resolution failed: {}", e);
            Ok(HttpResponse::build(error_status(&e)).json(ApiError::from(&e)))
        }
    }
}

/// Renders request bodies that fail to deserialize as an `InvalidSubmission`
/// error body instead of actix's plain-text 400.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let grade_err = GradeError::InvalidSubmission(err.to_string());
    log::warn!("Rejected request body: {}", grade_err);
    let response = HttpResponse::build(error_status(&grade_err)).json(ApiError::from(&grade_err));
    InternalError::from_response(err, response).into()
}

pub fn error_status(err: &GradeError) -> StatusCode {
    match err {
        GradeError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
        GradeError::EndpointUnavailable { .. } | GradeError::ConfigurationMissing(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GradeError::NoCandidates
        | GradeError::AllCandidatesFailed { .. }
        | GradeError::EmptyResponse
        | GradeError::NoJsonBlockFound { .. }
        | GradeError::MalformedJson { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
