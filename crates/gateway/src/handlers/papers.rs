//! Paper resource handlers
//!
//! Every store interaction funnels its error through `AppError`, so a
//! missing record answers 404 and anything else answers 400 with the
//! underlying message.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use pastpapers_common::{
    db::models::Paper,
    errors::{AppError, Result},
    metrics,
    papers::{PaperInput, PaperPatch},
};

/// Wire shape of a stored paper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperResponse {
    pub id: Uuid,
    pub unit_code: String,
    pub year_taken: String,
    pub unit_title: String,
    pub file_location: String,
    pub class_of_study: String,
}

impl From<Paper> for PaperResponse {
    fn from(paper: Paper) -> Self {
        Self {
            id: paper.id,
            unit_code: paper.unit_code,
            year_taken: paper.year_taken,
            unit_title: paper.unit_title,
            file_location: paper.file_location,
            class_of_study: paper.class_of_study,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Message returned after a successful delete
pub const PAPER_DELETED: &str = "Paper deleted successfully";

/// Unwrap a JSON body. A request without a JSON content type is read as an
/// empty object; any other rejection is a bad request.
fn json_body<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(AppError::InvalidBody {
            message: rejection.body_text(),
        }),
    }
}

/// Tag store failures in metrics before they propagate
fn store_failure(operation: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| {
        if err.is_store_error() {
            metrics::record_store_error(operation);
        }
        err
    }
}

fn into_responses(papers: Vec<Paper>) -> Vec<PaperResponse> {
    papers.into_iter().map(PaperResponse::from).collect()
}

/// Create a new paper
pub async fn create_paper(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PaperInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PaperResponse>)> {
    let paper = json_body(payload)?.into_new_paper()?;

    let created = state
        .store
        .create(paper)
        .await
        .map_err(store_failure("create"))?;

    tracing::info!(
        paper_id = %created.id,
        unit_code = %created.unit_code,
        year_taken = %created.year_taken,
        "Paper created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List every paper in store order
pub async fn list_papers(State(state): State<AppState>) -> Result<Json<Vec<PaperResponse>>> {
    let papers = state
        .store
        .find_all()
        .await
        .map_err(store_failure("find_all"))?;

    if papers.is_empty() {
        return Err(AppError::PapersNotFound { unit_code: None });
    }

    Ok(Json(into_responses(papers)))
}

/// Get the first paper matching a unit code and year
pub async fn get_paper(
    State(state): State<AppState>,
    Path((unit_code, year_taken)): Path<(String, String)>,
) -> Result<Json<PaperResponse>> {
    let paper = find_paper(&state, unit_code, year_taken).await?;
    Ok(Json(paper.into()))
}

/// List every paper for a unit code
pub async fn list_papers_by_unit(
    State(state): State<AppState>,
    Path(unit_code): Path<String>,
) -> Result<Json<Vec<PaperResponse>>> {
    let papers = state
        .store
        .find_by_unit_code(&unit_code)
        .await
        .map_err(store_failure("find_by_unit_code"))?;

    if papers.is_empty() {
        return Err(AppError::PapersNotFound {
            unit_code: Some(unit_code),
        });
    }

    Ok(Json(into_responses(papers)))
}

/// Patch the first paper matching a unit code and year
pub async fn update_paper(
    State(state): State<AppState>,
    Path((unit_code, year_taken)): Path<(String, String)>,
    payload: std::result::Result<Json<PaperPatch>, JsonRejection>,
) -> Result<Json<PaperResponse>> {
    let mut paper = find_paper(&state, unit_code, year_taken).await?;

    let patch = json_body(payload)?;
    let changed = patch.apply(&mut paper)?;

    // Not atomic with the lookup above; a concurrent delete surfaces as a store error
    let saved = state
        .store
        .save(paper)
        .await
        .map_err(store_failure("save"))?;

    tracing::info!(
        paper_id = %saved.id,
        changed = ?changed,
        "Paper updated"
    );

    Ok(Json(saved.into()))
}

/// Delete the first paper matching a unit code and year
pub async fn delete_paper(
    State(state): State<AppState>,
    Path((unit_code, year_taken)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    let paper = find_paper(&state, unit_code, year_taken).await?;

    let removed = state
        .store
        .delete(&paper)
        .await
        .map_err(store_failure("delete"))?;

    if removed {
        tracing::info!(paper_id = %paper.id, "Paper deleted");
    } else {
        tracing::warn!(paper_id = %paper.id, "Paper was already gone at delete time");
    }

    Ok(Json(MessageResponse {
        message: PAPER_DELETED.to_string(),
    }))
}

async fn find_paper(state: &AppState, unit_code: String, year_taken: String) -> Result<Paper> {
    let paper = state
        .store
        .find_one(&unit_code, &year_taken)
        .await
        .map_err(store_failure("find_one"))?;

    paper.ok_or(AppError::PaperNotFound {
        unit_code,
        year_taken,
    })
}
