use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::selection::SelectionRecord;
use crate::selections::SaveAck;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SelectionsResponse {
    pub selections: Vec<SelectionRecord>,
}

/// POST /selections
pub async fn handle_save_selections(
    State(state): State<AppState>,
    payload: Result<Json<Vec<SelectionRecord>>, JsonRejection>,
) -> Result<Json<SaveAck>, AppError> {
    let Json(records) = payload?;
    let ack = state.selections.save_selections(records).await?;
    Ok(Json(ack))
}

/// GET /selections
pub async fn handle_load_selections(
    State(state): State<AppState>,
) -> Result<Json<SelectionsResponse>, AppError> {
    let selections = state.selections.load_selections().await?;
    Ok(Json(SelectionsResponse { selections }))
}
