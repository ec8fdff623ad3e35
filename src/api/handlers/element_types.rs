//! Element type catalogue handler.

use axum::{Json, extract::State};

use crate::api::state::AppState;
use crate::domain::{ApiResponse, ElementTypeResponse};

/// List the supported element types with their form metadata.
pub async fn list_element_types(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ElementTypeResponse>>> {
    Json(ApiResponse::success(state.custom_id_service.element_types()))
}
