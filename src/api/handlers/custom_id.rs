//! Custom ID configuration and generation handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};

use crate::api::state::AppState;
use crate::domain::{
    ApiResponse, ElementDraft, ElementsRequest, GenerateResponse, InventoryId,
    OptionalElementsRequest, PreviewResponse, SequenceResponse, StoredConfiguration,
    ValidationResponse,
};
use crate::error::{AppError, Result};

fn inventory_id(raw: String) -> Result<InventoryId> {
    InventoryId::parse(raw).map_err(AppError::BadRequest)
}

/// Element list of a request whose body may be empty.
fn optional_elements(body: &Bytes) -> Result<Option<Vec<ElementDraft>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: OptionalElementsRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?;
    Ok(request.elements)
}

// ============== Drafts ==============

/// Validate an element list as it would be saved.
///
/// # Errors
///
/// Returns every field error of an invalid list.
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ElementsRequest>,
) -> Result<Json<ApiResponse<ValidationResponse>>> {
    let response = state.custom_id_service.validate(&request.elements)?;
    Ok(Json(ApiResponse::success(response)))
}

/// Render an example identifier for an element list.
///
/// # Errors
///
/// Returns an error if the list does not render.
pub async fn preview(
    State(state): State<AppState>,
    Json(request): Json<ElementsRequest>,
) -> Result<Json<ApiResponse<PreviewResponse>>> {
    let preview = state.custom_id_service.preview(&request.elements).await?;
    Ok(Json(ApiResponse::success(PreviewResponse { preview })))
}

// ============== Inventory configuration ==============

/// Get the stored configuration of an inventory.
///
/// # Errors
///
/// Returns an error if nothing is stored.
pub async fn get_configuration(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<StoredConfiguration>>> {
    let id = inventory_id(raw_id)?;
    let stored = state.custom_id_service.get_configuration(&id).await?;
    Ok(Json(ApiResponse::success(stored)))
}

/// Validate and store the configuration of an inventory.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or storage fails.
pub async fn save_configuration(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(request): Json<ElementsRequest>,
) -> Result<Json<ApiResponse<StoredConfiguration>>> {
    let id = inventory_id(raw_id)?;
    let stored = state
        .custom_id_service
        .save_configuration(&id, &request.elements)
        .await?;
    Ok(Json(ApiResponse::success(stored)))
}

/// Delete the configuration of an inventory.
///
/// # Errors
///
/// Returns an error if nothing is stored.
pub async fn delete_configuration(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = inventory_id(raw_id)?;
    state.custom_id_service.delete_configuration(&id).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============== Inventory generation ==============

/// Render an example identifier for an inventory.
///
/// The body may carry `elements`; otherwise the stored configuration is used.
///
/// # Errors
///
/// Returns an error if no configuration is available or rendering fails.
pub async fn preview_for_inventory(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<PreviewResponse>>> {
    let id = inventory_id(raw_id)?;
    let elements = optional_elements(&body)?;
    let preview = state
        .custom_id_service
        .preview_for_inventory(&id, elements.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(PreviewResponse { preview })))
}

/// Generate the identifier of a new record of an inventory.
///
/// The body may carry `elements`; otherwise the stored configuration is used.
///
/// # Errors
///
/// Returns an error if no configuration is available, rendering fails, or
/// the sequence counter cannot be advanced.
pub async fn generate(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<GenerateResponse>>> {
    let id = inventory_id(raw_id)?;
    let elements = optional_elements(&body)?;
    let response = state
        .custom_id_service
        .generate(&id, elements.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Get the sequence counter state of an inventory.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn sequence(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<SequenceResponse>>> {
    let id = inventory_id(raw_id)?;
    let response = state.custom_id_service.sequence(&id).await?;
    Ok(Json(ApiResponse::success(response)))
}
