//! Phone record endpoints
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | /phone/{phone} | 200 + record |
//! | POST | /phone | 201 + record |
//! | PUT | /phone/{phone} | 200 + record |
//! | DELETE | /phone/{phone} | 204 |

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::correlation::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreatePhoneAddressRequest, PhoneAddressRecord, UpdateAddressRequest};
use crate::AppState;

/// GET /phone/{phone}
pub async fn get_phone(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PhoneAddressRecord>> {
    let Path(phone) = path.map_err(bad_path)?;

    state
        .service
        .get_address(&ctx, &phone)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&phone))
}

/// POST /phone
pub async fn create_phone(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreatePhoneAddressRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PhoneAddressRecord>)> {
    let Json(request) = payload.map_err(bad_body)?;

    let record = state
        .service
        .create_record(&ctx, &request.phone, &request.address)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /phone/{phone}
pub async fn update_phone(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> ApiResult<Json<PhoneAddressRecord>> {
    let Path(phone) = path.map_err(bad_path)?;
    let Json(request) = payload.map_err(bad_body)?;

    state
        .service
        .update_address(&ctx, &phone, &request.address)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&phone))
}

/// DELETE /phone/{phone}
pub async fn delete_phone(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(phone) = path.map_err(bad_path)?;

    if state.service.delete_record(&ctx, &phone).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&phone))
    }
}

fn not_found(phone: &str) -> ApiError {
    ApiError::NotFound(format!("Phone number {} not found", phone.trim()))
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
}

fn bad_path(rejection: PathRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid phone in path: {}", rejection.body_text()))
}

/// Build phone record routes
pub fn phone_routes() -> Router<AppState> {
    Router::new()
        .route("/phone", post(create_phone))
        .route(
            "/phone/:phone",
            get(get_phone).put(update_phone).delete(delete_phone),
        )
}
