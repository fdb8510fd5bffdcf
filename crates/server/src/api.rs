//! HTTP surface for the product catalog, mounted under `/api/produtos`.
//!
//! Handlers only translate between wire shapes and transfer objects and pick
//! status codes; every rule lives in [`ProductService`].

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use catalog_core::domain::product::ProductId;
use catalog_core::dto::ProductDto;
use catalog_core::errors::{ApplicationError, InterfaceError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::service::ProductService;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    service: Arc<ProductService>,
}

/// Body accepted by create and update. An `id` in the payload is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
    correlation_id: String,
}

impl From<ProductRequest> for ProductDto {
    fn from(request: ProductRequest) -> Self {
        Self {
            id: None,
            name: request.name,
            quantity: request.quantity,
            price: request.price,
            notes: request.notes,
        }
    }
}

impl From<ProductDto> for ProductResponse {
    fn from(dto: ProductDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            quantity: dto.quantity,
            price: dto.price,
            notes: dto.notes,
        }
    }
}

/// Error leaving a handler, rendered as a JSON body with a matching status.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }

    fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::bad_request(message, correlation_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(
                event_name = "catalog.api.error",
                correlation_id = %self.0.correlation_id(),
                error = %self.0,
                "product request failed"
            );
        } else {
            warn!(
                event_name = "catalog.api.rejected",
                correlation_id = %self.0.correlation_id(),
                status = status.as_u16(),
                error = %self.0,
                "product request rejected"
            );
        }

        let body = ErrorBody {
            error: self.0.user_message(),
            detail: self.0.message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(service: Arc<ProductService>) -> Router {
    Router::new()
        .route("/api/produtos", get(list_products).post(create_product))
        .route(
            "/api/produtos/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(ApiState { service })
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn product_id(
    path: Result<Path<i64>, PathRejection>,
    correlation_id: &str,
) -> Result<ProductId, ApiError> {
    path.map(|Path(id)| ProductId(id))
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), correlation_id))
}

fn request_body(
    payload: Result<Json<ProductRequest>, JsonRejection>,
    correlation_id: &str,
) -> Result<ProductRequest, ApiError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), correlation_id))
}

async fn list_products(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let products = state
        .service
        .list_all()
        .await
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

async fn get_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let id = product_id(path, &correlation_id)?;
    let product = state
        .service
        .get_by_id(id)
        .await
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    Ok(Json(ProductResponse::from(product)))
}

async fn create_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let request = request_body(payload, &correlation_id)?;
    let created = state
        .service
        .create(ProductDto::from(request))
        .await
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(created))))
}

async fn update_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let id = product_id(path, &correlation_id)?;
    let request = request_body(payload, &correlation_id)?;
    let updated = state
        .service
        .update(id, ProductDto::from(request))
        .await
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    Ok(Json(ProductResponse::from(updated)))
}

async fn delete_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = correlation_id(&headers);
    let id = product_id(path, &correlation_id)?;
    state
        .service
        .delete(id)
        .await
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    Ok(StatusCode::NO_CONTENT)
}
