//! Dispatch creation, lifecycle and listing endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use dispatch_domain::{Dispatch, DispatchFilter, DispatchStatus, PodDetails};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::response::{created, success, ApiResponse, PaginatedResponse};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDispatchRequest {
    pub area: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub status: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub area: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteDispatchRequest {
    pub pod_image: Option<String>,
    pub notes: Option<String>,
    pub recipient_name: Option<String>,
}

/// Pages are 1-based; page size is capped at 100.
fn page_window(page: Option<i64>, limit: Option<i64>) -> ApiResult<(i64, i64, i64)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(10);
    if page < 1 {
        return Err(ApiError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=100).contains(&limit) {
        return Err(ApiError::BadRequest(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    Ok(((page - 1) * limit, page, limit))
}

pub async fn create_dispatch(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<CreateDispatchRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Dispatch>>)> {
    let dispatch = state
        .dispatch_service
        .create(&request.area, request.description)
        .await?;
    Ok(created(dispatch))
}

pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Dispatch>>)> {
    let dispatch = state.dispatch_service.get(id).await?;
    Ok(success(dispatch))
}

pub async fn list_dispatches(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaginatedResponse<Dispatch>>>)> {
    let (skip, page, limit) = page_window(params.page, params.limit)?;
    let (items, total) = state.dispatch_service.page(skip, limit).await?;
    Ok(success(PaginatedResponse::new(items, total, page, limit)))
}

pub async fn filter_dispatches(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaginatedResponse<Dispatch>>>)> {
    let (skip, page, limit) = page_window(params.page, params.limit)?;

    let status = params
        .status
        .as_deref()
        .map(str::parse::<DispatchStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let criteria = DispatchFilter {
        status,
        date: params.date,
        area: params.area,
        ..Default::default()
    };
    let (items, total) = state
        .dispatch_service
        .page_filtered(criteria, skip, limit)
        .await?;
    Ok(success(PaginatedResponse::new(items, total, page, limit)))
}

pub async fn my_dispatches(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PageParams>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaginatedResponse<Dispatch>>>)> {
    let (skip, page, limit) = page_window(params.page, params.limit)?;
    let (items, total) = state
        .dispatch_service
        .page_by_owner(user.id, skip, limit)
        .await?;
    Ok(success(PaginatedResponse::new(items, total, page, limit)))
}

pub async fn accept_dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Dispatch>>)> {
    let dispatch = state.dispatch_service.accept(id, user.id).await?;
    Ok(success(dispatch))
}

pub async fn start_dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Dispatch>>)> {
    let dispatch = state.dispatch_service.start(id, user.id).await?;
    Ok(success(dispatch))
}

pub async fn complete_dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<CompleteDispatchRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Dispatch>>)> {
    let pod = PodDetails {
        pod_image: request.pod_image,
        notes: request.notes,
        recipient_name: request.recipient_name,
    };
    let dispatch = state.dispatch_service.complete(id, user.id, pod).await?;
    Ok(success(dispatch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults() {
        let (skip, page, limit) = page_window(None, None).unwrap();
        assert_eq!((skip, page, limit), (0, 1, 10));
    }

    #[test]
    fn page_window_computes_offset() {
        let (skip, page, limit) = page_window(Some(3), Some(20)).unwrap();
        assert_eq!((skip, page, limit), (40, 3, 20));
    }

    #[test]
    fn page_window_rejects_out_of_range() {
        assert!(page_window(Some(0), None).is_err());
        assert!(page_window(None, Some(0)).is_err());
        assert!(page_window(None, Some(101)).is_err());
    }
}
