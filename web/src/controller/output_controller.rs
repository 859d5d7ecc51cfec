use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::operator::Operator;
use crate::params::output::{CreateParams, UpdateParams};
use crate::params::OwnerParams;
use crate::{AppState, Error};
use domain::{output_config as OutputApi, outputs, Id};
use log::*;

/// POST create a new output. API keys are write-only and never returned.
#[utoipa::path(
    post,
    path = "/outputs",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new output", body = outputs::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
    ),
    security(
        ("operator_key" = [])
    )
)]
pub async fn create(
    _operator: Operator,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST Create a new {} Output for user {}",
        params.output_kind, params.user_id
    );

    let output = OutputApi::create(app_state.store.as_ref(), params.into()).await?;

    debug!("New Output: {}", output.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), output)),
    ))
}

/// GET all outputs, optionally for one owner
#[utoipa::path(
    get,
    path = "/outputs",
    params(OwnerParams),
    responses(
        (status = 200, description = "Successfully retrieved outputs", body = [outputs::Model]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("operator_key" = [])
    )
)]
pub async fn index(
    _operator: Operator,
    State(app_state): State<AppState>,
    Query(params): Query<OwnerParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Outputs");
    debug!("Filter Params: {params:?}");

    let outputs = OutputApi::find_by(app_state.store.as_ref(), params.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), outputs)))
}

/// GET a particular output specified by its id
#[utoipa::path(
    get,
    path = "/outputs/{id}",
    params(
        ("id" = String, Path, description = "Output id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a specific output by its id", body = outputs::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Output not found"),
    ),
    security(
        ("operator_key" = [])
    )
)]
pub async fn read(
    _operator: Operator,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Output by id: {id}");

    let output = OutputApi::find_by_id(app_state.store.as_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), output)))
}

/// PATCH update an output's configuration. The owner cannot change.
#[utoipa::path(
    patch,
    path = "/outputs/{id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Id of output to update"),
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated an output", body = outputs::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Output not found"),
        (status = 422, description = "Unprocessable Entity"),
    ),
    security(
        ("operator_key" = [])
    )
)]
pub async fn update(
    _operator: Operator,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PATCH Output with id: {id}");

    let output = OutputApi::update(app_state.store.as_ref(), id, params.into()).await?;

    debug!("Updated Output: {}", output.id);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), output)))
}
