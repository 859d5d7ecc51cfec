use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::operator::Operator;
use crate::params::user::CreateParams;
use crate::{AppState, Error};
use domain::{user as UserApi, users};
use log::*;

/// POST create a new operator account that can own lists and outputs
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new user", body = users::Model),
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
    debug!("POST Create a new User: {}", params.name);

    let user = UserApi::create(app_state.store.as_ref(), &params.name).await?;

    debug!("New User: {user:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}

/// GET all users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Successfully retrieved all users", body = [users::Model]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("operator_key" = [])
    )
)]
pub async fn index(
    _operator: Operator,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Users");

    let users = UserApi::find_all(app_state.store.as_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}
