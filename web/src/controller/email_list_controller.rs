use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::operator::Operator;
use crate::params::email_list::CreateParams;
use crate::params::OwnerParams;
use crate::{AppState, Error};
use domain::{email_list as EmailListApi, email_lists};
use log::*;

/// POST create a new email list owned by an operator
#[utoipa::path(
    post,
    path = "/email-lists",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new email list", body = email_lists::Model),
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
    debug!("POST Create a new Email List for user {}", params.user_id);

    let list = EmailListApi::create(app_state.store.as_ref(), params.into()).await?;

    debug!("New Email List: {list:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), list)),
    ))
}

/// GET all email lists, optionally for one owner
#[utoipa::path(
    get,
    path = "/email-lists",
    params(OwnerParams),
    responses(
        (status = 200, description = "Successfully retrieved email lists", body = [email_lists::Model]),
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
    debug!("GET all Email Lists");
    debug!("Filter Params: {params:?}");

    let lists = EmailListApi::find_by(app_state.store.as_ref(), params.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), lists)))
}
