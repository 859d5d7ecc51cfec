use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::operator::Operator;
use crate::params::OwnerParams;
use crate::{AppState, Error};
use domain::{subscriber as SubscriberApi, subscribers};
use log::*;

/// GET captured subscribers, newest first, optionally for one owner
#[utoipa::path(
    get,
    path = "/subscribers",
    params(OwnerParams),
    responses(
        (status = 200, description = "Successfully retrieved subscribers", body = [subscribers::Model]),
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
    debug!("GET all Subscribers");
    debug!("Filter Params: {params:?}");

    let subscribers = SubscriberApi::find_by(app_state.store.as_ref(), params.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), subscribers)))
}
