use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::operator::Operator;
use crate::params::campaign::{CampaignLink, CreateParams};
use crate::{AppState, Error};
use domain::campaign::CampaignState;
use log::*;

/// POST issue a shareable link for a new campaign
#[utoipa::path(
    post,
    path = "/campaigns",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully issued a campaign link", body = CampaignLink),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Email list not found"),
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
        "POST issue {} campaign link for list {}",
        params.provider_name, params.list_id
    );

    let state = CampaignState::from(params);
    let link = app_state.relay.issue_link(&state).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.into(),
            CampaignLink { link },
        )),
    ))
}
