//! Where visitors arrive from a campaign link, on their way to the provider.

use axum::extract::{Path, Query, RawQuery, State};
use axum::response::Response;

use crate::cookies::redirect_response;
use crate::params::campaign::{DirectEntryParams, EntryParams};
use crate::AppState;

/// GET enter a campaign through its token
#[utoipa::path(
    get,
    path = "/c",
    params(EntryParams),
    responses(
        (status = 302, description = "To the provider's consent screen, or the catch-all URL when the token is invalid"),
    )
)]
pub async fn enter(
    State(app_state): State<AppState>,
    params: Result<Query<EntryParams>, axum::extract::rejection::QueryRejection>,
) -> Response {
    // A missing token decodes like any other invalid one.
    let token = params
        .ok()
        .and_then(|Query(params)| params.c)
        .unwrap_or_default();
    redirect_response(app_state.relay.begin_from_token(&token))
}

/// GET enter a campaign spelled out in the URL
#[utoipa::path(
    get,
    path = "/t/{provider}/{list_id}",
    params(
        ("provider" = String, Path, description = "Provider slug, e.g. `google`"),
        ("list_id" = String, Path, description = "Email list to add the visitor to"),
        ("o" = Option<Vec<String>>, Query, description = "Output id, repeatable"),
        ("r" = Option<String>, Query, description = "Absolute URL to land on after consent"),
    ),
    responses(
        (status = 302, description = "To the provider's consent screen, or the catch-all URL for an unknown provider"),
    )
)]
pub async fn enter_direct(
    State(app_state): State<AppState>,
    Path((provider, list_id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = DirectEntryParams::from_query(query.as_deref());
    redirect_response(app_state.relay.begin_direct(
        &provider,
        &list_id,
        params.output_ids,
        params.redirect_url,
    ))
}

/// Any unknown path ends up at the catch-all URL.
pub async fn fallback(State(app_state): State<AppState>) -> Response {
    redirect_response(domain::relay::Redirect {
        location: app_state.relay.catch_all_url().to_string(),
        cookies: Vec::new(),
    })
}
