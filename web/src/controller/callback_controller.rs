use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::cookies::{cookie_value, redirect_response};
use crate::AppState;
use domain::relay::CallbackParams;
use log::*;

/// GET provider redirect back after consent
#[utoipa::path(
    get,
    path = "/callback/{provider}",
    params(
        ("provider" = String, Path, description = "Provider slug, e.g. `google`"),
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "Anti-forgery value sent with the consent request"),
        ("error" = Option<String>, Query, description = "Set when the visitor declined"),
    ),
    responses(
        (status = 302, description = "To the campaign's redirect URL, or the catch-all URL when the state cookies are unusable"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    params: Result<Query<CallbackParams>, axum::extract::rejection::QueryRejection>,
    jar: CookieJar,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            debug!("Unreadable callback query on {provider}: {e}");
            CallbackParams::default()
        }
    };
    redirect_response(
        app_state
            .relay
            .complete(&provider, params, |name| cookie_value(&jar, name)),
    )
}
