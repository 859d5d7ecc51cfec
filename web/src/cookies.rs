//! Turning relay redirects into HTTP responses, and reading state cookies back.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domain::relay::Redirect;
use domain::state_carrier::SealedCookie;
use log::*;
use time::Duration;

/// 302 to `redirect.location` with every cookie in its own `Set-Cookie` header.
///
/// Campaign redirects are single use and must never be cached.
pub(crate) fn redirect_response(redirect: Redirect) -> Response {
    let location = match HeaderValue::try_from(redirect.location.as_str()) {
        Ok(location) => location,
        Err(_) => {
            warn!("Redirect target is not a valid header value");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let jar = redirect
        .cookies
        .iter()
        .fold(CookieJar::new(), |jar, sealed| jar.add(state_cookie(sealed)));

    (
        StatusCode::FOUND,
        jar,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response()
}

fn state_cookie(sealed: &SealedCookie) -> Cookie<'static> {
    let max_age = Duration::try_from(sealed.max_age).unwrap_or(Duration::ZERO);
    Cookie::build((sealed.name.clone(), sealed.value.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// The value of the request cookie `name`, with any surrounding quotes removed.
pub(crate) fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value_trimmed().to_string())
}
