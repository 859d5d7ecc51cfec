pub(crate) mod operator;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
