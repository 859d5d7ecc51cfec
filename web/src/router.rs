use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

use crate::controller::{
    callback_controller, campaign_controller, email_list_controller, entry_controller,
    health_check_controller, output_controller, subscriber_controller, user_controller,
};
use crate::params;

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Campaign Relay API"
        ),
        paths(
            campaign_controller::create,
            entry_controller::enter,
            entry_controller::enter_direct,
            callback_controller::callback,
            health_check_controller::health_check,
            user_controller::create,
            user_controller::index,
            email_list_controller::create,
            email_list_controller::index,
            output_controller::create,
            output_controller::index,
            output_controller::read,
            output_controller::update,
            subscriber_controller::index,
        ),
        components(
            schemas(
                params::campaign::CreateParams,
                params::campaign::CampaignLink,
                params::user::CreateParams,
                params::email_list::CreateParams,
                params::output::CreateParams,
                params::output::UpdateParams,
                domain::users::Model,
                domain::email_lists::Model,
                domain::outputs::Model,
                domain::subscribers::Model,
                domain::OutputKind,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "campaign_relay", description = "Campaign links, OAuth state transfer and subscriber fan-out")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Link issuance and every management route are guarded by the operator's bearer key.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "operator_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(campaign_routes(app_state.clone()))
        .merge(entry_routes(app_state.clone()))
        .merge(callback_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(email_list_routes(app_state.clone()))
        .merge(output_routes(app_state.clone()))
        .merge(subscriber_routes(app_state.clone()))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(fallback_routes(app_state))
}

fn campaign_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/campaigns", post(campaign_controller::create))
        .with_state(app_state)
}

fn entry_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/c", get(entry_controller::enter))
        .route(
            "/t/{provider}/{list_id}",
            get(entry_controller::enter_direct),
        )
        .with_state(app_state)
}

fn callback_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/callback/{provider}",
            get(callback_controller::callback),
        )
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users",
            post(user_controller::create).get(user_controller::index),
        )
        .with_state(app_state)
}

fn email_list_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/email-lists",
            post(email_list_controller::create).get(email_list_controller::index),
        )
        .with_state(app_state)
}

fn output_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/outputs",
            post(output_controller::create).get(output_controller::index),
        )
        .route(
            "/outputs/{id}",
            get(output_controller::read).patch(output_controller::update),
        )
        .with_state(app_state)
}

fn subscriber_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/subscribers", get(subscriber_controller::index))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn fallback_routes(app_state: AppState) -> Router {
    Router::new()
        .fallback(entry_controller::fallback)
        .with_state(app_state)
}
