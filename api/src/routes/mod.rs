use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ApiDoc;
use crate::middleware;
use crate::state::AppState;

pub mod health;
pub mod login;
pub mod mcp_stream;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(health::router())
        .merge(mcp_stream::router())
        .merge(login::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::access_log::AccessLogLayer::new()),
        )
        .with_state(state)
}
