use anyhow::{anyhow, Result};
use axum::{
    routing::{get, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{health, nodes};
use crate::services::NodeService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub node_service: NodeService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        nodes::list_nodes,
        nodes::create_node,
        nodes::update_node,
        nodes::delete_node,
        nodes::get_parent,
        nodes::get_children,
        nodes::search_nodes,
    ),
    components(schemas(
        crate::database::entities::nodes::Model,
        nodes::CreateNodeRequest,
        nodes::UpdateNodeRequest,
        nodes::UpdateNodeResponse,
    )),
    tags(
        (name = "nodes", description = "Hierarchy CRUD and query endpoints")
    )
)]
struct ApiDoc;

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState {
        db: db.clone(),
        node_service: NodeService::new(db),
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        // Node routes
        .route("/nodes", get(nodes::list_nodes).post(nodes::create_node))
        .route("/nodes/search", get(nodes::search_nodes))
        .route("/nodes/:id", put(nodes::update_node).delete(nodes::delete_node))
        .route("/nodes/:id/parent", get(nodes::get_parent))
        .route("/nodes/:id/children", get(nodes::get_children))
        // Generated API documentation UI
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
