use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::entities::nodes;
use crate::errors::ServiceError;
use crate::server::app::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_fr: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i32>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateNodeRequest {
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_fr: Option<String>,
    // Tri-state: absent leaves the parent unchanged, null or 0 clears it to
    // root, any other value re-parents.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub parent_id: Option<Option<i32>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateNodeResponse {
    pub message: String,
    pub id: i32,
}

#[derive(Deserialize, IntoParams)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) when paired with `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[utoipa::path(
    get,
    path = "/nodes",
    tag = "nodes",
    responses(
        (status = 200, description = "List all nodes ordered by id", body = [nodes::Model])
    )
)]
pub async fn list_nodes(
    State(state): State<AppState>,
) -> Result<Json<Vec<nodes::Model>>, ServiceError> {
    let rows = state.node_service.list_nodes().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/nodes",
    tag = "nodes",
    request_body = CreateNodeRequest,
    responses(
        (status = 201, description = "Node created", body = nodes::Model),
        (status = 400, description = "Missing or empty name"),
        (status = 404, description = "Parent node not found")
    )
)]
pub async fn create_node(
    State(state): State<AppState>,
    Json(payload): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<nodes::Model>), ServiceError> {
    let node = state
        .node_service
        .create_node(
            payload.name_ar.as_deref().unwrap_or_default(),
            payload.name_fr.as_deref().unwrap_or_default(),
            payload.parent_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(node)))
}

#[utoipa::path(
    put,
    path = "/nodes/{id}",
    tag = "nodes",
    params(
        ("id" = i32, Path, description = "Node ID")
    ),
    request_body = UpdateNodeRequest,
    responses(
        (status = 200, description = "Node updated", body = UpdateNodeResponse),
        (status = 400, description = "Node set as its own parent"),
        (status = 404, description = "Node or parent not found")
    )
)]
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNodeRequest>,
) -> Result<Json<UpdateNodeResponse>, ServiceError> {
    let node = state
        .node_service
        .update_node(id, payload.name_ar, payload.name_fr, payload.parent_id)
        .await?;

    Ok(Json(UpdateNodeResponse {
        message: "node updated".to_string(),
        id: node.id,
    }))
}

#[utoipa::path(
    delete,
    path = "/nodes/{id}",
    tag = "nodes",
    params(
        ("id" = i32, Path, description = "Node ID")
    ),
    responses(
        (status = 204, description = "Node deleted, direct children promoted to roots"),
        (status = 404, description = "Node not found")
    )
)]
pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.node_service.delete_node(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/nodes/{id}/parent",
    tag = "nodes",
    params(
        ("id" = i32, Path, description = "Node ID")
    ),
    responses(
        (status = 200, description = "Parent node, or null for a root", body = Option<nodes::Model>),
        (status = 404, description = "Node not found")
    )
)]
pub async fn get_parent(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Option<nodes::Model>>, ServiceError> {
    let parent = state.node_service.get_parent(id).await?;
    Ok(Json(parent))
}

#[utoipa::path(
    get,
    path = "/nodes/{id}/children",
    tag = "nodes",
    params(
        ("id" = i32, Path, description = "Node ID")
    ),
    responses(
        (status = 200, description = "Direct children ordered by id", body = [nodes::Model]),
        (status = 404, description = "Node not found")
    )
)]
pub async fn get_children(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<nodes::Model>>, ServiceError> {
    let children = state.node_service.get_children(id).await?;
    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/nodes/search",
    tag = "nodes",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching nodes; empty for an empty query", body = [nodes::Model])
    )
)]
pub async fn search_nodes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<nodes::Model>>, ServiceError> {
    let rows = state
        .node_service
        .search_nodes(params.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(rows))
}
