//! Database functionality tests
//!
//! Tests for migrations, entity operations, and the service layer.

use anyhow::Result;
use chrono::Utc;
use orgtree::database::connection::setup_database;
use orgtree::database::entities::nodes;
use orgtree::errors::ServiceError;
use orgtree::services::NodeService;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let rows = nodes::Entity::find().all(&db).await?;
    assert_eq!(rows.len(), 0);

    // Running setup again is a no-op
    setup_database(&db).await?;

    Ok(())
}

#[tokio::test]
async fn test_node_entity_crud() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let now = Utc::now();
    let new_node = nodes::ActiveModel {
        name_ar: Set("وزارة الداخلية".to_string()),
        name_fr: Set("Ministère de l'Intérieur".to_string()),
        parent_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let node = new_node.insert(&db).await?;
    assert_eq!(node.name_ar, "وزارة الداخلية");
    assert!(node.parent_id.is_none());

    let found = nodes::Entity::find_by_id(node.id)
        .one(&db)
        .await?
        .expect("node should exist");
    assert_eq!(found.name_fr, "Ministère de l'Intérieur");

    let mut update: nodes::ActiveModel = found.into();
    update.name_fr = Set("Ministère de l'Intérieur et des Collectivités".to_string());
    let updated = update.update(&db).await?;
    assert_eq!(
        updated.name_fr,
        "Ministère de l'Intérieur et des Collectivités"
    );

    nodes::Entity::delete_by_id(updated.id).exec(&db).await?;
    let deleted = nodes::Entity::find_by_id(updated.id).one(&db).await?;
    assert!(deleted.is_none());

    Ok(())
}

#[tokio::test]
async fn test_service_create_validation() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db.clone());

    let err = service.create_node("", "Ministère", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service.create_node("وزارة", "   ", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service
        .create_node("وزارة", "Ministère", Some(42))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Rejected requests persisted nothing
    assert_eq!(nodes::Entity::find().all(&db).await?.len(), 0);

    // Names are trimmed on the way in
    let node = service
        .create_node("  وزارة  ", "  Ministère  ", Some(0))
        .await?;
    assert_eq!(node.name_ar, "وزارة");
    assert_eq!(node.name_fr, "Ministère");
    assert!(node.parent_id.is_none());

    Ok(())
}

#[tokio::test]
async fn test_service_update_refreshes_timestamp() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db);

    let node = service.create_node("وزارة", "Ministère", None).await?;
    let created_at = node.created_at;

    let updated = service
        .update_node(node.id, None, Some("Renommé".to_string()), None)
        .await?;

    assert_eq!(updated.name_fr, "Renommé");
    assert_eq!(updated.name_ar, "وزارة");
    assert_eq!(updated.created_at, created_at);
    assert!(updated.updated_at > created_at);

    Ok(())
}

#[tokio::test]
async fn test_service_self_parent_rejected() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db);

    let node = service.create_node("وزارة", "Ministère", None).await?;

    let err = service
        .update_node(node.id, None, None, Some(Some(node.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_service_delete_detaches_children() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db.clone());

    let root = service.create_node("الجذر", "Racine", None).await?;
    let left = service
        .create_node("يسار", "Gauche", Some(root.id))
        .await?;
    let right = service
        .create_node("يمين", "Droite", Some(root.id))
        .await?;
    let grandchild = service
        .create_node("حفيد", "Petit-fils", Some(left.id))
        .await?;

    service.delete_node(root.id).await?;

    // Exactly the direct children were detached
    let detached = nodes::Entity::find()
        .filter(nodes::Column::ParentId.is_null())
        .all(&db)
        .await?;
    let mut ids: Vec<i32> = detached.iter().map(|n| n.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![left.id, right.id]);

    // The grandchild still hangs off its parent
    let grandchild = nodes::Entity::find_by_id(grandchild.id)
        .one(&db)
        .await?
        .expect("grandchild should survive");
    assert_eq!(grandchild.parent_id, Some(left.id));

    // The deleted node is gone
    assert!(nodes::Entity::find_by_id(root.id).one(&db).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_service_hierarchy_queries() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db);

    let root = service.create_node("الجذر", "Racine", None).await?;
    let child = service
        .create_node("فرع", "Branche", Some(root.id))
        .await?;

    assert!(service.get_parent(root.id).await?.is_none());
    assert_eq!(
        service.get_parent(child.id).await?.map(|n| n.id),
        Some(root.id)
    );

    let children = service.get_children(root.id).await?;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    assert!(service.get_children(child.id).await?.is_empty());

    let err = service.get_parent(999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = service.get_children(999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_service_search() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = NodeService::new(db);

    let finance = service
        .create_node("وزارة المالية", "Ministère des Finances", None)
        .await?;
    let health = service
        .create_node("وزارة الصحة", "Ministère de la Santé", None)
        .await?;

    assert!(service.search_nodes("").await?.is_empty());
    assert!(service.search_nodes("   ").await?.is_empty());

    let results = service.search_nodes("finances").await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, finance.id);

    let results = service.search_nodes("MINISTÈRE").await?;
    assert_eq!(results.len(), 2);

    let results = service.search_nodes(&health.id.to_string()).await?;
    assert!(results.iter().any(|n| n.id == health.id));

    Ok(())
}
