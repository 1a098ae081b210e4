//! Persistence logic for the node hierarchy.
//!
//! All handlers go through [`NodeService`]; it owns the connection and is the
//! only place that touches the `nodes` table.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::database::entities::nodes;
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct NodeService {
    db: DatabaseConnection,
}

impl NodeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All nodes, ordered by id ascending.
    pub async fn list_nodes(&self) -> Result<Vec<nodes::Model>, ServiceError> {
        let rows = nodes::Entity::find()
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Create a node. Both names are required; a `parent_id` of 0 is
    /// normalised to root, and a non-zero parent must exist.
    pub async fn create_node(
        &self,
        name_ar: &str,
        name_fr: &str,
        parent_id: Option<i32>,
    ) -> Result<nodes::Model, ServiceError> {
        let name_ar = name_ar.trim();
        let name_fr = name_fr.trim();
        if name_ar.is_empty() || name_fr.is_empty() {
            return Err(ServiceError::Validation(
                "'name_ar' and 'name_fr' are required".to_string(),
            ));
        }

        let parent_id = parent_id.filter(|&id| id != 0);
        if let Some(pid) = parent_id {
            self.require_parent(pid).await?;
        }

        let now = Utc::now();
        let node = nodes::ActiveModel {
            name_ar: Set(name_ar.to_string()),
            name_fr: Set(name_fr.to_string()),
            parent_id: Set(parent_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(node.insert(&self.db).await?)
    }

    /// Update a node, changing only the supplied fields. `parent_id` is
    /// tri-state: `None` leaves it unchanged, `Some(None)` or `Some(Some(0))`
    /// clears it to root, anything else re-parents after the self-parent and
    /// existence checks.
    pub async fn update_node(
        &self,
        id: i32,
        name_ar: Option<String>,
        name_fr: Option<String>,
        parent_id: Option<Option<i32>>,
    ) -> Result<nodes::Model, ServiceError> {
        let node = self.require_node(id).await?;
        let mut node: nodes::ActiveModel = node.into();

        if let Some(name) = name_ar {
            node.name_ar = Set(name);
        }
        if let Some(name) = name_fr {
            node.name_fr = Set(name);
        }
        if let Some(parent) = parent_id {
            let parent = parent.filter(|&pid| pid != 0);
            if let Some(pid) = parent {
                if pid == id {
                    return Err(ServiceError::Validation(
                        "a node cannot be its own parent".to_string(),
                    ));
                }
                self.require_parent(pid).await?;
            }
            node.parent_id = Set(parent);
        }
        node.updated_at = Set(Utc::now());

        Ok(node.update(&self.db).await?)
    }

    /// Delete a node, promoting its direct children to roots first. Detach
    /// and delete run in one transaction so a failure cannot leave the node
    /// present with already-detached children.
    pub async fn delete_node(&self, id: i32) -> Result<(), ServiceError> {
        self.require_node(id).await?;

        let txn = self.db.begin().await?;

        nodes::Entity::update_many()
            .col_expr(nodes::Column::ParentId, Expr::value(Option::<i32>::None))
            .col_expr(nodes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(nodes::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;

        nodes::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// The parent of a node, or `None` for a root.
    pub async fn get_parent(&self, id: i32) -> Result<Option<nodes::Model>, ServiceError> {
        let node = self.require_node(id).await?;
        match node.parent_id {
            Some(pid) => Ok(nodes::Entity::find_by_id(pid).one(&self.db).await?),
            None => Ok(None),
        }
    }

    /// Direct children of a node, ordered by id.
    pub async fn get_children(&self, id: i32) -> Result<Vec<nodes::Model>, ServiceError> {
        self.require_node(id).await?;

        let children = nodes::Entity::find()
            .filter(nodes::Column::ParentId.eq(id))
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(children)
    }

    /// Case-insensitive substring search over both name columns, plus an
    /// exact id match when the query parses as an integer. A single OR query,
    /// so a row matching several predicates appears once. An empty query
    /// yields an empty result, not an error.
    pub async fn search_nodes(&self, query: &str) -> Result<Vec<nodes::Model>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", query.to_lowercase());
        let mut condition = Condition::any()
            .add(Expr::expr(Func::lower(Expr::col(nodes::Column::NameAr))).like(pattern.as_str()))
            .add(Expr::expr(Func::lower(Expr::col(nodes::Column::NameFr))).like(pattern.as_str()));

        if let Ok(id) = query.parse::<i32>() {
            condition = condition.add(nodes::Column::Id.eq(id));
        }

        let rows = nodes::Entity::find()
            .filter(condition)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn require_node(&self, id: i32) -> Result<nodes::Model, ServiceError> {
        nodes::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("node {} not found", id)))
    }

    async fn require_parent(&self, parent_id: i32) -> Result<(), ServiceError> {
        nodes::Entity::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("parent node {} not found", parent_id)))
    }
}
