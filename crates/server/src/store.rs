//! Persistence of open events.
//!
//! Handlers only ever see [`EventStore`]; [`DatabaseStore`] is the sea-orm backed
//! implementation used by the binary. Tests swap in their own implementations.

use crate::config::StoreConfig;
use crate::entity::open_event::{self, NewOpenEvent, OpenEvent};
use crate::error::StoreError;
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event and return it as stored.
    async fn append(&self, event: NewOpenEvent) -> Result<OpenEvent, StoreError>;

    /// Every stored event, most recently opened first.
    async fn list_recent(&self) -> Result<Vec<OpenEvent>, StoreError>;

    /// Cheap read used to check the store is reachable. Returns the number of stored events.
    async fn probe(&self) -> Result<u64, StoreError>;

    /// Create the event table and its indexes if they do not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Remove every event recorded for `email_id`. Maintenance only.
    async fn delete_by_email_id(&self, email_id: &str) -> Result<u64, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect using the configured URL, injecting the separate credential if one is set.
    #[tracing::instrument(skip_all)]
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = connection_url(config)?;
        let db = Database::connect(url).await.map_err(StoreError::Connect)?;
        Ok(Self::new(db))
    }
}

fn connection_url(config: &StoreConfig) -> Result<String, StoreError> {
    let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(config.url.clone());
    };
    let mut url =
        url::Url::parse(&config.url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
    url.set_password(Some(password))
        .map_err(|()| StoreError::InvalidUrl("URL cannot carry a password".into()))?;
    Ok(url.into())
}

#[async_trait]
impl EventStore for DatabaseStore {
    async fn append(&self, event: NewOpenEvent) -> Result<OpenEvent, StoreError> {
        let row = open_event::ActiveModel {
            email_id: Set(event.email_id),
            opened_at: Set(event.opened_at),
            user_agent: Set(event.user_agent),
            ip_address: Set(event.ip_address),
            ..Default::default()
        };
        Ok(row.insert(&self.db).await?)
    }

    async fn list_recent(&self) -> Result<Vec<OpenEvent>, StoreError> {
        Ok(open_event::Entity::find()
            .order_by_desc(open_event::Column::OpenedAt)
            .order_by_desc(open_event::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn probe(&self) -> Result<u64, StoreError> {
        Ok(open_event::Entity::find().count(&self.db).await?)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| StoreError::Schema(e.to_string()))
    }

    async fn delete_by_email_id(&self, email_id: &str) -> Result<u64, StoreError> {
        let res = open_event::Entity::delete_many()
            .filter(open_event::Column::EmailId.eq(email_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(self.db.clone().close().await?)
    }
}
