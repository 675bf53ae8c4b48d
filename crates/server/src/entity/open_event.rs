//! One row per tracking pixel fetch.
//!
//! Rows are append-only: normal traffic only ever inserts. The setup probe in
//! [`crate::api::debug`] is the one flow that deletes, and only its own test row.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "email_tracking")]
#[schema(as = OpenEvent)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque message identifier taken from the pixel URL.
    pub email_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub opened_at: OffsetDateTime,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub type OpenEvent = Model;

/// An open event as recorded by the pixel endpoint, before the store assigns `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOpenEvent {
    pub email_id: String,
    pub opened_at: OffsetDateTime,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl NewOpenEvent {
    pub fn now(email_id: impl Into<String>) -> Self {
        Self {
            email_id: email_id.into(),
            opened_at: OffsetDateTime::now_utc(),
            user_agent: None,
            ip_address: None,
        }
    }
}
