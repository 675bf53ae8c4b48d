//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use email_open_tracker::{
    AppResources, api,
    config::AppConfig,
    entity::open_event::{NewOpenEvent, OpenEvent},
    error::StoreError,
    store::{DatabaseStore, EventStore},
};
use sea_orm::Database;
use std::sync::Arc;

/// A fresh in-memory SQLite store with the schema applied.
pub async fn create_test_store() -> Arc<DatabaseStore> {
    let db = Database::connect("sqlite::memory:").await.expect("connect");
    let store = DatabaseStore::new(db);
    store.ensure_schema().await.expect("create schema");
    Arc::new(store)
}

pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::with_store_url("sqlite::memory:");
    config.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../public").to_string();
    config
}

pub fn create_test_server(store: Arc<dyn EventStore>, config: AppConfig) -> TestServer {
    let resources = AppResources::new(store, config);
    TestServer::new(api::router(resources)).expect("create test server")
}

/// A store whose every operation fails as if the database were down.
pub struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl EventStore for UnreachableStore {
    async fn append(&self, _event: NewOpenEvent) -> Result<OpenEvent, StoreError> {
        Err(unreachable())
    }

    async fn list_recent(&self) -> Result<Vec<OpenEvent>, StoreError> {
        Err(unreachable())
    }

    async fn probe(&self) -> Result<u64, StoreError> {
        Err(unreachable())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn delete_by_email_id(&self, _email_id: &str) -> Result<u64, StoreError> {
        Err(unreachable())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Wraps a working store but refuses schema changes, like a store without DDL privileges.
pub struct NoDdlStore(pub Arc<DatabaseStore>);

#[async_trait]
impl EventStore for NoDdlStore {
    async fn append(&self, event: NewOpenEvent) -> Result<OpenEvent, StoreError> {
        self.0.append(event).await
    }

    async fn list_recent(&self) -> Result<Vec<OpenEvent>, StoreError> {
        self.0.list_recent().await
    }

    async fn probe(&self) -> Result<u64, StoreError> {
        self.0.probe().await
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Err(StoreError::Schema("permission denied for schema public".into()))
    }

    async fn delete_by_email_id(&self, email_id: &str) -> Result<u64, StoreError> {
        self.0.delete_by_email_id(email_id).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.0.close().await
    }
}
