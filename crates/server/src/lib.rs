//! A tracking pixel service for email opens.
//!
//! Every fetch of `/track/{message_id}` is recorded as an open event in the
//! store; the accumulated events are served back by `/api/tracking`.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::EventStore;

pub mod api;
pub mod client_addr;
pub mod config;
pub mod entity;
pub mod error;
pub mod pixel;
pub mod store;

#[derive(Clone)]
pub struct AppResources {
    pub store: Arc<dyn EventStore>,
    pub config: Arc<AppConfig>,
}

impl AppResources {
    pub fn new(store: Arc<dyn EventStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
