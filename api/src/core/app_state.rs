use std::sync::Arc;

use review_engine::Broker;

use crate::core::config::BrokerConfig;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    /// The verb engine; every route goes through it.
    pub broker: Arc<Broker>,
    /// Resolved process configuration (env + project config file).
    pub config: BrokerConfig,
}
