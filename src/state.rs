use crate::config::AppConfig;
use crate::users::{InMemoryUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = if config.seed_demo_user {
            InMemoryUserStore::with_demo_user()?
        } else {
            InMemoryUserStore::new()
        };

        Ok(Self::from_parts(Arc::new(store), config))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Empty store with fixed JWT settings for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(Arc::new(InMemoryUserStore::new()), Arc::new(test_config()))
    }
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        jwt: crate::config::JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        static_dir: "./public".into(),
        seed_demo_user: false,
    }
}
