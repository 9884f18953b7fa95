use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> Self {
        let config = AppConfig::from_env();
        let store = UserStore::open(config.users_file.clone());
        Self::from_parts(AuthService::new(store), config)
    }

    pub fn from_parts(auth: AuthService, config: AppConfig) -> Self {
        Self {
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }
}
