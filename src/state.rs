use crate::auth::TokenService;
use crate::config::Config;
use crate::db::{CatalogStore, UserStore};
use anyhow::{Context, Result};

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub users: UserStore,
    pub tokens: TokenService,
    pub catalog: CatalogStore,
}

impl AppState {
    pub fn new(users: UserStore, tokens: TokenService) -> Self {
        Self {
            users,
            tokens,
            catalog: CatalogStore::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let seed = cfg.load_users().context("load seed users")?;
        let users = UserStore::new(seed).context("init user store")?;
        let tokens = TokenService::new(cfg.jwt_secret.as_bytes(), cfg.jwt_algorithm, cfg.token_ttl);
        Ok(Self::new(users, tokens))
    }
}
