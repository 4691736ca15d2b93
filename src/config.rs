use crate::models::User;
use anyhow::{bail, Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use log::warn;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Process-wide settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl: Duration,
    pub users_file: Option<PathBuf>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;
    const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 30;
    const MAX_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365;

    const DEMO_USERNAME: &str = "chinna";
    const DEMO_FULL_NAME: &str = "Chinna Dev";
    const DEMO_PASSWORD: &str = "password123";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("invalid PORT {port:?}"))?,
            None => Self::DEFAULT_PORT,
        };

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() {
            bail!("JWT_SECRET is required");
        }

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(name) => {
                let algorithm = Algorithm::from_str(&name)
                    .with_context(|| format!("invalid JWT_ALGORITHM {name:?}"))?;
                if !matches!(
                    algorithm,
                    Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
                ) {
                    bail!("JWT_ALGORITHM must be one of HS256, HS384, HS512, got {name:?}");
                }
                algorithm
            }
            None => Self::DEFAULT_ALGORITHM,
        };

        let minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(minutes) => minutes
                .parse::<i64>()
                .with_context(|| format!("invalid ACCESS_TOKEN_EXPIRE_MINUTES {minutes:?}"))?,
            None => Self::DEFAULT_TOKEN_EXPIRE_MINUTES,
        };
        if minutes <= 0 || minutes > Self::MAX_TOKEN_EXPIRE_MINUTES {
            bail!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be in range [1, {}]",
                Self::MAX_TOKEN_EXPIRE_MINUTES
            );
        }

        let users_file = lookup("USERS_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            jwt_secret,
            jwt_algorithm,
            token_ttl: Duration::minutes(minutes),
            users_file,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Seed users with bcrypt password hashes. Without `USERS_FILE` the demo
    /// account is hashed on the spot.
    pub fn load_users(&self) -> Result<Vec<User>> {
        let Some(path) = self.users_file.as_ref() else {
            warn!(
                "USERS_FILE not set, seeding demo user {:?}; do not use in production",
                Self::DEMO_USERNAME
            );
            let hashed_password =
                hash(Self::DEMO_PASSWORD, DEFAULT_COST).context("hash demo password")?;
            return Ok(vec![User {
                username: Self::DEMO_USERNAME.to_string(),
                full_name: Self::DEMO_FULL_NAME.to_string(),
                hashed_password,
            }]);
        };

        let data = fs::read(path).with_context(|| format!("read users file {path:?}"))?;
        let users: Vec<User> =
            serde_json::from_slice(&data).with_context(|| format!("parse users file {path:?}"))?;
        if users.is_empty() {
            bail!("users file {path:?} has no users");
        }
        Ok(users)
    }
}
