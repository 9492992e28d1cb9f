use serde::Deserialize;
use std::env;

use crate::models::match_proposal::RefixPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub proposals: ProposalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProposalConfig {
    pub refix_policy: RefixPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let max_connections: u32 = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let jwt_secret = env::var("JWT_SECRET")?;
        let jwt_issuer = env::var("JWT_ISSUER").ok();
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let cors_origins = parse_origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());
        let refix_policy: RefixPolicy = env::var("PROPOSAL_REFIX_POLICY")
            .unwrap_or_else(|_| "reject".to_string())
            .parse()?;

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_issuer,
            },
            server: ServerConfig {
                port,
                host,
                rust_log,
                cors_origins,
            },
            proposals: ProposalConfig { refix_policy },
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
