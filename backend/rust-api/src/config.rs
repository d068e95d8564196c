use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub bind_addr: String,
    pub oidc_issuer: String,
    pub oidc_audience: String,
    pub oidc_jwks_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/learnhub".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "learnhub".to_string());

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let oidc_issuer = settings
            .get_string("auth.oidc_issuer")
            .or_else(|_| env::var("OIDC_ISSUER"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: OIDC_ISSUER must be set in production!");
                }
                eprintln!("WARNING: Using default OIDC issuer (dev mode only!)");
                "http://localhost:8080/realms/learnhub".to_string()
            });

        let oidc_audience = settings
            .get_string("auth.oidc_audience")
            .or_else(|_| env::var("OIDC_AUDIENCE"))
            .unwrap_or_else(|_| "learnhub-api".to_string());

        let oidc_jwks_url = settings
            .get_string("auth.oidc_jwks_url")
            .or_else(|_| env::var("OIDC_JWKS_URL"))
            .unwrap_or_else(|_| format!("{}/protocol/openid-connect/certs", oidc_issuer));

        Ok(Config {
            mongo_uri,
            mongo_database,
            bind_addr,
            oidc_issuer,
            oidc_audience,
            oidc_jwks_url,
        })
    }
}
