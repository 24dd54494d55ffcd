use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use sqlx::mysql::MySqlConnectOptions;
use std::env;
use std::str::FromStr;

/// Where the MySQL pool connects to: either a full URL or the discrete
/// DB_* variables (password does not need URL-encoding in that form).
#[derive(Clone, Debug)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        name: String,
    },
}

impl DatabaseTarget {
    pub fn connect_options(&self) -> Result<MySqlConnectOptions> {
        match self {
            DatabaseTarget::Url(url) => {
                MySqlConnectOptions::from_str(url).context("DATABASE_URL is not a valid MySQL URL")
            }
            DatabaseTarget::Parts {
                host,
                port,
                user,
                password,
                name,
            } => Ok(MySqlConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(name)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database: DatabaseTarget,
    pub db_max_connections: u32,
    pub run_migrations: bool,

    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub cors_origins: Vec<String>,

    /// Used for the estimated cost in reports
    pub overtime_hourly_rate: f64,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let database = match lookup("DATABASE_URL") {
            Some(url) => DatabaseTarget::Url(url),
            None => DatabaseTarget::Parts {
                host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(&lookup, "DB_PORT", 3306)?,
                user: lookup("DB_USER").unwrap_or_else(|| "root".to_string()),
                password: lookup("DB_PASSWORD").unwrap_or_default(),
                name: lookup("DB_NAME").unwrap_or_else(|| "ghs".to_string()),
            },
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let log_level = lookup("LOG_LEVEL")
            .map(|l| tracing::Level::from_str(&l).map_err(|_| anyhow!("LOG_LEVEL `{l}` is not a level")))
            .transpose()?
            .unwrap_or(tracing::Level::DEBUG);

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            database,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 30)?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 1800)?, // 30 min
            refresh_token_ttl: parse_or(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days
            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parse_or(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: normalize_prefix(lookup("API_PREFIX").unwrap_or_default()),
            cors_origins,
            overtime_hourly_rate: parse_or(&lookup, "OVERTIME_HOURLY_RATE", 25.0)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level,
            admin_username: lookup("ADMIN_USERNAME").filter(|v| !v.trim().is_empty()),
            admin_password: lookup("ADMIN_PASSWORD").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}

// "" and "/" both mean "no prefix"; otherwise a leading slash and no trailing one
fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:8000");
        assert_eq!(config.access_token_ttl, 1800);
        assert_eq!(config.api_prefix, "");
        assert!(config.cors_origins.is_empty());
        assert!(config.run_migrations);
        assert!(matches!(
            config.database,
            DatabaseTarget::Parts { ref host, port: 3306, ref name, .. } if host == "localhost" && name == "ghs"
        ));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_number_is_reported_with_its_key() {
        let err = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("ACCESS_TOKEN_TTL", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));
    }

    #[test]
    fn database_url_wins_over_parts() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", "mysql://u:p@db:3306/ghs"),
            ("DB_HOST", "ignored"),
        ]))
        .unwrap();
        assert!(matches!(config.database, DatabaseTarget::Url(ref u) if u.starts_with("mysql://")));
    }

    #[test]
    fn prefix_and_origins_are_normalized() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("API_PREFIX", "api/v1/"),
            ("CORS_ORIGINS", "http://a.test, ,http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
