use anyhow::{Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

pub const SIGNING_KEY_ENV: &str = "JWT_SIGNING_KEY";
pub const PASSWORD_PEPPER_ENV: &str = "PASSWORD_PEPPER";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub redis: Option<Redis>,
    pub postgres: Option<Postgres>,
}

#[derive(Deserialize)]
pub struct Auth {
    pub blacklist_backend: String,  // "memory" or "redis"
    pub credential_backend: String, // "memory" or "postgres"
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    #[serde(default)]
    pub signing_key: Option<String>,
    #[serde(default)]
    pub password_pepper: Option<String>,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("blacklist_backend", &self.blacklist_backend)
            .field("credential_backend", &self.credential_backend)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field(
                "password_pepper",
                &self.password_pepper.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Auth {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// The environment variable overrides the file.
    pub fn resolve_signing_key(&self) -> Result<Vec<u8>> {
        let key = std::env::var(SIGNING_KEY_ENV)
            .ok()
            .or_else(|| self.signing_key.clone())
            .ok_or_else(|| anyhow!("no signing key: set {} or auth.signing_key", SIGNING_KEY_ENV))?;
        if key.trim().is_empty() {
            bail!("signing key is empty");
        }
        Ok(key.into_bytes())
    }

    /// Secret mixed into every password hash. Empty when neither the
    /// environment nor the file sets one.
    pub fn resolve_password_pepper(&self) -> Vec<u8> {
        std::env::var(PASSWORD_PEPPER_ENV)
            .ok()
            .or_else(|| self.password_pepper.clone())
            .unwrap_or_default()
            .into_bytes()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub dsn: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.auth.access_ttl_secs == 0 {
            bail!("auth.access_ttl_secs must be positive");
        }
        if self.auth.refresh_ttl_secs <= self.auth.access_ttl_secs {
            bail!(
                "auth.refresh_ttl_secs ({}) must exceed auth.access_ttl_secs ({})",
                self.auth.refresh_ttl_secs,
                self.auth.access_ttl_secs
            );
        }
        if self.auth.blacklist_backend == "redis" && self.redis.is_none() {
            bail!("auth.blacklist_backend = \"redis\" needs a [redis] section");
        }
        if self.auth.credential_backend == "postgres" && self.postgres.is_none() {
            bail!("auth.credential_backend = \"postgres\" needs a [postgres] section");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
