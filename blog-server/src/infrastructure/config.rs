use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Marks the auth cookie `Secure`.
    pub production: bool,
    pub allow_registration: bool,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub public_path: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public/uploads"),
            public_path: "/uploads".into(),
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let production = std::env::var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let allow_registration = parse_flag("ALLOW_REGISTRATION", true)?;

        let defaults = UploadConfig::default();
        let upload = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            public_path: std::env::var("UPLOAD_PUBLIC_PATH")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_path),
            max_bytes: match std::env::var("UPLOAD_MAX_BYTES") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid UPLOAD_MAX_BYTES: {}", e))?,
                Err(_) => defaults.max_bytes,
            },
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            production,
            allow_registration,
            upload,
        })
    }
}

fn parse_flag(name: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow::anyhow!("invalid {}: {}", name, other)),
        },
        Err(_) => Ok(default),
    }
}
