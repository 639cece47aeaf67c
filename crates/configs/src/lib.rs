use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub claims: ClaimsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            frontend_dir: default_frontend_dir(),
        }
    }
}

/// Where the claim collection lives.
///
/// The remote key-value backend is used only when both `kv_url` and
/// `kv_token` are set; otherwise claims go to `<data_dir>/claims.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub kv_url: Option<String>,
    #[serde(default)]
    pub kv_token: Option<String>,
    #[serde(default = "default_kv_key")]
    pub kv_key: String,
    #[serde(default = "default_kv_timeout")]
    pub kv_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            kv_url: None,
            kv_token: None,
            kv_key: default_kv_key(),
            kv_timeout_secs: default_kv_timeout(),
        }
    }
}

/// Demo login: one fixed credential pair and the cookie that marks a session.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_demo_email")]
    pub demo_email: String,
    #[serde(default = "default_demo_password")]
    pub demo_password: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            demo_email: default_demo_email(),
            demo_password: default_demo_password(),
            session_cookie: default_session_cookie(),
            session_max_age_secs: default_session_max_age(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimsConfig {
    #[serde(default = "default_auto_approve_ms")]
    pub auto_approve_after_ms: u64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self { auto_approve_after_ms: default_auto_approve_ms() }
    }
}

fn default_frontend_dir() -> String { "frontend".into() }
fn default_data_dir() -> String { "data".into() }
fn default_kv_key() -> String { "claims".into() }
fn default_kv_timeout() -> u64 { 10 }
fn default_demo_email() -> String { "demo@insureco.com".into() }
fn default_demo_password() -> String { "Demo1234!".into() }
fn default_session_cookie() -> String { "insureco_session".into() }
fn default_session_max_age() -> i64 { 60 * 60 * 24 }
fn default_auto_approve_ms() -> u64 { 30_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file does not exist, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment wins over the file for the values deployments usually inject.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("CLAIMS_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Some(url) = lookup("KV_REST_API_URL") {
            self.storage.kv_url = Some(url);
        }
        if let Some(token) = lookup("KV_REST_API_TOKEN") {
            self.storage.kv_token = Some(token);
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize();
        self.storage.validate()?;
        if self.claims.auto_approve_after_ms == 0 {
            return Err(anyhow!("claims.auto_approve_after_ms must be > 0"));
        }
        if self.auth.session_cookie.trim().is_empty() {
            return Err(anyhow!("auth.session_cookie must not be empty"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        // 空字符串视为未配置
        self.kv_url = self.kv_url.take().filter(|s| !s.trim().is_empty());
        self.kv_token = self.kv_token.take().filter(|s| !s.trim().is_empty());
        if self.kv_key.trim().is_empty() {
            self.kv_key = default_kv_key();
        }
        if self.kv_timeout_secs == 0 {
            self.kv_timeout_secs = default_kv_timeout();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.kv_url {
            let lower = url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("storage.kv_url must start with http:// or https://"));
            }
        }
        Ok(())
    }

    /// `(url, token)` when both halves of the remote backend are configured.
    pub fn kv_credentials(&self) -> Option<(&str, &str)> {
        match (self.kv_url.as_deref(), self.kv_token.as_deref()) {
            (Some(url), Some(token)) if !url.trim().is_empty() && !token.trim().is_empty() => Some((url, token)),
            _ => None,
        }
    }
}
