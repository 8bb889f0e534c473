//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. schedule.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::{Error, Result};

/// Default configuration file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "schedule.toml";

/// Behaviour of DELETE for an id that does not exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Always report success (204)
    #[default]
    Idempotent,
    /// Report 404 when nothing was deleted
    Strict,
}

impl DeletePolicy {
    /// Parse a policy name; unknown names yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "idempotent" => Some(Self::Idempotent),
            "strict" | "not_found" | "notfound" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Main configuration for the schedule service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for paths outside the API
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"])
    /// If unset, any origin is allowed
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| Error::Config(format!("Invalid address {}: {}", addr, e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed the store with the sample sessions at startup
    #[serde(default = "default_seed_samples")]
    pub seed_samples: bool,

    /// DELETE behaviour for unknown ids
    #[serde(default)]
    pub delete_policy: DeletePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_samples: default_seed_samples(),
            delete_policy: DeletePolicy::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "www".to_string()
}

fn default_seed_samples() -> bool {
    true
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&toml_content)?;

        // 既存の環境変数で上書き（環境変数が優先）
        cfg.apply_env_overrides()?;

        Ok(cfg)
    }

    /// TOML 文字列をパースする（環境変数展開あり、上書きなし）
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded_content = Self::expand_env_vars(content);
        let config: TomlConfig = toml::from_str(&expanded_content)?;
        Self::from_toml_config(config)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./schedule.toml` があればそれを使い、なければ環境変数とデフォルト値のみ。
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Result<Self> {
        let server = toml.server.unwrap_or_default();
        let server_config = ServerConfig {
            host: server.host.unwrap_or_else(default_host),
            port: server.port.unwrap_or_else(default_port),
            static_dir: server.static_dir.unwrap_or_else(default_static_dir),
            allowed_origins: server.allowed_origins.filter(|origins| !origins.is_empty()),
        };

        let store = toml.store.unwrap_or_default();
        let delete_policy = match store.delete_policy {
            Some(name) => DeletePolicy::parse(&name)
                .ok_or_else(|| Error::Config(format!("Unknown delete_policy: {}", name)))?,
            None => DeletePolicy::default(),
        };
        let store_config = StoreConfig {
            seed_samples: store.seed_samples.unwrap_or_else(default_seed_samples),
            delete_policy,
        };

        Ok(Config {
            server: server_config,
            store: store_config,
        })
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// `var` で引いた値で設定を上書きする
    fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server 設定の上書き
        if let Some(host) = var("SERVER_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid SERVER_PORT {}: {}", port, e)))?;
        }
        if let Some(dir) = var("STATIC_DIR") {
            if !dir.is_empty() {
                self.server.static_dir = dir;
            }
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.server.allowed_origins = parse_origins(&origins);
        }

        // Store 設定の上書き
        if let Some(seed) = var("SEED_SAMPLES") {
            self.store.seed_samples = seed.to_lowercase() != "false";
        }
        if let Some(policy) = var("DELETE_POLICY") {
            self.store.delete_policy = DeletePolicy::parse(&policy)
                .ok_or_else(|| Error::Config(format!("Unknown DELETE_POLICY: {}", policy)))?;
        }

        Ok(())
    }
}

/// Comma-separated origins; an empty list means "any origin"
fn parse_origins(value: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if origins.is_empty() { None } else { Some(origins) }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// HTTP サーバー設定
    server: Option<TomlServerConfig>,
    /// ストア設定
    store: Option<TomlStoreConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    static_dir: Option<String>,
    /// 許可する CORS オリジン
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlStoreConfig {
    /// サンプルデータを投入するか
    #[serde(default)]
    seed_samples: Option<bool>,
    /// "idempotent" または "strict"
    #[serde(default)]
    delete_policy: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, "www");
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert!(config.seed_samples);
        assert_eq!(config.delete_policy, DeletePolicy::Idempotent);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..ServerConfig::default()
        };
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 9090);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(bad.socket_addr(), Err(Error::Config(_))));
    }

    #[test]
    fn test_delete_policy_parse() {
        assert_eq!(DeletePolicy::parse("idempotent"), Some(DeletePolicy::Idempotent));
        assert_eq!(DeletePolicy::parse(" Strict "), Some(DeletePolicy::Strict));
        assert_eq!(DeletePolicy::parse("not_found"), Some(DeletePolicy::Strict));
        assert_eq!(DeletePolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_expand_env_vars() {
        // テスト用環境変数を設定
        unsafe {
            std::env::set_var("SCHEDULE_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${SCHEDULE_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // 存在しない環境変数
        let result = Config::expand_env_vars("prefix_${SCHEDULE_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("SCHEDULE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        assert_eq!(Config::expand_env_vars("cost: $5"), "cost: $5");
        assert_eq!(Config::expand_env_vars("${}_content"), "_content");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9000
static_dir = "public"
allowed_origins = ["http://localhost:3000"]

[store]
seed_samples = false
delete_policy = "strict"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.static_dir, "public");
        assert_eq!(
            config.server.allowed_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
        assert!(!config.store.seed_samples);
        assert_eq!(config.store.delete_policy, DeletePolicy::Strict);
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config = Config::from_toml_str("[server]\nport = 8181\n").unwrap();
        assert_eq!(config.server.port, 8181);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.store.seed_samples);
        assert_eq!(config.store.delete_policy, DeletePolicy::Idempotent);
    }

    #[test]
    fn test_toml_rejects_unknown_policy() {
        let result = Config::from_toml_str("[store]\ndelete_policy = \"maybe\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_syntax_error() {
        let result = Config::from_toml_str("[server\nport = 1");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nstatic_dir = \"assets\"").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.server.static_dir, "assets");
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_take_priority_over_file() {
        let mut config = Config::from_toml_str(
            "[server]\nport = 9000\nhost = \"127.0.0.1\"\n[store]\nseed_samples = true\n",
        )
        .unwrap();

        config
            .apply_overrides(vars(&[
                ("SERVER_PORT", "9100"),
                ("SEED_SAMPLES", "FALSE"),
                ("DELETE_POLICY", "strict"),
                ("ALLOWED_ORIGINS", " http://a.example , ,http://b.example "),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.store.seed_samples);
        assert_eq!(config.store.delete_policy, DeletePolicy::Strict);
        assert_eq!(
            config.server.allowed_origins,
            Some(vec![
                "http://a.example".to_string(),
                "http://b.example".to_string()
            ])
        );
    }

    #[test]
    fn test_override_invalid_port() {
        let mut config = Config::default();
        let result = config.apply_overrides(vars(&[("SERVER_PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_override_invalid_delete_policy() {
        let mut config = Config::default();
        let result = config.apply_overrides(vars(&[("DELETE_POLICY", "sometimes")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_override_empty_origins_is_permissive() {
        let mut config = Config::default();
        config.server.allowed_origins = Some(vec!["http://a.example".to_string()]);

        config.apply_overrides(vars(&[("ALLOWED_ORIGINS", "")])).unwrap();
        assert!(config.server.allowed_origins.is_none());

        config.apply_overrides(vars(&[("ALLOWED_ORIGINS", " , ")])).unwrap();
        assert!(config.server.allowed_origins.is_none());
    }

    #[test]
    fn test_toml_empty_origins_is_permissive() {
        let config = Config::from_toml_str("[server]\nallowed_origins = []\n").unwrap();
        assert!(config.server.allowed_origins.is_none());
    }

    #[test]
    fn test_from_toml_file_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\n[store]\nseed_samples = true").unwrap();

        // Only valid values: other tests load files concurrently
        unsafe {
            std::env::set_var("SERVER_PORT", "9311");
            std::env::set_var("SEED_SAMPLES", "false");
            std::env::set_var("ALLOWED_ORIGINS", "http://env.example");
        }

        let result = Config::from_toml_file(file.path());

        unsafe {
            std::env::remove_var("SERVER_PORT");
            std::env::remove_var("SEED_SAMPLES");
            std::env::remove_var("ALLOWED_ORIGINS");
        }

        let config = result.unwrap();
        assert_eq!(config.server.port, 9311);
        assert!(!config.store.seed_samples);
        assert_eq!(
            config.server.allowed_origins,
            Some(vec!["http://env.example".to_string()])
        );
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = Config::from_toml_file("/nonexistent/schedule.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
