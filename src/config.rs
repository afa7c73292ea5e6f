//! 設定の読み込み
//!
//! 優先順位（後のものが優先）:
//! 1. 埋め込みの `config/default.toml`
//! 2. カレントディレクトリの `library.toml`（任意）
//! 3. `LIBRARY_CONFIG` で指定したファイル（任意）
//! 4. `LIBRARY__SECTION__KEY` 形式の環境変数
//! 5. `DATABASE_URL` / `PORT`

use crate::domain::loan::LoanPolicy;
use ::config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULTS: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 貸出ポリシーの設定（日数）
#[derive(Debug, Clone, Deserialize)]
pub struct LoanConfig {
    pub borrow_period_days: u32,
    pub penalty_period_days: u32,
}

impl LoanConfig {
    pub fn policy(&self) -> LoanPolicy {
        LoanPolicy::from_days(self.borrow_period_days, self.penalty_period_days)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub loan: LoanConfig,
}

impl AppConfig {
    /// `.env`、設定ファイル、環境変数から設定を読み込む
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::with_name("library").required(false));

        if let Ok(custom_path) = std::env::var("LIBRARY_CONFIG") {
            builder = builder.add_source(File::with_name(&custom_path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port must be > 0".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be > 0".into(),
            ));
        }
        if self.loan.borrow_period_days == 0 {
            return Err(ConfigError::Message(
                "loan.borrow_period_days must be > 0".into(),
            ));
        }
        if self.loan.penalty_period_days == 0 {
            return Err(ConfigError::Message(
                "loan.penalty_period_days must be > 0".into(),
            ));
        }
        Ok(())
    }
}
