//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod database;

pub use app_config::{
    AppConfig, AuthSettings, CredentialSeed, ProviderDeletePolicy, SeedProvider, StrategyKind,
};
pub use database::DatabaseConfig;

use std::env;
use std::path::Path;

use crate::{
    configuration_error,
    error::{AuthModuleError, Result},
    linfo,
    logging::{LogComponent, LogStage},
};

const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// 按 `RUST_ENV` 加载配置文件（`config/config.{env}.toml`）
pub fn load_config() -> Result<AppConfig> {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let config_file = format!("config/config.{env}.toml");
    load_config_from(&config_file)
}

/// 从指定路径加载配置文件
pub fn load_config_from(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AuthModuleError::configuration(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let config_content = std::fs::read_to_string(path).map_err(|e| {
        AuthModuleError::configuration_with_source(
            format!("读取配置文件失败: {}", path.display()),
            e,
        )
    })?;

    let config = parse_config(&config_content)?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Config,
        "load_config",
        "配置加载完成",
        path = %path.display(),
        seed_providers = config.auth.providers.len()
    );

    Ok(config)
}

/// 解析并验证 TOML 配置内容
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<()> {
    if config.database.url.is_empty() {
        return Err(configuration_error!("数据库URL不能为空"));
    }

    if config.database.max_connections == 0 {
        return Err(configuration_error!("数据库最大连接数必须大于0"));
    }

    if config.auth.strategy_timeout_ms == 0 {
        return Err(configuration_error!("认证策略超时时间必须大于0"));
    }

    if !BCRYPT_COST_RANGE.contains(&config.auth.bcrypt_cost) {
        return Err(configuration_error!(
            "bcrypt_cost 必须在 {} 到 {} 之间",
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end()
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for seed in &config.auth.providers {
        if seed.provider.trim().is_empty() {
            return Err(configuration_error!("种子提供商的 provider 不能为空"));
        }
        if !seen.insert(seed.provider.as_str()) {
            return Err(configuration_error!("种子提供商重复: {}", seed.provider));
        }
    }

    for credential in &config.auth.credentials {
        if credential.email.trim().is_empty() {
            return Err(configuration_error!("凭据的 email 不能为空"));
        }
        if credential.password.is_some() == credential.password_hash.is_some() {
            return Err(configuration_error!(
                "凭据 {} 必须且只能设置 password 或 password_hash 之一",
                credential.email
            ));
        }
        if credential.actor_type.is_some() != credential.actor_id.is_some() {
            return Err(configuration_error!(
                "凭据 {} 的 actor_type 和 actor_id 必须同时设置",
                credential.email
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
connect_timeout = 5

[auth]
strategy_timeout_ms = 2500
on_provider_delete = "cascade"

[[auth.providers]]
provider = "manual"
name = "Email & password"

[[auth.providers]]
provider = "disabled"
name = "Disabled provider"
is_active = false

[auth.bindings]
manual = "emailpass"
admin = "jwt"

[[auth.credentials]]
email = "admin@example.com"
password = "secret"
actor_type = "user"
actor_id = "usr_admin"
"#;

    #[test]
    fn test_parse_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.auth.strategy_timeout_ms, 2500);
        assert_eq!(config.auth.on_provider_delete, ProviderDeletePolicy::Cascade);
        assert_eq!(config.auth.providers.len(), 2);
        assert!(config.auth.providers[0].is_active);
        assert!(!config.auth.providers[1].is_active);
        assert_eq!(config.auth.bindings.get("admin"), Some(&StrategyKind::Jwt));
        assert_eq!(config.auth.credentials.len(), 1);
        assert_eq!(config.auth.credentials[0].actor_id.as_deref(), Some("usr_admin"));
    }

    #[test]
    fn test_credential_needs_exactly_one_secret() {
        let content = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
connect_timeout = 5

[[auth.credentials]]
email = "a@example.com"
password = "plain"
password_hash = "$2b$04$abcdefghijklmnopqrstuu"
"#;
        let err = parse_config(content).unwrap_err();
        assert!(err.to_string().contains("a@example.com"));
    }

    #[test]
    fn test_auth_section_defaults() {
        let config = parse_config("[database]\nurl = \"sqlite::memory:\"\nmax_connections = 1\nconnect_timeout = 5\n").unwrap();
        assert_eq!(config.auth.strategy_timeout_ms, 10_000);
        assert_eq!(config.auth.on_provider_delete, ProviderDeletePolicy::Restrict);
        assert!(config.auth.providers.is_empty());
        assert!(config.auth.credentials.is_empty());
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_duplicate_seed_rejected() {
        let content = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
connect_timeout = 5

[[auth.providers]]
provider = "manual"
name = "a"

[[auth.providers]]
provider = "manual"
name = "b"
"#;
        let err = parse_config(content).unwrap_err();
        assert!(matches!(err, AuthModuleError::Configuration { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config_from("config/does-not-exist.toml").unwrap_err();
        assert!(err.to_string().contains("配置文件不存在"));
    }
}
