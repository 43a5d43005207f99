//! # 错误处理测试

use crate::error::{AuthModuleError, Context, ErrorCategory, Result};
use std::error::Error;

#[test]
fn test_catalog_messages_are_unprefixed() {
    let err = AuthModuleError::validation("authProvider - provider must be defined");
    assert_eq!(err.to_string(), "authProvider - provider must be defined");

    let err = crate::not_found_error!("AuthProvider with provider: {} was not found", "x");
    assert_eq!(err.to_string(), "AuthProvider with provider: x was not found");
}

#[test]
fn test_provider_inactive_message() {
    let err = AuthModuleError::ProviderInactive {
        provider: "disabled".to_string(),
    };
    assert_eq!(err.to_string(), "AuthProvider with provider: disabled is not active");
}

#[test]
fn test_configuration_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = AuthModuleError::configuration_with_source("配置文件加载失败", io_err);

    assert!(matches!(err, AuthModuleError::Configuration { .. }));
    assert_eq!(err.to_string(), "配置错误: 配置文件加载失败");
    assert!(err.source().is_some());
}

#[test]
fn test_categories() {
    let client = [
        AuthModuleError::validation("v"),
        AuthModuleError::duplicate("d"),
        AuthModuleError::ProviderInUse {
            provider: "p".to_string(),
            identities: 2,
        },
    ];
    assert!(client.iter().all(|e| e.category() == ErrorCategory::Client));

    let server = [
        crate::configuration_error!("missing binding for {}", "manual"),
        AuthModuleError::strategy("p", "down"),
        AuthModuleError::StrategyTimeout {
            provider: "p".to_string(),
            timeout_ms: 10,
        },
        AuthModuleError::database("db"),
    ];
    assert!(server.iter().all(|e| e.category() == ErrorCategory::Server));
}

#[test]
fn test_context_wraps_and_keeps_root() {
    let result: std::result::Result<(), sea_orm::DbErr> =
        Err(sea_orm::DbErr::Custom("boom".to_string()));

    let err = result.context("Failed to list auth providers").unwrap_err();
    assert!(matches!(err, AuthModuleError::Context { .. }));
    assert!(err.to_string().starts_with("Failed to list auth providers: "));
    assert!(matches!(err.root(), AuthModuleError::Database { .. }));
    assert_eq!(err.category(), ErrorCategory::Server);
    assert!(!err.is_unique_violation());
}

#[test]
fn test_ensure_valid_macro() {
    fn check(code: &str) -> Result<()> {
        crate::ensure_valid!(!code.is_empty(), "authProvider - provider must be defined");
        Ok(())
    }

    assert!(check("manual").is_ok());
    assert!(matches!(check(""), Err(AuthModuleError::Validation { .. })));
}

#[test]
fn test_toml_error_maps_to_configuration() {
    let err: AuthModuleError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
    assert!(matches!(err, AuthModuleError::Configuration { .. }));
}
