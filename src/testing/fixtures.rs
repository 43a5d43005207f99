//! # 测试数据 Fixtures

use serde_json::json;

use crate::config::{AuthSettings, SeedProvider};

/// 标准种子提供商：manual / disabled（未激活）/ store / admin
#[must_use]
pub fn seed_providers() -> Vec<SeedProvider> {
    [
        ("manual", true),
        ("disabled", false),
        ("store", true),
        ("admin", true),
    ]
    .into_iter()
    .map(|(provider, is_active)| SeedProvider {
        provider: provider.to_string(),
        name: provider.to_string(),
        is_active,
        metadata: None,
    })
    .collect()
}

/// 若干激活状态的提供商，名称与 code 相同
#[must_use]
pub fn active_providers<I, S>(codes: I) -> Vec<SeedProvider>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    codes
        .into_iter()
        .map(|code| {
            let provider = code.into();
            SeedProvider {
                name: provider.clone(),
                provider,
                is_active: true,
                metadata: None,
            }
        })
        .collect()
}

/// 带 JWT 配置的提供商
#[must_use]
pub fn jwt_seed_provider(provider: &str, secret: &str) -> SeedProvider {
    SeedProvider {
        provider: provider.to_string(),
        name: format!("{provider} tokens"),
        is_active: true,
        metadata: Some(json!({ "secret": secret })),
    }
}

/// 使用标准种子提供商的认证配置
#[must_use]
pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        providers: seed_providers(),
        bcrypt_cost: 4,
        ..AuthSettings::default()
    }
}
