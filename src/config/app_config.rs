//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// 认证模块配置
    #[serde(default)]
    pub auth: AuthSettings,
}

/// 删除提供商时如何处理已关联的身份
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderDeletePolicy {
    /// 存在关联身份时拒绝删除
    #[default]
    Restrict,
    /// 在同一事务中删除关联身份
    Cascade,
    /// 保留身份记录，仅记录告警
    Retain,
}

/// 可由配置构建的策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// 邮箱 + 密码（bcrypt）
    EmailPass,
    /// HS256 JWT 持有者令牌
    Jwt,
}

/// 启动时写入目录的种子提供商
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProvider {
    pub provider: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// 启动时写入内存凭据存储的账号
///
/// `password_hash` 为 bcrypt 哈希；`password` 是明文，加载时哈希，只应出现在开发配置中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSeed {
    pub email: String,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
}

/// 认证模块配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// 单次策略校验的默认超时（毫秒）
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,
    /// 删除提供商时的身份处理策略
    #[serde(default)]
    pub on_provider_delete: ProviderDeletePolicy,
    /// 种子提供商
    #[serde(default)]
    pub providers: Vec<SeedProvider>,
    /// provider code -> 策略类型
    #[serde(default)]
    pub bindings: HashMap<String, StrategyKind>,
    /// 邮箱密码策略的账号
    #[serde(default)]
    pub credentials: Vec<CredentialSeed>,
    /// 明文密码哈希时使用的 bcrypt 强度
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            strategy_timeout_ms: default_strategy_timeout_ms(),
            on_provider_delete: ProviderDeletePolicy::default(),
            providers: Vec::new(),
            bindings: HashMap::new(),
            credentials: Vec::new(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl AuthSettings {
    /// 默认策略超时
    #[must_use]
    pub const fn strategy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.strategy_timeout_ms)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_strategy_timeout_ms() -> u64 {
    10_000
}

const fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}
