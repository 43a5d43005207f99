//! # 错误类型定义

use thiserror::Error;

use super::ErrorCategory;

/// 认证模块主要错误类型
///
/// 目录相关错误（`Validation`/`NotFound`/`Duplicate`）的 `Display` 输出就是原始消息，
/// 调用方依赖这些字面量做消息匹配，不要给它们加前缀。
#[derive(Debug, Error)]
pub enum AuthModuleError {
    /// 缺失或非法的必要参数
    #[error("{message}")]
    Validation { message: String },

    /// 引用的提供商或身份不存在
    #[error("{message}")]
    NotFound { message: String },

    /// 唯一键冲突
    #[error("{message}")]
    Duplicate { message: String },

    /// 对已停用的提供商发起认证
    #[error("AuthProvider with provider: {provider} is not active")]
    ProviderInactive { provider: String },

    /// 删除策略为 restrict 时，提供商仍关联着身份记录
    #[error("AuthProvider with provider: {provider} still has {identities} linked auth identities")]
    ProviderInUse { provider: String, identities: u64 },

    /// 已存储身份的主体与调用方期望不一致
    #[error(
        "AuthIdentity for {provider}:{external_subject} is linked to {stored_actor}, not {requested_actor}"
    )]
    IdentityConflict {
        provider: String,
        external_subject: String,
        stored_actor: String,
        requested_actor: String,
    },

    /// 部署/配置缺陷（例如目录中的提供商没有绑定策略）
    #[error("配置错误: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证策略自身的系统故障（网络、外部服务等），不是凭据被拒绝
    #[error("认证策略错误 ({provider}): {message}")]
    Strategy {
        provider: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证策略在规定时间内没有给出结果
    #[error("认证策略超时 ({provider}): {timeout_ms}ms")]
    StrategyTimeout { provider: String, timeout_ms: u64 },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<sea_orm::DbErr>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 带上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AuthModuleError>,
    },
}

impl AuthModuleError {
    /// 错误归类：调用方错误还是服务端错误
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Duplicate { .. }
            | Self::ProviderInactive { .. }
            | Self::ProviderInUse { .. }
            | Self::IdentityConflict { .. } => ErrorCategory::Client,
            Self::Configuration { .. }
            | Self::Strategy { .. }
            | Self::StrategyTimeout { .. }
            | Self::Database { .. }
            | Self::Serialization { .. }
            | Self::Io { .. } => ErrorCategory::Server,
            Self::Context { source, .. } => source.category(),
        }
    }

    /// 是否为唯一约束冲突（包括被上下文包裹的情况）
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self.root() {
            Self::Database {
                source: Some(err), ..
            } => matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            _ => false,
        }
    }

    /// 创建参数校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// 创建唯一键冲突错误
    pub fn duplicate<T: Into<String>>(message: T) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带源错误的配置错误
    pub fn configuration_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建认证策略错误
    pub fn strategy<P: Into<String>, T: Into<String>>(provider: P, message: T) -> Self {
        Self::Strategy {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// 创建带源错误的认证策略错误
    pub fn strategy_with_source<P, T, E>(provider: P, message: T, source: E) -> Self
    where
        P: Into<String>,
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::Strategy {
            provider: provider.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 获取最内层（去掉上下文包装后）的错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<sea_orm::DbErr> for AuthModuleError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for AuthModuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AuthModuleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for AuthModuleError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration_with_source(format!("TOML解析失败: {err}"), err)
    }
}
