//! # 提供商目录类型定义

use entity::auth_providers;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthModuleError, Result};
use crate::query::{FilterClause, FindConfig, QueryField};

/// 提供商可投影/可过滤字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderField {
    Provider,
    Name,
    IsActive,
    Metadata,
}

impl QueryField for ProviderField {
    type Entity = auth_providers::Entity;

    fn column(self) -> auth_providers::Column {
        match self {
            Self::Provider => auth_providers::Column::Provider,
            Self::Name => auth_providers::Column::Name,
            Self::IsActive => auth_providers::Column::IsActive,
            Self::Metadata => auth_providers::Column::Metadata,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Name => "name",
            Self::IsActive => "is_active",
            Self::Metadata => "metadata",
        }
    }

    fn default_order_column() -> auth_providers::Column {
        auth_providers::Column::Id
    }
}

impl std::str::FromStr for ProviderField {
    type Err = AuthModuleError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "provider" => Ok(Self::Provider),
            "name" => Ok(Self::Name),
            "is_active" => Ok(Self::IsActive),
            "metadata" => Ok(Self::Metadata),
            other => Err(AuthModuleError::validation(format!(
                "authProvider - unknown field: {other}"
            ))),
        }
    }
}

/// 提供商查询配置
pub type ProviderFindConfig = FindConfig<ProviderField>;

/// 提供商列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFilter {
    /// 匹配其中任意一个 provider code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Vec<String>>,
    /// 激活状态精确匹配
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProviderFilter {
    #[must_use]
    pub fn providers<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: Some(providers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// 转换为查询引擎的过滤条件
    #[must_use]
    pub fn to_clauses(&self) -> Vec<FilterClause<ProviderField>> {
        let mut clauses = Vec::new();
        if let Some(providers) = &self.provider {
            clauses.push(FilterClause::is_in(
                ProviderField::Provider,
                providers.iter().cloned(),
            ));
        }
        if let Some(is_active) = self.is_active {
            clauses.push(FilterClause::equals(ProviderField::IsActive, is_active));
        }
        clauses
    }
}

/// 完整的提供商记录（分发时使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProvider {
    pub provider: String,
    pub name: String,
    pub is_active: bool,
    pub metadata: Option<Value>,
}

impl TryFrom<auth_providers::Model> for AuthProvider {
    type Error = AuthModuleError;

    fn try_from(model: auth_providers::Model) -> Result<Self> {
        let metadata = model
            .metadata
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()?;

        Ok(Self {
            provider: model.provider,
            name: model.name,
            is_active: model.is_active,
            metadata,
        })
    }
}

/// 对外返回的提供商记录
///
/// 经过字段投影后，未选择的字段为 `None` 且不会被序列化。`metadata` 多一层 `Option`：
/// 选中但为空时是 `Some(None)`，序列化为 `null`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_nullable"
    )]
    pub metadata: Option<Option<Value>>,
}

/// 出现的键（包括 `null`）反序列化为 `Some`，缺失的键由 `default` 处理
fn present_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Value>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

impl From<AuthProvider> for AuthProviderDto {
    fn from(value: AuthProvider) -> Self {
        Self {
            provider: Some(value.provider),
            name: Some(value.name),
            is_active: Some(value.is_active),
            metadata: Some(value.metadata),
        }
    }
}

/// 创建提供商的输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAuthProviderInput {
    pub provider: String,
    pub name: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl CreateAuthProviderInput {
    pub fn new(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
            is_active: None,
            metadata: None,
        }
    }

    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// 更新提供商的输入
///
/// `provider` 只用于定位记录，不能通过更新修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAuthProviderInput {
    pub provider: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl UpdateAuthProviderInput {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
