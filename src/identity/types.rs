//! # 身份类型定义

use chrono::{DateTime, Utc};
use entity::auth_identities;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{AuthModuleError, Result};
use crate::query::{FilterClause, FindConfig, QueryField};

/// 内部主体引用（用户、客户、管理员等）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub actor_type: String,
    pub actor_id: String,
}

impl ActorRef {
    pub fn new(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor_type, self.actor_id)
    }
}

/// 外部凭据与内部主体的关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: String,
    pub provider: String,
    pub external_subject: String,
    pub actor: ActorRef,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<auth_identities::Model> for AuthIdentity {
    type Error = AuthModuleError;

    fn try_from(model: auth_identities::Model) -> Result<Self> {
        let metadata = model
            .metadata
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()?;

        Ok(Self {
            id: model.id,
            provider: model.provider,
            external_subject: model.entity_id,
            actor: ActorRef::new(model.actor_type, model.actor_id),
            metadata,
            created_at: model.created_at.and_utc(),
        })
    }
}

/// 身份解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: AuthIdentity,
    /// 是否为首次关联
    pub is_new: bool,
}

/// 身份可过滤/可排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Id,
    Provider,
    ExternalSubject,
    ActorType,
    ActorId,
    CreatedAt,
}

impl QueryField for IdentityField {
    type Entity = auth_identities::Entity;

    fn column(self) -> auth_identities::Column {
        match self {
            Self::Id => auth_identities::Column::Id,
            Self::Provider => auth_identities::Column::Provider,
            Self::ExternalSubject => auth_identities::Column::EntityId,
            Self::ActorType => auth_identities::Column::ActorType,
            Self::ActorId => auth_identities::Column::ActorId,
            Self::CreatedAt => auth_identities::Column::CreatedAt,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Provider => "provider",
            Self::ExternalSubject => "external_subject",
            Self::ActorType => "actor_type",
            Self::ActorId => "actor_id",
            Self::CreatedAt => "created_at",
        }
    }

    fn default_order_column() -> auth_identities::Column {
        auth_identities::Column::CreatedAt
    }
}

/// 身份查询配置
pub type IdentityFindConfig = FindConfig<IdentityField>;

/// 身份列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    pub provider: Option<Vec<String>>,
    pub actor: Option<ActorRef>,
}

impl IdentityFilter {
    #[must_use]
    pub fn providers<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: Some(providers.into_iter().map(Into::into).collect()),
            actor: None,
        }
    }

    #[must_use]
    pub fn actor(actor: ActorRef) -> Self {
        Self {
            provider: None,
            actor: Some(actor),
        }
    }

    #[must_use]
    pub fn to_clauses(&self) -> Vec<FilterClause<IdentityField>> {
        let mut clauses = Vec::new();
        if let Some(providers) = &self.provider {
            clauses.push(FilterClause::is_in(
                IdentityField::Provider,
                providers.iter().cloned(),
            ));
        }
        if let Some(actor) = &self.actor {
            clauses.push(FilterClause::equals(
                IdentityField::ActorType,
                actor.actor_type.clone(),
            ));
            clauses.push(FilterClause::equals(
                IdentityField::ActorId,
                actor.actor_id.clone(),
            ));
        }
        clauses
    }
}
