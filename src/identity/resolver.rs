//! # 身份解析器
//!
//! `(provider, external_subject)` 上的查找或创建。唯一性由存储层的唯一索引保证，
//! 插入冲突时重新读取已存在的记录。
//!
//! 新身份只通过一条 `INSERT ... SELECT` 写入，条件是提供商此刻仍在目录中且处于激活状态，
//! 因此策略执行期间被删除或停用的提供商不会留下孤立的身份记录。

use std::sync::Arc;

use chrono::Utc;
use entity::{AuthIdentities, AuthProviders, auth_identities, auth_providers};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::{Expr, Query},
};
use serde_json::Value;
use uuid::Uuid;

use super::types::{ActorRef, AuthIdentity, IdentityFilter, IdentityFindConfig, ResolvedIdentity};
use crate::{
    error::{AuthModuleError, Context, Result},
    ldebug, linfo,
    logging::{LogComponent, LogStage},
    lwarn, not_found_error, query,
};

/// 身份解析器
#[derive(Clone)]
pub struct IdentityResolver {
    db: Arc<DatabaseConnection>,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 查找或创建身份
    ///
    /// 已存在的身份以存储的主体为准；`actor_hint` 与之不一致时返回
    /// [`AuthModuleError::IdentityConflict`]。首次关联必须提供 `actor_hint`。
    pub async fn resolve(
        &self,
        provider: &str,
        external_subject: &str,
        actor_hint: Option<&ActorRef>,
        metadata: Option<Value>,
    ) -> Result<ResolvedIdentity> {
        if external_subject.is_empty() {
            return Err(AuthModuleError::validation(
                "authIdentity - external subject must be defined",
            ));
        }

        if let Some(existing) = self.find(provider, external_subject).await? {
            ensure_same_actor(&existing, actor_hint)?;
            ldebug!(
                "system",
                LogStage::IdentityResolution,
                LogComponent::Identity,
                "resolve_existing",
                &format!("Resolved returning identity {} for {provider}", existing.id)
            );
            return Ok(ResolvedIdentity {
                identity: existing,
                is_new: false,
            });
        }

        let actor = actor_hint.ok_or_else(|| {
            AuthModuleError::validation("actor must be defined to link a new auth identity")
        })?;

        self.insert_or_fetch(provider, external_subject, actor, metadata)
            .await
    }

    async fn insert_or_fetch(
        &self,
        provider: &str,
        external_subject: &str,
        actor: &ActorRef,
        metadata: Option<Value>,
    ) -> Result<ResolvedIdentity> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let metadata = metadata.map(|value| serde_json::to_string(&value)).transpose()?;

        let source = Query::select()
            .exprs([
                Expr::value(id.clone()),
                Expr::value(provider),
                Expr::value(external_subject),
                Expr::value(actor.actor_type.clone()),
                Expr::value(actor.actor_id.clone()),
                Expr::value(metadata),
                Expr::value(now),
                Expr::value(now),
            ])
            .from(AuthProviders)
            .and_where(auth_providers::Column::Provider.eq(provider))
            .and_where(auth_providers::Column::IsActive.eq(true))
            .to_owned();

        let mut insert = Query::insert();
        insert
            .into_table(AuthIdentities)
            .columns([
                auth_identities::Column::Id,
                auth_identities::Column::Provider,
                auth_identities::Column::EntityId,
                auth_identities::Column::ActorType,
                auth_identities::Column::ActorId,
                auth_identities::Column::Metadata,
                auth_identities::Column::CreatedAt,
                auth_identities::Column::UpdatedAt,
            ])
            .select_from(source)
            .map_err(|e| AuthModuleError::database(format!("Invalid auth identity insert: {e}")))?;

        let backend = self.db.get_database_backend();
        match self
            .db
            .execute(backend.build(&insert))
            .await
            .context("Failed to create auth identity")
        {
            Ok(result) if result.rows_affected() == 0 => {
                Err(self.unavailable_provider(provider).await?)
            }
            Ok(_) => {
                let identity = AuthIdentities::find_by_id(id.clone())
                    .one(self.db.as_ref())
                    .await
                    .context("Failed to read created auth identity")?
                    .ok_or_else(|| not_found_error!("AuthIdentity with id: {} was not found", id))
                    .and_then(AuthIdentity::try_from)?;
                linfo!(
                    "system",
                    LogStage::IdentityResolution,
                    LogComponent::Identity,
                    "identity_created",
                    &format!("Linked {provider}:{external_subject} to {actor}"),
                    identity_id = %identity.id
                );
                Ok(ResolvedIdentity {
                    identity,
                    is_new: true,
                })
            }
            Err(err) if err.is_unique_violation() => {
                // 并发请求已经创建了同一身份
                lwarn!(
                    "system",
                    LogStage::IdentityResolution,
                    LogComponent::Identity,
                    "identity_insert_race",
                    &format!("Identity {provider}:{external_subject} created concurrently, re-reading")
                );
                let existing = self.find(provider, external_subject).await?.ok_or(err)?;
                ensure_same_actor(&existing, Some(actor))?;
                Ok(ResolvedIdentity {
                    identity: existing,
                    is_new: false,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// 条件插入没有写入任何行时，说明提供商已被删除或停用
    async fn unavailable_provider(&self, provider: &str) -> Result<AuthModuleError> {
        let record = AuthProviders::find()
            .filter(auth_providers::Column::Provider.eq(provider))
            .one(self.db.as_ref())
            .await
            .context("Failed to find auth provider")?;

        lwarn!(
            "system",
            LogStage::IdentityResolution,
            LogComponent::Identity,
            "identity_provider_unavailable",
            &format!("Refused to link identity, provider {provider} is missing or inactive")
        );
        Ok(match record {
            Some(model) if !model.is_active => AuthModuleError::ProviderInactive {
                provider: provider.to_string(),
            },
            _ => not_found_error!("AuthProvider with provider: {} was not found", provider),
        })
    }

    /// 按 `(provider, external_subject)` 查找身份
    pub async fn find(&self, provider: &str, external_subject: &str) -> Result<Option<AuthIdentity>> {
        AuthIdentities::find()
            .filter(auth_identities::Column::Provider.eq(provider))
            .filter(auth_identities::Column::EntityId.eq(external_subject))
            .one(self.db.as_ref())
            .await
            .context("Failed to find auth identity")?
            .map(AuthIdentity::try_from)
            .transpose()
    }

    /// 按 ID 获取身份
    pub async fn retrieve(&self, id: &str) -> Result<AuthIdentity> {
        if id.is_empty() {
            return Err(AuthModuleError::validation("authIdentity - id must be defined"));
        }

        AuthIdentities::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await
            .context("Failed to retrieve auth identity")?
            .ok_or_else(|| not_found_error!("AuthIdentity with id: {} was not found", id))
            .and_then(AuthIdentity::try_from)
    }

    /// 列出身份（按创建时间排序）
    pub async fn list(
        &self,
        filter: &IdentityFilter,
        config: &IdentityFindConfig,
    ) -> Result<Vec<AuthIdentity>> {
        query::apply(AuthIdentities::find(), &filter.to_clauses(), config)
            .all(self.db.as_ref())
            .await
            .context("Failed to list auth identities")?
            .into_iter()
            .map(AuthIdentity::try_from)
            .collect()
    }

    /// 删除身份，返回实际删除的条数；不存在的 ID 被忽略
    pub async fn delete(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = AuthIdentities::delete_many()
            .filter(auth_identities::Column::Id.is_in(ids.iter().cloned()))
            .exec(self.db.as_ref())
            .await
            .context("Failed to delete auth identities")?;

        linfo!(
            "system",
            LogStage::IdentityResolution,
            LogComponent::Identity,
            "identities_deleted",
            &format!("Deleted {} auth identities", result.rows_affected)
        );
        Ok(result.rows_affected)
    }

    /// 统计某个提供商下关联的身份数量
    ///
    /// 接受任意连接，目录删除时在同一事务内调用。
    pub async fn count_linked<C: ConnectionTrait>(conn: &C, provider: &str) -> Result<u64> {
        AuthIdentities::find()
            .filter(auth_identities::Column::Provider.eq(provider))
            .count(conn)
            .await
            .context("Failed to count linked auth identities")
    }

    /// 删除若干提供商下的全部身份
    pub async fn unlink_providers<C: ConnectionTrait>(conn: &C, providers: &[String]) -> Result<u64> {
        if providers.is_empty() {
            return Ok(0);
        }

        let result = AuthIdentities::delete_many()
            .filter(auth_identities::Column::Provider.is_in(providers.iter().cloned()))
            .exec(conn)
            .await
            .context("Failed to unlink auth identities")?;
        Ok(result.rows_affected)
    }
}

fn ensure_same_actor(identity: &AuthIdentity, actor_hint: Option<&ActorRef>) -> Result<()> {
    match actor_hint {
        Some(requested) if *requested != identity.actor => Err(AuthModuleError::IdentityConflict {
            provider: identity.provider.clone(),
            external_subject: identity.external_subject.clone(),
            stored_actor: identity.actor.to_string(),
            requested_actor: requested.to_string(),
        }),
        _ => Ok(()),
    }
}
