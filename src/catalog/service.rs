//! # 提供商目录服务
//!
//! 业务逻辑与存储访问；错误消息是对外契约的一部分，调用方会按字面量匹配。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use entity::{AuthProviders, auth_providers};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde_json::Value;

use super::types::{
    AuthProvider, AuthProviderDto, CreateAuthProviderInput, ProviderFilter, ProviderFindConfig,
    UpdateAuthProviderInput,
};
use crate::{
    config::{ProviderDeletePolicy, SeedProvider},
    error::{AuthModuleError, Context, Result},
    identity::IdentityResolver,
    ldebug, linfo,
    logging::{LogComponent, LogStage},
    lwarn, query,
};

const MAX_PROVIDER_LEN: usize = 50;
const MAX_NAME_LEN: usize = 100;

/// 提供商目录服务
#[derive(Clone)]
pub struct AuthProviderService {
    db: Arc<DatabaseConnection>,
    delete_policy: ProviderDeletePolicy,
}

impl AuthProviderService {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, delete_policy: ProviderDeletePolicy) -> Self {
        Self { db, delete_policy }
    }

    #[must_use]
    pub const fn delete_policy(&self) -> ProviderDeletePolicy {
        self.delete_policy
    }

    /// 列出提供商（默认按插入顺序）
    pub async fn list(
        &self,
        filter: &ProviderFilter,
        config: &ProviderFindConfig,
    ) -> Result<Vec<AuthProviderDto>> {
        list_models(self.db.as_ref(), filter, config).await
    }

    /// 列出提供商并返回分页前的总数
    ///
    /// 计数和列表在同一个事务中读取，两者基于同一份数据。
    pub async fn list_and_count(
        &self,
        filter: &ProviderFilter,
        config: &ProviderFindConfig,
    ) -> Result<(Vec<AuthProviderDto>, u64)> {
        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let count = query::apply_filter(AuthProviders::find(), &filter.to_clauses())
            .count(&txn)
            .await
            .context("Failed to count auth providers")?;
        let records = list_models(&txn, filter, config).await?;
        txn.commit().await.context("Failed to finish provider listing")?;
        Ok((records, count))
    }

    /// 获取单个提供商
    ///
    /// 参数校验先于任何存储访问。
    pub async fn retrieve(
        &self,
        provider: Option<&str>,
        config: &ProviderFindConfig,
    ) -> Result<AuthProviderDto> {
        let provider = provider
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AuthModuleError::validation("authProvider - provider must be defined"))?;

        let model = find_model(self.db.as_ref(), provider).await?.ok_or_else(|| {
            AuthModuleError::not_found(format!(
                "AuthProvider with provider: {provider} was not found"
            ))
        })?;

        to_dto(model, config)
    }

    /// 按 code 查找完整记录，分发时使用（每次都读取存储，不缓存激活状态）
    pub async fn find_provider(&self, provider: &str) -> Result<Option<AuthProvider>> {
        find_model(self.db.as_ref(), provider)
            .await?
            .map(AuthProvider::try_from)
            .transpose()
    }

    /// 批量创建提供商，整批在一个事务内提交
    pub async fn create(&self, records: Vec<CreateAuthProviderInput>) -> Result<Vec<AuthProvider>> {
        validate_create_batch(&records)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            created.push(insert_provider(&txn, record).await?);
        }
        txn.commit().await.context("Failed to commit provider creation")?;

        linfo!(
            "system",
            LogStage::Admin,
            LogComponent::Catalog,
            "providers_created",
            &format!(
                "Created auth providers: {}",
                created.iter().map(|p| p.provider.as_str()).collect::<Vec<_>>().join(", ")
            )
        );
        Ok(created)
    }

    /// 批量更新提供商，只修改传入的字段
    pub async fn update(&self, records: Vec<UpdateAuthProviderInput>) -> Result<Vec<AuthProvider>> {
        for record in &records {
            validate_update(record)?;
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let mut updated = Vec::with_capacity(records.len());
        for record in &records {
            updated.push(update_provider(&txn, record).await?);
        }
        txn.commit().await.context("Failed to commit provider update")?;

        linfo!(
            "system",
            LogStage::Admin,
            LogComponent::Catalog,
            "providers_updated",
            &format!("Updated {} auth providers", updated.len())
        );
        Ok(updated)
    }

    /// 批量删除提供商；不存在的 code 被忽略
    pub async fn delete(&self, providers: &[String]) -> Result<()> {
        if providers.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.context("Failed to begin transaction")?;

        let existing: Vec<String> = AuthProviders::find()
            .filter(auth_providers::Column::Provider.is_in(providers.iter().cloned()))
            .all(&txn)
            .await
            .context("Failed to load auth providers for deletion")?
            .into_iter()
            .map(|model| model.provider)
            .collect();

        if existing.is_empty() {
            txn.commit().await.context("Failed to commit provider deletion")?;
            ldebug!(
                "system",
                LogStage::Admin,
                LogComponent::Catalog,
                "providers_delete_noop",
                "No matching auth providers to delete"
            );
            return Ok(());
        }

        // 先删除提供商取得写锁，之后统计到的关联身份不会再被并发插入改变；
        // 策略拒绝时事务在返回前回滚
        AuthProviders::delete_many()
            .filter(auth_providers::Column::Provider.is_in(existing.iter().cloned()))
            .exec(&txn)
            .await
            .context("Failed to delete auth providers")?;
        self.apply_delete_policy(&txn, &existing).await?;

        txn.commit().await.context("Failed to commit provider deletion")?;

        linfo!(
            "system",
            LogStage::Admin,
            LogComponent::Catalog,
            "providers_deleted",
            &format!("Deleted auth providers: {}", existing.join(", ")),
            policy = ?self.delete_policy
        );
        Ok(())
    }

    async fn apply_delete_policy(&self, txn: &DatabaseTransaction, existing: &[String]) -> Result<()> {
        match self.delete_policy {
            ProviderDeletePolicy::Restrict => {
                for provider in existing {
                    let identities = IdentityResolver::count_linked(txn, provider).await?;
                    if identities > 0 {
                        return Err(AuthModuleError::ProviderInUse {
                            provider: provider.clone(),
                            identities,
                        });
                    }
                }
            }
            ProviderDeletePolicy::Cascade => {
                let removed = IdentityResolver::unlink_providers(txn, existing).await?;
                if removed > 0 {
                    linfo!(
                        "system",
                        LogStage::Admin,
                        LogComponent::Catalog,
                        "identities_cascaded",
                        &format!("Removed {removed} auth identities linked to deleted providers")
                    );
                }
            }
            ProviderDeletePolicy::Retain => {
                for provider in existing {
                    let identities = IdentityResolver::count_linked(txn, provider).await?;
                    if identities > 0 {
                        lwarn!(
                            "system",
                            LogStage::Admin,
                            LogComponent::Catalog,
                            "identities_retained",
                            &format!(
                                "Provider {provider} deleted with {identities} auth identities still linked"
                            )
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// 写入种子提供商，已存在的 code 保持不变；返回新插入的数量
    pub async fn ensure_seed_providers(&self, seeds: &[SeedProvider]) -> Result<usize> {
        let mut inserted: usize = 0;
        for seed in seeds {
            let now = Utc::now().naive_utc();
            let metadata = seed
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let model = auth_providers::ActiveModel {
                provider: Set(seed.provider.clone()),
                name: Set(seed.name.clone()),
                is_active: Set(seed.is_active),
                metadata: Set(metadata),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            let rows = AuthProviders::insert(model)
                .on_conflict(
                    OnConflict::column(auth_providers::Column::Provider)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(self.db.as_ref())
                .await
                .with_context(|| format!("Failed to seed auth provider {}", seed.provider))?;
            if rows > 0 {
                inserted += 1;
            }
        }

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Catalog,
            "seed_providers",
            &format!("Seeded {inserted} of {} auth providers", seeds.len())
        );
        Ok(inserted)
    }
}

async fn list_models<C: ConnectionTrait>(
    conn: &C,
    filter: &ProviderFilter,
    config: &ProviderFindConfig,
) -> Result<Vec<AuthProviderDto>> {
    query::apply(AuthProviders::find(), &filter.to_clauses(), config)
        .all(conn)
        .await
        .context("Failed to list auth providers")?
        .into_iter()
        .map(|model| to_dto(model, config))
        .collect()
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    provider: &str,
) -> Result<Option<auth_providers::Model>> {
    AuthProviders::find()
        .filter(auth_providers::Column::Provider.eq(provider))
        .one(conn)
        .await
        .context("Failed to find auth provider")
}

fn to_dto(model: auth_providers::Model, config: &ProviderFindConfig) -> Result<AuthProviderDto> {
    let record = AuthProviderDto::from(AuthProvider::try_from(model)?);
    let projected = query::project(serde_json::to_value(record)?, config.projection());
    Ok(serde_json::from_value(projected)?)
}

async fn insert_provider(
    txn: &DatabaseTransaction,
    record: CreateAuthProviderInput,
) -> Result<AuthProvider> {
    let now = Utc::now().naive_utc();
    let metadata = record
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let code = record.provider.clone();

    let model = auth_providers::ActiveModel {
        provider: Set(record.provider),
        name: Set(record.name),
        is_active: Set(record.is_active.unwrap_or(true)),
        metadata: Set(metadata),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match model.insert(txn).await.context("Failed to create auth provider") {
        Ok(created) => AuthProvider::try_from(created),
        Err(err) if err.is_unique_violation() => Err(AuthModuleError::duplicate(format!(
            "AuthProvider with provider: {code} already exists"
        ))),
        Err(err) => Err(err),
    }
}

async fn update_provider(
    txn: &DatabaseTransaction,
    record: &UpdateAuthProviderInput,
) -> Result<AuthProvider> {
    let mut statement = AuthProviders::update_many()
        .col_expr(
            auth_providers::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(auth_providers::Column::Provider.eq(record.provider.as_str()));

    if let Some(name) = &record.name {
        statement = statement.col_expr(auth_providers::Column::Name, Expr::value(name.clone()));
    }
    if let Some(is_active) = record.is_active {
        statement = statement.col_expr(auth_providers::Column::IsActive, Expr::value(is_active));
    }
    if let Some(metadata) = &record.metadata {
        statement = statement.col_expr(
            auth_providers::Column::Metadata,
            Expr::value(serde_json::to_string(metadata)?),
        );
    }

    let result = statement
        .exec(txn)
        .await
        .context("Failed to update auth provider")?;
    if result.rows_affected == 0 {
        return Err(provider_not_found(&record.provider));
    }

    find_model(txn, &record.provider)
        .await?
        .ok_or_else(|| provider_not_found(&record.provider))
        .and_then(AuthProvider::try_from)
}

fn provider_not_found(provider: &str) -> AuthModuleError {
    AuthModuleError::not_found(format!("AuthProvider with provider \"{provider}\" not found"))
}

fn validate_create_batch(records: &[CreateAuthProviderInput]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        validate_code(&record.provider)?;
        validate_name(&record.name)?;
        validate_metadata(record.metadata.as_ref())?;
        if !seen.insert(record.provider.as_str()) {
            return Err(AuthModuleError::duplicate(format!(
                "AuthProvider with provider: {} already exists",
                record.provider
            )));
        }
    }
    Ok(())
}

fn validate_update(record: &UpdateAuthProviderInput) -> Result<()> {
    crate::ensure_valid!(
        !record.provider.is_empty(),
        "authProvider - provider must be defined"
    );
    if let Some(name) = &record.name {
        validate_name(name)?;
    }
    validate_metadata(record.metadata.as_ref())
}

fn validate_code(provider: &str) -> Result<()> {
    crate::ensure_valid!(!provider.is_empty(), "authProvider - provider must be defined");
    crate::ensure_valid!(
        provider.chars().count() <= MAX_PROVIDER_LEN,
        "authProvider - provider must be at most {} characters",
        MAX_PROVIDER_LEN
    );
    crate::ensure_valid!(
        !provider.chars().any(char::is_whitespace),
        "authProvider - provider must not contain whitespace: {}",
        provider
    );
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    crate::ensure_valid!(!name.trim().is_empty(), "authProvider - name must be defined");
    crate::ensure_valid!(
        name.chars().count() <= MAX_NAME_LEN,
        "authProvider - name must be at most {} characters",
        MAX_NAME_LEN
    );
    Ok(())
}

fn validate_metadata(metadata: Option<&Value>) -> Result<()> {
    crate::ensure_valid!(
        metadata.is_none_or(Value::is_object),
        "authProvider - metadata must be an object"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ProviderField;
    use crate::identity::ActorRef;
    use crate::testing::{fixtures::seed_providers, helpers::create_test_db};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    async fn service(policy: ProviderDeletePolicy) -> AuthProviderService {
        let service = AuthProviderService::new(Arc::new(create_test_db().await.unwrap()), policy);
        service.ensure_seed_providers(&seed_providers()).await.unwrap();
        service
    }

    fn codes(records: &[AuthProviderDto]) -> Vec<String> {
        records.iter().filter_map(|r| r.provider.clone()).collect()
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        assert_eq!(service.ensure_seed_providers(&seed_providers()).await.unwrap(), 0);
        let (_, count) = service
            .list_and_count(&ProviderFilter::default(), &ProviderFindConfig::default())
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[rstest]
    #[case(ProviderFilter::default(), vec!["manual", "disabled", "store", "admin"])]
    #[case(ProviderFilter::active(true), vec!["manual", "store", "admin"])]
    #[case(ProviderFilter::active(false), vec!["disabled"])]
    #[case(ProviderFilter::providers(["admin", "manual"]), vec!["manual", "admin"])]
    #[case(ProviderFilter::providers(["unknown"]), vec![])]
    #[case(ProviderFilter::providers(Vec::<String>::new()), vec![])]
    #[tokio::test]
    async fn test_list_filters(#[case] filter: ProviderFilter, #[case] expected: Vec<&str>) {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let (records, count) = service
            .list_and_count(&filter, &ProviderFindConfig::default())
            .await
            .unwrap();
        assert_eq!(codes(&records), expected);
        assert_eq!(count, expected.len() as u64);
    }

    #[tokio::test]
    async fn test_count_ignores_pagination() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let config = ProviderFindConfig::default().with_skip(1).with_take(2);
        let (records, count) = service
            .list_and_count(&ProviderFilter::default(), &config)
            .await
            .unwrap();
        assert_eq!(codes(&records), vec!["disabled", "store"]);
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_projection_omits_unselected_fields() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let config = ProviderFindConfig::select([ProviderField::Provider]);
        let record = service.retrieve(Some("manual"), &config).await.unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "provider": "manual" })
        );
    }

    #[tokio::test]
    async fn test_selected_null_fields_are_kept() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let config = ProviderFindConfig::select([ProviderField::Provider, ProviderField::Metadata]);
        let record = service.retrieve(Some("manual"), &config).await.unwrap();
        assert_eq!(record.metadata, Some(None));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "provider": "manual", "metadata": null })
        );

        let full = service
            .retrieve(Some("manual"), &ProviderFindConfig::default())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&full).unwrap(),
            json!({ "provider": "manual", "name": "manual", "is_active": true, "metadata": null })
        );
    }

    #[tokio::test]
    async fn test_retrieve_errors() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let config = ProviderFindConfig::default();

        let err = service.retrieve(None, &config).await.unwrap_err();
        assert_eq!(err.to_string(), "authProvider - provider must be defined");

        let err = service.retrieve(Some("missing"), &config).await.unwrap_err();
        assert_eq!(err.to_string(), "AuthProvider with provider: missing was not found");
    }

    #[tokio::test]
    async fn test_create_batch_is_atomic() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let err = service
            .create(vec![
                CreateAuthProviderInput::new("github", "GitHub"),
                CreateAuthProviderInput::new("manual", "Again"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthModuleError::Duplicate { .. }));
        assert_eq!(err.to_string(), "AuthProvider with provider: manual already exists");

        assert!(service.find_provider("github").await.unwrap().is_none());
        let manual = service.find_provider("manual").await.unwrap().unwrap();
        assert_eq!(manual.name, "manual");
    }

    #[rstest]
    #[case(CreateAuthProviderInput::new("", "Empty"))]
    #[case(CreateAuthProviderInput::new("has space", "Space"))]
    #[case(CreateAuthProviderInput::new("ok", "  "))]
    #[case(CreateAuthProviderInput::new("ok", "Ok").metadata(json!(["not", "object"])))]
    #[tokio::test]
    async fn test_create_rejects_invalid_records(#[case] record: CreateAuthProviderInput) {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let err = service.create(vec![record]).await.unwrap_err();
        assert!(matches!(err, AuthModuleError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        service
            .create(vec![CreateAuthProviderInput::new("github", "GitHub")
                .active(false)
                .metadata(json!({ "client_id": "abc" }))])
            .await
            .unwrap();

        let updated = service
            .update(vec![UpdateAuthProviderInput::new("github").name("GitHub SSO")])
            .await
            .unwrap();
        assert_eq!(
            updated,
            vec![AuthProvider {
                provider: "github".to_string(),
                name: "GitHub SSO".to_string(),
                is_active: false,
                metadata: Some(json!({ "client_id": "abc" })),
            }]
        );
    }

    #[tokio::test]
    async fn test_update_missing_rolls_back_batch() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let err = service
            .update(vec![
                UpdateAuthProviderInput::new("manual").active(false),
                UpdateAuthProviderInput::new("missing").name("x"),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "AuthProvider with provider \"missing\" not found");
        assert!(service.find_provider("manual").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        let codes_to_delete = vec!["store".to_string()];
        service.delete(&codes_to_delete).await.unwrap();
        service.delete(&codes_to_delete).await.unwrap();

        let records = service
            .list(&ProviderFilter::providers(["store"]), &ProviderFindConfig::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    async fn link_identity(service: &AuthProviderService, provider: &str) -> IdentityResolver {
        let resolver = IdentityResolver::new(service.db.clone());
        resolver
            .resolve(provider, "a@example.com", Some(&ActorRef::new("user", "usr_1")), None)
            .await
            .unwrap();
        resolver
    }

    #[tokio::test]
    async fn test_delete_restrict_refuses_linked_provider() {
        let service = service(ProviderDeletePolicy::Restrict).await;
        link_identity(&service, "manual").await;

        let err = service.delete(&["manual".to_string()]).await.unwrap_err();
        assert!(matches!(err, AuthModuleError::ProviderInUse { identities: 1, .. }));
        assert!(service.find_provider("manual").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_cascade_removes_identities() {
        let service = service(ProviderDeletePolicy::Cascade).await;
        let resolver = link_identity(&service, "manual").await;

        service.delete(&["manual".to_string()]).await.unwrap();
        assert!(service.find_provider("manual").await.unwrap().is_none());
        assert!(resolver.find("manual", "a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_retain_keeps_identities() {
        let service = service(ProviderDeletePolicy::Retain).await;
        let resolver = link_identity(&service, "manual").await;

        service.delete(&["manual".to_string()]).await.unwrap();
        assert!(service.find_provider("manual").await.unwrap().is_none());
        assert!(resolver.find("manual", "a@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deactivation_keeps_identities() {
        let service = service(ProviderDeletePolicy::Cascade).await;
        let resolver = link_identity(&service, "manual").await;

        service
            .update(vec![UpdateAuthProviderInput::new("manual").active(false)])
            .await
            .unwrap();
        assert!(resolver.find("manual", "a@example.com").await.unwrap().is_some());
    }
}
