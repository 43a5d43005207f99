//! 认证提供商目录集成测试

use auth_module::{
    AuthModuleError, AuthModuleService,
    auth::StrategyRegistry,
    catalog::{
        CreateAuthProviderInput, ProviderField, ProviderFilter, ProviderFindConfig,
        UpdateAuthProviderInput,
    },
    testing::*,
};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn setup_service() -> AuthModuleService {
    create_test_module(StrategyRegistry::default(), test_auth_settings())
        .await
        .expect("create test module")
}

fn all() -> ProviderFindConfig {
    ProviderFindConfig::default()
}

async fn listed_codes(service: &AuthModuleService, filter: &ProviderFilter) -> Vec<String> {
    service
        .list_auth_providers(filter, &all())
        .await
        .expect("list providers")
        .into_iter()
        .filter_map(|p| p.provider)
        .collect()
}

#[tokio::test]
async fn list_auth_providers() {
    let service = setup_service().await;
    assert_eq!(
        listed_codes(&service, &ProviderFilter::default()).await,
        vec!["manual", "disabled", "store", "admin"]
    );
    assert_eq!(
        listed_codes(&service, &ProviderFilter::providers(["manual"])).await,
        vec!["manual"]
    );
    assert_eq!(
        listed_codes(&service, &ProviderFilter::active(true)).await,
        vec!["manual", "store", "admin"]
    );
}

#[tokio::test]
async fn list_and_count_auth_providers() {
    let service = setup_service().await;

    let (providers, count) = service
        .list_and_count_auth_providers(&ProviderFilter::default(), &all())
        .await
        .unwrap();
    assert_eq!(count, 4);
    assert_eq!(providers.len(), 4);

    let (_, count) = service
        .list_and_count_auth_providers(&ProviderFilter::providers(["manual"]), &all())
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (_, count) = service
        .list_and_count_auth_providers(&ProviderFilter::active(true), &all())
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn retrieve_auth_provider() {
    let service = setup_service().await;

    let provider = service.retrieve_auth_provider(Some("manual"), &all()).await.unwrap();
    assert_eq!(provider.provider.as_deref(), Some("manual"));
    assert_eq!(provider.is_active, Some(true));

    let selected = service
        .retrieve_auth_provider(Some("manual"), &ProviderFindConfig::select([ProviderField::Provider]))
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(selected).unwrap(), json!({ "provider": "manual" }));

    let err = service
        .retrieve_auth_provider(Some("does-not-exist"), &all())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "AuthProvider with provider: does-not-exist was not found");

    let err = service.retrieve_auth_provider(None, &all()).await.unwrap_err();
    assert_eq!(err.to_string(), "authProvider - provider must be defined");
}

#[tokio::test]
async fn delete_auth_provider() {
    let service = setup_service().await;
    let codes = vec!["manual".to_string()];

    service.delete_auth_providers(&codes).await.unwrap();
    assert!(listed_codes(&service, &ProviderFilter::providers(["manual"])).await.is_empty());

    service.delete_auth_providers(&codes).await.unwrap();
}

#[tokio::test]
async fn update_auth_provider() {
    let service = setup_service().await;

    let err = service
        .update_auth_provider(vec![UpdateAuthProviderInput::new("does-not-exist")])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "AuthProvider with provider \"does-not-exist\" not found");

    service
        .update_auth_provider(vec![UpdateAuthProviderInput::new("manual").name("test")])
        .await
        .unwrap();
    let provider = service.retrieve_auth_provider(Some("manual"), &all()).await.unwrap();
    assert_eq!(provider.name.as_deref(), Some("test"));
    assert_eq!(provider.is_active, Some(true));
}

#[tokio::test]
async fn create_auth_provider() {
    let service = setup_service().await;

    service
        .create_auth_provider(vec![CreateAuthProviderInput::new("test", "test provider")])
        .await
        .unwrap();
    let provider = service.retrieve_auth_provider(Some("test"), &all()).await.unwrap();
    assert_eq!(provider.provider.as_deref(), Some("test"));
    assert_eq!(provider.is_active, Some(true));

    let err = service
        .create_auth_provider(vec![CreateAuthProviderInput::new("test", "other name")])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthModuleError::Duplicate { .. }));
    let unchanged = service.retrieve_auth_provider(Some("test"), &all()).await.unwrap();
    assert_eq!(unchanged.name.as_deref(), Some("test provider"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_create_has_one_winner() {
    let (service, _dir) = create_temp_module(StrategyRegistry::default(), test_auth_settings())
        .await
        .expect("create file-backed module");

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_auth_provider(vec![CreateAuthProviderInput::new("github", "GitHub")])
                    .await
            })
        })
        .collect();
    let mut results = Vec::new();
    for attempt in attempts {
        results.push(attempt.await.expect("create task"));
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).expect("one failed create");
    assert!(
        matches!(loser, AuthModuleError::Duplicate { .. }),
        "unexpected error: {loser}"
    );
    assert_eq!(loser.to_string(), "AuthProvider with provider: github already exists");

    let (_, count) = service
        .list_and_count_auth_providers(&ProviderFilter::providers(["github"]), &all())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn selected_null_metadata_is_present() {
    let service = setup_service().await;
    let selected = service
        .retrieve_auth_provider(
            Some("manual"),
            &ProviderFindConfig::select([ProviderField::Provider, ProviderField::Metadata]),
        )
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(selected).unwrap(),
        json!({ "provider": "manual", "metadata": null })
    );
}
