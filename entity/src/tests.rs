//! # 实体定义测试
//!
//! 测试认证实体定义的正确性

#[cfg(test)]
mod tests {
    use crate::{auth_identities, auth_providers};
    use sea_orm::Set;

    #[tokio::test]
    async fn test_auth_provider_creation() {
        let provider = auth_providers::ActiveModel {
            provider: Set("manual".to_string()),
            name: Set("Email & password".to_string()),
            is_active: Set(true),
            metadata: Set(Some(r#"{"cost":4}"#.to_string())),
            ..Default::default()
        };

        assert_eq!(provider.provider.as_ref(), "manual");
        assert_eq!(provider.name.as_ref(), "Email & password");
        assert_eq!(provider.is_active.as_ref(), &true);
        assert!(provider.id.is_not_set());
    }

    #[tokio::test]
    async fn test_auth_identity_creation() {
        let identity = auth_identities::ActiveModel {
            id: Set("7f1c0b9e-0000-4000-8000-000000000001".to_string()),
            provider: Set("manual".to_string()),
            entity_id: Set("jane@example.com".to_string()),
            actor_type: Set("customer".to_string()),
            actor_id: Set("cus_01".to_string()),
            metadata: Set(None),
            ..Default::default()
        };

        assert_eq!(identity.provider.as_ref(), "manual");
        assert_eq!(identity.entity_id.as_ref(), "jane@example.com");
        assert_eq!(identity.actor_id.as_ref(), "cus_01");
        assert!(identity.created_at.is_not_set());
    }
}
