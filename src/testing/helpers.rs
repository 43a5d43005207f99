//! # 测试辅助函数
//!
//! 内存数据库、迁移和完整模块的快速构建

use std::sync::{Arc, Once};

use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use crate::auth::StrategyRegistry;
use crate::catalog::AuthProviderService;
use crate::config::{AuthSettings, DatabaseConfig, SeedProvider};
use crate::database::{init_database, run_migrations};
use crate::error::Result;
use crate::service::AuthModuleService;

static INIT: Once = Once::new();

/// 初始化测试环境（日志只安装一次）
pub fn init_test_env() {
    INIT.call_once(|| crate::logging::init_logging(Some("debug")));
}

/// 创建已迁移的内存数据库连接
pub async fn create_test_db() -> Result<DatabaseConnection> {
    init_test_env();
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connect_timeout: 5,
    };
    let db = init_database(&config).await?;
    run_migrations(&db).await?;
    Ok(db)
}

/// 创建基于临时文件的数据库，返回的 `TempDir` 需要保持存活
pub async fn create_temp_db() -> Result<(DatabaseConnection, TempDir)> {
    init_test_env();
    let temp_dir = tempfile::tempdir()?;
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", temp_dir.path().join("test.db").display()),
        max_connections: 4,
        connect_timeout: 5,
    };
    let db = init_database(&config).await?;
    run_migrations(&db).await?;
    Ok((db, temp_dir))
}

/// 向目录写入提供商，返回新插入的数量
pub async fn seed_catalog(db: &Arc<DatabaseConnection>, seeds: &[SeedProvider]) -> Result<usize> {
    AuthProviderService::new(db.clone(), AuthSettings::default().on_provider_delete)
        .ensure_seed_providers(seeds)
        .await
}

/// 构建写入了种子提供商的完整模块
pub async fn create_test_module(
    registry: StrategyRegistry,
    settings: AuthSettings,
) -> Result<AuthModuleService> {
    let db = Arc::new(create_test_db().await?);
    module_over(db, registry, settings).await
}

/// 与 [`create_test_module`] 相同，但使用多连接的临时文件数据库，用于并发场景
pub async fn create_temp_module(
    registry: StrategyRegistry,
    settings: AuthSettings,
) -> Result<(AuthModuleService, TempDir)> {
    let (db, temp_dir) = create_temp_db().await?;
    let service = module_over(Arc::new(db), registry, settings).await?;
    Ok((service, temp_dir))
}

async fn module_over(
    db: Arc<DatabaseConnection>,
    registry: StrategyRegistry,
    settings: AuthSettings,
) -> Result<AuthModuleService> {
    let service = AuthModuleService::new(db, registry, &settings);
    service.seed_providers(&settings.providers).await?;
    Ok(service)
}
