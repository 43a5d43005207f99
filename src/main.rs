//! # Auth Module 管理命令行
//!
//! 迁移、提供商管理和认证调试

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use auth_module::{
    AuthModuleService, Result,
    auth::{AuthenticationOutcome, AuthenticationRequest, StrategyDependencies, StrategyRegistry},
    catalog::{CreateAuthProviderInput, ProviderFilter, ProviderFindConfig, UpdateAuthProviderInput},
    config::{self, AppConfig},
    database,
    error::AuthModuleError,
    identity::ActorRef,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
};

/// Auth module admin CLI
#[derive(Parser)]
#[command(name = "auth-module", version, about, long_about = None)]
struct Cli {
    /// 配置文件路径，默认按 RUST_ENV 读取 config/config.{env}.toml
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 日志级别
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and seed providers
    Migrate,

    /// Manage auth providers
    #[command(subcommand)]
    Providers(ProviderCommands),

    /// Run one authentication attempt against a provider
    Authenticate {
        provider: String,
        /// Credential payload as JSON
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long, requires = "actor_id")]
        actor_type: Option<String>,
        #[arg(long, requires = "actor_type")]
        actor_id: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ProviderCommands {
    /// List providers
    List {
        /// Only active (true) or inactive (false) providers
        #[arg(long)]
        active: Option<bool>,
        #[arg(long, value_delimiter = ',')]
        provider: Vec<String>,
    },
    /// Create a provider
    Create {
        provider: String,
        name: String,
        #[arg(long)]
        inactive: bool,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Update a provider
    Update {
        provider: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete providers
    Delete {
        #[arg(required = true)]
        providers: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "command_failed",
            &format!("命令执行失败: {e}")
        );
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };

    match cli.command {
        Commands::Migrate => migrate(&config).await,
        Commands::Providers(command) => {
            let service = AuthModuleService::bootstrap(&config, StrategyRegistry::default()).await?;
            providers(&service, command).await
        }
        Commands::Authenticate {
            provider,
            payload,
            actor_type,
            actor_id,
            timeout_ms,
        } => {
            let deps = StrategyDependencies::from_settings(&config.auth)?;
            let registry = StrategyRegistry::from_bindings(&config.auth.bindings, &deps);
            let service = AuthModuleService::bootstrap(&config, registry).await?;

            let mut request = AuthenticationRequest::new(parse_json(&payload)?);
            if let (Some(actor_type), Some(actor_id)) = (actor_type, actor_id) {
                request = request.with_actor(ActorRef::new(actor_type, actor_id));
            }
            if let Some(timeout_ms) = timeout_ms {
                request = request.with_timeout(Duration::from_millis(timeout_ms));
            }

            let outcome = service.authenticate(&provider, request).await?;
            print_json(&outcome_to_json(&outcome))
        }
    }
}

async fn migrate(config: &AppConfig) -> Result<()> {
    let db = database::init_database(&config.database).await?;
    let pending = database::check_database_status(&db).await?;
    database::run_migrations(&db).await?;

    let service = AuthModuleService::new(
        std::sync::Arc::new(db),
        StrategyRegistry::default(),
        &config.auth,
    );
    let seeded = service.seed_providers(&config.auth.providers).await?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "migrate_done",
        &format!("迁移完成，本次应用迁移 {pending} 个，新写入提供商 {seeded} 个")
    );
    Ok(())
}

async fn providers(service: &AuthModuleService, command: ProviderCommands) -> Result<()> {
    match command {
        ProviderCommands::List { active, provider } => {
            let filter = ProviderFilter {
                provider: (!provider.is_empty()).then_some(provider),
                is_active: active,
            };
            let (records, count) = service
                .list_and_count_auth_providers(&filter, &ProviderFindConfig::default())
                .await?;
            print_json(&json!({ "count": count, "providers": records }))
        }
        ProviderCommands::Create {
            provider,
            name,
            inactive,
            metadata,
        } => {
            let mut input = CreateAuthProviderInput::new(provider, name).active(!inactive);
            if let Some(metadata) = metadata {
                input = input.metadata(parse_json(&metadata)?);
            }
            let created = service.create_auth_provider(vec![input]).await?;
            print_json(&serde_json::to_value(created)?)
        }
        ProviderCommands::Update {
            provider,
            name,
            active,
            metadata,
        } => {
            let input = UpdateAuthProviderInput {
                provider,
                name,
                is_active: active,
                metadata: metadata.as_deref().map(parse_json).transpose()?,
            };
            let updated = service.update_auth_provider(vec![input]).await?;
            print_json(&serde_json::to_value(updated)?)
        }
        ProviderCommands::Delete { providers } => {
            service.delete_auth_providers(&providers).await?;
            print_json(&json!({ "deleted": providers }))
        }
    }
}

fn outcome_to_json(outcome: &AuthenticationOutcome) -> Value {
    match outcome {
        AuthenticationOutcome::Authenticated { identity, is_new } => {
            json!({ "status": "authenticated", "identity": identity, "is_new": is_new })
        }
        AuthenticationOutcome::Rejected { reason } => {
            json!({ "status": "rejected", "reason": reason })
        }
        AuthenticationOutcome::Deferred { continuation } => {
            json!({ "status": "deferred", "continuation": continuation })
        }
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| AuthModuleError::validation(format!("invalid JSON argument: {e}")))
}

#[allow(clippy::print_stdout)]
fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
