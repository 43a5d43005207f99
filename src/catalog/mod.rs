//! # 认证提供商目录
//!
//! 提供商记录的增删改查，批量写入在单个事务内完成

pub mod service;
pub mod types;

pub use service::AuthProviderService;
pub use types::{
    AuthProvider, AuthProviderDto, CreateAuthProviderInput, ProviderField, ProviderFilter,
    ProviderFindConfig, UpdateAuthProviderInput,
};
