//! # Entity 模块
//!
//! 认证模块的 Sea-ORM 实体定义

pub mod auth_identities;
pub mod auth_providers;

pub use auth_identities::Entity as AuthIdentities;
pub use auth_providers::Entity as AuthProviders;

#[cfg(test)]
mod tests;
