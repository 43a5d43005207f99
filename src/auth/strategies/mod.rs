//! # 认证策略模块
//!
//! 策略接口与内置的几种实现

pub mod bearer_token;
pub mod emailpass;
pub mod oauth_redirect;
pub mod traits;

pub use traits::AuthStrategy;

pub use bearer_token::BearerTokenStrategy;
pub use emailpass::{CredentialStore, EmailPassStrategy, InMemoryCredentialStore, StoredCredential};
pub use oauth_redirect::{CodeExchange, ExchangedIdentity, OAuthRedirectStrategy};
