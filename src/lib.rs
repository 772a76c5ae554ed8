//! # Passgate
//!
//! `passgate` is a small authentication service. Clients register a
//! username/password pair and later log in to obtain a signed session token
//! asserting their identity.
//!
//! ## Credentials
//!
//! - **Usernames** are `[a-z0-9-]`, 1 to 16 characters, checked over the whole value.
//! - **Passwords** are 1 to 64 characters of any content. They are never stored or
//!   logged; only a per-user salt and a PBKDF2-HMAC-SHA256 derived key are persisted.
//!
//! ## Tokens
//!
//! Tokens are compact JWTs signed with RS512. The only claim is `username`, and no
//! expiry is embedded: verification is stateless and a token stays valid for as
//! long as the signing key does.
//!
//! ## Storage
//!
//! The user store is a trait with two backends, Postgres (`sqlx`) and in-memory.
//! Both make registration race-safe: of two concurrent registrations for the same
//! username exactly one succeeds.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
