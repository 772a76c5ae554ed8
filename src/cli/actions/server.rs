use crate::{
    api::{self, AuthState},
    auth::{Authenticator, Policy, TokenKeys},
    store::{MemoryStore, PgStore, UserStore},
};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub addr: SocketAddr,
    pub dsn: Option<String>,
    pub db_password: Option<SecretString>,
    pub private_key: PathBuf,
    pub kdf_iterations: u32,
    pub max_username_length: usize,
    pub max_password_length: usize,
    pub cookie_max_age_seconds: u64,
}

/// Load the signing key, open the user store and serve until shutdown.
///
/// # Errors
/// Returns an error if the key cannot be read or parsed, the database is
/// unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let key_bytes = tokio::fs::read(&args.private_key)
        .await
        .with_context(|| format!("Failed to read private key: {}", args.private_key.display()))?;
    let keys = TokenKeys::from_private_key_pem_or_der(&key_bytes)
        .with_context(|| format!("Invalid private key: {}", args.private_key.display()))?;

    let store: Arc<dyn UserStore> = match &args.dsn {
        Some(dsn) => {
            let dsn = dsn_with_password(dsn, args.db_password.as_ref())?;
            Arc::new(PgStore::connect(dsn.expose_secret()).await?)
        }
        None => {
            warn!("No --dsn given, users are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    info!("User store: {}", store.backend());

    let policy = Policy::new()
        .with_kdf_iterations(args.kdf_iterations)
        .with_max_username_length(args.max_username_length)
        .with_max_password_length(args.max_password_length);

    let authenticator = Authenticator::new(policy, Arc::new(keys), store);
    let state = AuthState::new(authenticator).with_cookie_max_age_seconds(args.cookie_max_age_seconds);

    api::new(args.addr, Arc::new(state)).await
}

/// Put `password` into the DSN, replacing any password already there.
fn dsn_with_password(dsn: &str, password: Option<&SecretString>) -> Result<SecretString> {
    let Some(password) = password else {
        return Ok(SecretString::from(dsn.to_string()));
    };

    let mut url = Url::parse(dsn).context("Invalid DSN")?;
    url.set_password(Some(password.expose_secret()))
        .map_err(|()| anyhow!("Error setting password"))?;
    Ok(SecretString::from(url.to_string()))
}
