use super::{
    credentials::Credentials,
    error::AuthError,
    password::{generate_salt, hash_password, verify_password},
    policy::Policy,
    token::{Claims, TokenKeys},
};
use crate::store::{UserRecord, UserStore};
use anyhow::anyhow;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

/// Immutable context shared by every request: policy, keypair and user store.
///
/// KDF work runs on the blocking pool behind a semaphore sized to the number
/// of CPUs, so a burst of requests queues rather than multiplying hashing load.
#[derive(Clone)]
pub struct Authenticator {
    policy: Policy,
    keys: Arc<TokenKeys>,
    store: Arc<dyn UserStore>,
    hashing_permits: Arc<Semaphore>,
}

impl Authenticator {
    #[must_use]
    pub fn new(policy: Policy, keys: Arc<TokenKeys>, store: Arc<dyn UserStore>) -> Self {
        let permits = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            policy,
            keys,
            store,
            hashing_permits: Arc::new(Semaphore::new(permits)),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    #[must_use]
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Register a new user and return a token for it.
    ///
    /// validate → existence check → salt/hash → conditional insert → issue.
    ///
    /// # Errors
    /// `Validation`, `UserAlreadyExists` (including when a concurrent
    /// registration wins the insert), or `Internal`.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn register(&self, credentials: &Credentials) -> Result<String, AuthError> {
        credentials.validate(&self.policy)?;

        if self.store.get_user(credentials.username()).await?.is_some() {
            debug!("username already registered");
            return Err(AuthError::UserAlreadyExists);
        }

        let salt = generate_salt();
        let hashed_password = self
            .derive(credentials.password().clone(), salt.clone())
            .await?;

        let record = UserRecord::new(credentials.username(), salt, hashed_password);
        // Conflict here means another request inserted the same username first.
        self.store.create_user(&record).await?;

        info!("user registered");

        self.issue(credentials.username())
    }

    /// Check a username/password pair and return a token for it.
    ///
    /// validate → fetch → rehash with the stored salt and compare → issue.
    ///
    /// # Errors
    /// `Validation`, `NotFound`, `WrongCredential`, or `Internal`.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<String, AuthError> {
        credentials.validate(&self.policy)?;

        let Some(record) = self.store.get_user(credentials.username()).await? else {
            debug!("unknown username");
            return Err(AuthError::NotFound);
        };

        if !self
            .matches(credentials.password().clone(), record)
            .await?
        {
            debug!("password mismatch");
            return Err(AuthError::WrongCredential);
        }

        self.issue(credentials.username())
    }

    /// Verify a token presented by a client against the service's public key.
    ///
    /// # Errors
    /// `TokenMalformed` or `TokenSignatureMismatch`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.keys.verify(token)?)
    }

    fn issue(&self, username: &str) -> Result<String, AuthError> {
        Ok(self.keys.issue(&Claims::new(username))?)
    }

    async fn derive(&self, password: SecretString, salt: String) -> Result<String, AuthError> {
        let iterations = self.policy.kdf_iterations();
        self.run_kdf(move || hash_password(password.expose_secret(), &salt, iterations))
            .await
    }

    async fn matches(&self, password: SecretString, record: UserRecord) -> Result<bool, AuthError> {
        let iterations = self.policy.kdf_iterations();
        self.run_kdf(move || {
            verify_password(
                password.expose_secret(),
                &record.salt,
                &record.hashed_password,
                iterations,
            )
        })
        .await
    }

    async fn run_kdf<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.hashing_permits)
            .acquire_owned()
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;

        // The permit travels with the job: a dropped caller must not free it
        // while the blocking pool is still hashing.
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| AuthError::Internal(anyhow!("password hashing task failed: {e}")))
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("policy", &self.policy)
            .field("keys", &self.keys)
            .field("store", &self.store.backend())
            .finish_non_exhaustive()
    }
}
