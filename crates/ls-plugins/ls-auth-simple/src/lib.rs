//! # ls-auth-simple
//!
//! In-process implementation of `SessionProvider`.
//! Accounts are email + Argon2 password hash, read and written through an
//! `AccountRepo`; identities are random UUIDs. Session changes are broadcast
//! through a watch channel.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ls_core::models::{Account, Identity, Session};
use ls_core::traits::{AccountRepo, SessionProvider, SessionSubscription};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Accounts held only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryAccounts {
    /// Keyed by lowercased email
    accounts: DashMap<String, Account>,
}

#[async_trait]
impl AccountRepo for MemoryAccounts {
    async fn find_account(&self, email: &str) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.get(email).map(|account| account.clone()))
    }

    async fn create_account(&self, account: Account) -> anyhow::Result<()> {
        match self.accounts.entry(account.email.clone()) {
            Entry::Occupied(_) => bail!("account {} already exists", account.email),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }
}

pub struct SimpleSessionProvider {
    accounts: Arc<dyn AccountRepo>,
    session: watch::Sender<Option<Session>>,
}

impl SimpleSessionProvider {
    pub fn new(accounts: Arc<dyn AccountRepo>) -> Self {
        let (session, _rx) = watch::channel(None);
        Self { accounts, session }
    }

    /// Provider whose accounts vanish with the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAccounts::default()))
    }

    /// Registers an account and signs it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        let email = normalize_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            bail!("password should be at least {MIN_PASSWORD_LEN} characters");
        }
        if self.accounts.find_account(&email).await?.is_some() {
            bail!("user already registered");
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash password: {e}"))?
            .to_string();

        let identity = Identity::new(Uuid::new_v4().to_string());
        self.accounts
            .create_account(Account {
                email: email.clone(),
                identity: identity.clone(),
                password_hash,
            })
            .await
            .context("user already registered")?;

        info!(%identity, "account created");
        Ok(self.start_session(identity, email))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        let email = normalize_email(email)?;
        let account = self
            .accounts
            .find_account(&email)
            .await?
            .ok_or_else(|| anyhow!("invalid login credentials"))?;
        if !verify_password(password, &account.password_hash) {
            bail!("invalid login credentials");
        }
        Ok(self.start_session(account.identity, email))
    }

    fn start_session(&self, identity: Identity, email: String) -> Session {
        let session = Session {
            identity,
            email: Some(email),
        };
        self.session.send_replace(Some(session.clone()));
        info!(identity = %session.identity, "signed in");
        session
    }
}

fn normalize_email(email: &str) -> anyhow::Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => bail!("invalid email address"),
    }
}

/// Verifies a password against a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[async_trait]
impl SessionProvider for SimpleSessionProvider {
    async fn current_session(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        if let Some(previous) = self.session.send_replace(None) {
            info!(identity = %previous.identity, "signed out");
        }
        Ok(())
    }
}
