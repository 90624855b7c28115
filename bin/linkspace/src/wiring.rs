//! Builds the port implementations named by the configuration.

use std::sync::Arc;
#[cfg(feature = "backend-rest")]
use std::time::Duration;

use anyhow::{bail, Context};
use ls_config::{BackendKind, Settings};
use ls_core::{Profile, ProfileRepo, Session};
use ls_services::Backend;
use tracing::info;

#[cfg(feature = "backend-local")]
use ls_auth_simple::SimpleSessionProvider;
#[cfg(feature = "backend-rest")]
use ls_backend_rest::RestBackend;
#[cfg(feature = "backend-rest")]
use secrecy::{ExposeSecret, SecretString};
#[cfg(feature = "backend-local")]
use ls_db_sqlite::SqliteRepo;
#[cfg(feature = "backend-local")]
use ls_storage_local::LocalMediaStore;

/// Account operations, which sit outside the `SessionProvider` port.
pub enum Accounts {
    #[cfg(feature = "backend-local")]
    Local(Arc<SimpleSessionProvider>),
    #[cfg(feature = "backend-rest")]
    Rest(Arc<RestBackend>),
}

pub struct Wiring {
    pub backend: Backend,
    pub accounts: Accounts,
}

pub async fn build(settings: &Settings) -> anyhow::Result<Wiring> {
    match settings.backend.kind {
        BackendKind::Local => local(settings).await,
        BackendKind::Rest => rest(settings),
    }
}

#[cfg(feature = "backend-local")]
async fn local(settings: &Settings) -> anyhow::Result<Wiring> {
    let repo = Arc::new(
        SqliteRepo::new(&settings.database.url)
            .await
            .context("failed to open the database")?,
    );
    let media = Arc::new(LocalMediaStore::new(
        settings.media.root.clone(),
        settings.media.url_prefix.clone(),
    ));
    let auth = Arc::new(SimpleSessionProvider::new(repo.clone()));

    info!(database = %settings.database.url, media = %settings.media.root.display(), "local backend ready");

    Ok(Wiring {
        backend: Backend {
            session: auth.clone(),
            profiles: repo.clone(),
            posts: repo,
            media,
        },
        accounts: Accounts::Local(auth),
    })
}

#[cfg(not(feature = "backend-local"))]
async fn local(_settings: &Settings) -> anyhow::Result<Wiring> {
    bail!("this build does not include the local backend")
}

#[cfg(feature = "backend-rest")]
fn rest(settings: &Settings) -> anyhow::Result<Wiring> {
    let (Some(url), Some(api_key)) = (&settings.backend.url, &settings.backend.api_key) else {
        bail!("backend.url and backend.api_key are required for the rest backend");
    };
    let client = Arc::new(RestBackend::new(
        url,
        SecretString::from(api_key.expose_secret().to_owned()),
        Duration::from_secs(settings.backend.timeout_secs),
    )?);

    Ok(Wiring {
        backend: Backend {
            session: client.clone(),
            profiles: client.clone(),
            posts: client.clone(),
            media: client.clone(),
        },
        accounts: Accounts::Rest(client),
    })
}

#[cfg(not(feature = "backend-rest"))]
fn rest(_settings: &Settings) -> anyhow::Result<Wiring> {
    bail!("this build does not include the rest backend")
}

impl Wiring {
    /// Registers an account and creates its profile. Returns `None` when the
    /// backend wants the address confirmed before signing in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> anyhow::Result<Option<Session>> {
        let session = match &self.accounts {
            #[cfg(feature = "backend-local")]
            Accounts::Local(auth) => Some(auth.sign_up(email, password).await?),
            #[cfg(feature = "backend-rest")]
            Accounts::Rest(client) => client.sign_up(email, password, full_name).await?,
        };

        if let Some(session) = &session {
            create_profile(self.backend.profiles.as_ref(), session, full_name).await?;
        }
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        match &self.accounts {
            #[cfg(feature = "backend-local")]
            Accounts::Local(auth) => auth.sign_in(email, password).await,
            #[cfg(feature = "backend-rest")]
            Accounts::Rest(client) => client.sign_in(email, password).await,
        }
    }
}

async fn create_profile(
    profiles: &dyn ProfileRepo,
    session: &Session,
    full_name: &str,
) -> anyhow::Result<()> {
    profiles
        .create_profile(Profile {
            id: session.identity.clone(),
            full_name: full_name.to_string(),
            avatar_url: None,
        })
        .await
        .context("failed to create profile")
}
