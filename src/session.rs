//! Session Ownership
//!
//! [`SessionManager`] owns the connector and the single live session.
//! Switching accounts closes the current session before the next one opens,
//! so a privileged connection is never left behind.

use crate::engine::{Connector, DbCredential, Session};
use crate::error::{ClosetlyError, ConnectionErrorKind, Result};

/// Owner of the process's one database session
pub struct SessionManager<C: Connector> {
    connector: C,
    active: Option<Active<C::Session>>,
}

struct Active<S> {
    credential: DbCredential,
    session: S,
}

impl<C: Connector> SessionManager<C> {
    /// Open the first session under `credential`
    pub async fn open(connector: C, credential: DbCredential) -> Result<Self> {
        let session = connector.open(&credential).await?;
        tracing::debug!(account = %credential.user, "session opened");
        Ok(Self { connector, active: Some(Active { credential, session }) })
    }

    /// Credential of the live session
    #[must_use]
    pub fn credential(&self) -> Option<&DbCredential> {
        self.active.as_ref().map(|active| &active.credential)
    }

    /// Account name of the live session
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.credential.user.as_str())
    }

    /// Borrow the live session
    pub fn session(&mut self) -> Result<&mut C::Session> {
        self.active.as_mut().map(|active| &mut active.session).ok_or_else(|| {
            ClosetlyError::connection(ConnectionErrorKind::Other, "No open database session")
        })
    }

    /// Connector used to open sessions
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Reopen the session under `credential`
    ///
    /// Does nothing when that account is already active. Otherwise the
    /// current session is closed first; if the new one then fails to open,
    /// no session remains.
    pub async fn switch_to(&mut self, credential: DbCredential) -> Result<()> {
        if let Some(active) = &self.active {
            if active.credential.same_account(&credential) {
                tracing::debug!(account = %credential.user, "session already under requested account");
                return Ok(());
            }
        }

        if let Some(previous) = self.active.take() {
            let from = previous.credential.user.clone();
            if let Err(err) = previous.session.close().await {
                // The old connection is gone either way
                tracing::warn!(account = %from, error = %err, "closing previous session failed");
            }
            tracing::info!(from = %from, to = %credential.user, "switching database account");
        }

        let session = self.connector.open(&credential).await?;
        self.active = Some(Active { credential, session });
        Ok(())
    }

    /// Close the live session, if any
    pub async fn close(mut self) -> Result<()> {
        match self.active.take() {
            Some(active) => {
                tracing::debug!(account = %active.credential.user, "closing session");
                active.session.close().await
            }
            None => Ok(()),
        }
    }
}
