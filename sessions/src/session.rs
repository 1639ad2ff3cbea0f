use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use wicket_store::{Expiring, ExpiringStore};
use wicket_types::Timestamp;

use crate::SessionError;

/// How long a session lives. Also the hard cap for requested lifetimes,
/// applied fresh from "now" at every start and renewal — a renewal never
/// stretches a session further than one full lifetime ahead.
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// One user's login session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user: Uuid,
    pub expires_at: Timestamp,
}

impl Expiring for Session {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Uuid {
        self.user
    }
    fn expires_at(&self) -> Timestamp {
        self.expires_at
    }
    fn set_expires_at(&mut self, at: Timestamp) {
        self.expires_at = at;
    }
}

/// Session repository: the expiring store specialized to sessions, plus
/// the lifetime policy. A user holds at most one session — logging in
/// again ends the previous one.
#[derive(Clone)]
pub struct Sessions {
    store: ExpiringStore<Session>,
}

impl Sessions {
    /// The `shutdown` receiver cancels the store's reaper; it comes from
    /// the process-wide shutdown controller.
    pub fn new(shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            store: ExpiringStore::new(shutdown),
        }
    }

    /// Start a session with the default lifetime.
    pub async fn start(&self, user: Uuid) -> Session {
        self.issue(user, SESSION_TTL).await
    }

    /// Start a session with a custom lifetime, capped at [`SESSION_TTL`].
    pub async fn start_with_ttl(&self, user: Uuid, ttl: Duration) -> Result<Session, SessionError> {
        Ok(self.issue(user, check_ttl(ttl)?).await)
    }

    /// Fetch a live session. A session at or past its expiry is reported
    /// missing even when the read beats the reaper to it.
    pub async fn get(&self, id: Uuid) -> Result<Session, SessionError> {
        let session = self.store.get(id).await?;
        if session.expires_at.is_expired_at(Timestamp::now()) {
            return Err(SessionError::NotFound);
        }
        Ok(session)
    }

    /// The session a user currently holds, if any.
    pub async fn get_for_user(&self, user: Uuid) -> Result<Session, SessionError> {
        Ok(self.store.get_by_owner(user).await?)
    }

    /// Push a session's expiry a fresh default lifetime from now.
    pub async fn renew(&self, id: Uuid) -> Result<Timestamp, SessionError> {
        self.renew_with_ttl(id, SESSION_TTL).await
    }

    /// Renew with a custom lifetime, capped at [`SESSION_TTL`].
    pub async fn renew_with_ttl(&self, id: Uuid, ttl: Duration) -> Result<Timestamp, SessionError> {
        let expires_at = Timestamp::now() + check_ttl(ttl)?;
        self.store.update(id, expires_at).await?;
        Ok(expires_at)
    }

    /// End a session. Ending an unknown session is a no-op.
    pub async fn end(&self, id: Uuid) {
        self.store.delete(id).await;
    }

    async fn issue(&self, user: Uuid, ttl: Duration) -> Session {
        let session = Session {
            id: Uuid::now_v7(),
            user,
            expires_at: Timestamp::now() + ttl,
        };
        self.store.create(session.clone()).await;
        session
    }
}

fn check_ttl(ttl: Duration) -> Result<Duration, SessionError> {
    if ttl > SESSION_TTL {
        return Err(SessionError::TtlTooLong { max: SESSION_TTL });
    }
    Ok(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> (Sessions, broadcast::Sender<()>) {
        let (tx, rx) = broadcast::channel(1);
        (Sessions::new(rx), tx)
    }

    #[tokio::test]
    async fn start_and_get_round_trip() {
        let (sessions, _guard) = sessions();
        let user = Uuid::now_v7();

        let session = sessions.start(user).await;
        let read = sessions.get(session.id).await.unwrap();
        assert_eq!(read, session);
        assert_eq!(sessions.get_for_user(user).await.unwrap().id, session.id);
    }

    #[tokio::test]
    async fn lifetime_above_cap_is_rejected() {
        let (sessions, _guard) = sessions();
        let result = sessions
            .start_with_ttl(Uuid::now_v7(), SESSION_TTL + Duration::from_secs(1))
            .await;
        assert_eq!(result, Err(SessionError::TtlTooLong { max: SESSION_TTL }));
    }

    #[tokio::test]
    async fn renew_pushes_expiry_forward() {
        let (sessions, _guard) = sessions();
        let session = sessions
            .start_with_ttl(Uuid::now_v7(), Duration::from_secs(1))
            .await
            .unwrap();

        let renewed = sessions.renew(session.id).await.unwrap();
        assert!(renewed > session.expires_at);
        assert_eq!(sessions.get(session.id).await.unwrap().expires_at, renewed);
    }

    #[tokio::test]
    async fn renew_unknown_session_is_not_found() {
        let (sessions, _guard) = sessions();
        assert_eq!(
            sessions.renew(Uuid::now_v7()).await,
            Err(SessionError::NotFound)
        );
    }

    #[tokio::test]
    async fn second_login_replaces_first_session() {
        let (sessions, _guard) = sessions();
        let user = Uuid::now_v7();

        let first = sessions.start(user).await;
        let second = sessions.start(user).await;

        assert_eq!(sessions.get(first.id).await, Err(SessionError::NotFound));
        assert_eq!(sessions.get_for_user(user).await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn expired_session_is_refused() {
        let (sessions, _guard) = sessions();
        let session = sessions
            .start_with_ttl(Uuid::now_v7(), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sessions.get(session.id).await, Err(SessionError::NotFound));
    }

    #[tokio::test]
    async fn end_is_idempotent() {
        let (sessions, _guard) = sessions();
        let session = sessions.start(Uuid::now_v7()).await;
        sessions.end(session.id).await;
        sessions.end(session.id).await;
        assert_eq!(sessions.get(session.id).await, Err(SessionError::NotFound));
    }
}
