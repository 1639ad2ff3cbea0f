//! Session cookie handling: resolving the caller to an actor, and the
//! `Set-Cookie` values for login, refresh and logout.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

use wicket_sessions::Session;
use wicket_types::{Actor, Timestamp};

use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Pull the session id out of the `Cookie` header, if present and
/// well-formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

/// The caller, resolved from the session cookie. A missing, malformed,
/// expired or orphaned session degrades to [`Actor::Anonymous`] — it is
/// each handler's service call that decides whether anonymous is enough.
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = match session_id(&parts.headers) {
            Some(id) => state.directory.actor(id).await,
            None => Actor::Anonymous,
        };
        Ok(CurrentActor(actor))
    }
}

/// `Set-Cookie` value binding the session to the client.
pub fn session_cookie(session: &Session) -> String {
    cookie_with_max_age(
        &session.id.to_string(),
        session.expires_at.duration_until(Timestamp::now()).as_secs(),
    )
}

/// `Set-Cookie` value for a renewed expiry on the same session.
pub fn refreshed_cookie(id: Uuid, expires_at: Timestamp) -> String {
    cookie_with_max_age(
        &id.to_string(),
        expires_at.duration_until(Timestamp::now()).as_secs(),
    )
}

/// `Set-Cookie` value that drops the session from the client.
pub fn clear_session_cookie() -> String {
    cookie_with_max_age("", 0)
}

fn cookie_with_max_age(value: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let id = Uuid::now_v7();
        let headers = headers(&format!("theme=dark; session={id}; lang=en"));
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn missing_or_malformed_cookie_is_none() {
        assert_eq!(session_id(&HeaderMap::new()), None);
        assert_eq!(session_id(&headers("session=not-a-uuid")), None);
        assert_eq!(session_id(&headers("other=value")), None);
    }
}
