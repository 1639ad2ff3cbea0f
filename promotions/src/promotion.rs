use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use wicket_store::{Expiring, ExpiringStore, Page};
use wicket_types::Timestamp;

use crate::PromotionError;

/// Default lifetime of a promotion pass.
pub const PROMOTION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Hard cap on a requested lifetime, applied fresh from "now" at every
/// grant and extension.
pub const PROMOTION_MAX_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// A pending promotion for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub user: Uuid,
    pub expires_at: Timestamp,
}

impl Expiring for Promotion {
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

/// Promotion pass repository: the expiring store specialized to passes,
/// plus the lifetime policy. A user holds at most one pending pass —
/// granting again replaces the previous one.
#[derive(Clone)]
pub struct Promotions {
    store: ExpiringStore<Promotion>,
}

impl Promotions {
    /// The `shutdown` receiver cancels the store's reaper; it comes from
    /// the process-wide shutdown controller.
    pub fn new(shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            store: ExpiringStore::new(shutdown),
        }
    }

    /// Grant a pass with the default lifetime.
    pub async fn grant(&self, user: Uuid) -> Promotion {
        self.issue(user, PROMOTION_TTL).await
    }

    /// Grant a pass with a custom lifetime, capped at [`PROMOTION_MAX_TTL`].
    pub async fn grant_with_ttl(
        &self,
        user: Uuid,
        ttl: Duration,
    ) -> Result<Promotion, PromotionError> {
        Ok(self.issue(user, check_ttl(ttl)?).await)
    }

    /// A window of the pending passes plus the full count.
    pub async fn list(&self, offset: usize, limit: usize) -> Page<Promotion> {
        self.store.list(offset, limit).await
    }

    /// Fetch a live pass. A pass at or past its expiry is reported missing
    /// even when the read beats the reaper to it.
    pub async fn get(&self, id: Uuid) -> Result<Promotion, PromotionError> {
        let pass = self.store.get(id).await?;
        if pass.expires_at.is_expired_at(Timestamp::now()) {
            return Err(PromotionError::NotFound);
        }
        Ok(pass)
    }

    /// The pass pending for a user, if any.
    pub async fn get_for_user(&self, user: Uuid) -> Result<Promotion, PromotionError> {
        Ok(self.store.get_by_owner(user).await?)
    }

    /// Push a pass's expiry a fresh default lifetime from now.
    pub async fn extend(&self, id: Uuid) -> Result<Timestamp, PromotionError> {
        self.extend_with_ttl(id, PROMOTION_TTL).await
    }

    /// Extend with a custom lifetime, capped at [`PROMOTION_MAX_TTL`].
    pub async fn extend_with_ttl(
        &self,
        id: Uuid,
        ttl: Duration,
    ) -> Result<Timestamp, PromotionError> {
        let expires_at = Timestamp::now() + check_ttl(ttl)?;
        self.store.update(id, expires_at).await?;
        Ok(expires_at)
    }

    /// Withdraw a pass. Revoking an unknown pass is a no-op.
    pub async fn revoke(&self, id: Uuid) {
        self.store.delete(id).await;
    }

    /// Consume a pass for redemption: fetch and remove it in one step.
    /// Strictly one-time — a second take reports the pass missing.
    pub async fn take(&self, id: Uuid) -> Result<Promotion, PromotionError> {
        Ok(self.store.take(id).await?)
    }

    async fn issue(&self, user: Uuid, ttl: Duration) -> Promotion {
        let pass = Promotion {
            id: Uuid::now_v7(),
            user,
            expires_at: Timestamp::now() + ttl,
        };
        self.store.create(pass.clone()).await;
        pass
    }
}

fn check_ttl(ttl: Duration) -> Result<Duration, PromotionError> {
    if ttl > PROMOTION_MAX_TTL {
        return Err(PromotionError::TtlTooLong {
            max: PROMOTION_MAX_TTL,
        });
    }
    Ok(ttl)
}
