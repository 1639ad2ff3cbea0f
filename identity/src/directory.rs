//! Role-authorized flows over the user directory.
//!
//! Every method takes the calling [`Actor`] and decides whether the
//! operation is allowed before touching a store: listing and creating
//! users is chief business, users may read and edit themselves, role
//! changes and promotion passes are chief-only, and redemption belongs to
//! the pass's subject.

use uuid::Uuid;

use wicket_promotions::{Promotion, Promotions};
use wicket_sessions::{Session, Sessions};
use wicket_store::Page;
use wicket_types::{Actor, Role, Timestamp};

use crate::store::{UserStore, UserUpdate};
use crate::user::{self, User};
use crate::IdentityError;

/// Unvalidated field changes as they arrive from a caller; `None` leaves a
/// field untouched.
#[derive(Clone, Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// The service layer: owns the user store and both expiring repositories.
#[derive(Clone)]
pub struct Directory {
    users: UserStore,
    sessions: Sessions,
    promotions: Promotions,
}

impl Directory {
    pub fn new(users: UserStore, sessions: Sessions, promotions: Promotions) -> Self {
        Self {
            users,
            sessions,
            promotions,
        }
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub async fn list(
        &self,
        actor: &Actor,
        offset: usize,
        limit: usize,
    ) -> Result<Page<User>, IdentityError> {
        actor.require(Role::Chief)?;
        Ok(self.users.list(offset, limit).await)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<User, IdentityError> {
        actor.require_self_or(id, Role::Chief)?;
        self.users.get(id).await
    }

    pub async fn get_by_badge(&self, actor: &Actor, badge: u32) -> Result<User, IdentityError> {
        let user = self.users.get_by_badge(badge).await?;
        actor.require_self_or(user.id, Role::Chief)?;
        Ok(user)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        badge: u32,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, IdentityError> {
        actor.require(Role::Chief)?;

        let user = User::new(badge, name, email, password, role)?;
        self.users.create(user.clone()).await?;
        tracing::info!(badge, role = %user.role, "user created");
        Ok(user)
    }

    /// Users may change their own name, email and password; role changes
    /// are chief-only.
    pub async fn patch(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<User, IdentityError> {
        actor.require_self_or(id, Role::Chief)?;
        if patch.role.is_some() {
            actor.require(Role::Chief)?;
        }

        let update = UserUpdate {
            name: patch.name.as_deref().map(user::validate_name).transpose()?,
            email: patch
                .email
                .as_deref()
                .map(user::validate_email)
                .transpose()?,
            password_hash: patch
                .password
                .as_deref()
                .map(user::hash_password)
                .transpose()?,
            role: patch.role,
        };
        self.users.update(id, update).await?;
        self.users.get(id).await
    }

    /// Remove a user; their session and any pending promotion pass go with
    /// them.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), IdentityError> {
        actor.require_self_or(id, Role::Chief)?;
        self.users.delete(id).await?;

        if let Ok(session) = self.sessions.get_for_user(id).await {
            self.sessions.end(session.id).await;
        }
        if let Ok(pass) = self.promotions.get_for_user(id).await {
            self.promotions.revoke(pass.id).await;
        }
        Ok(())
    }

    // ── Authentication ───────────────────────────────────────────────────

    /// Check a badge/password pair and start a session for the user.
    pub async fn authenticate(
        &self,
        badge: u32,
        password: &str,
    ) -> Result<(User, Session), IdentityError> {
        let user = self.users.get_by_badge(badge).await?;
        user.verify_password(password)?;

        let session = self.sessions.start(user.id).await;
        tracing::debug!(badge, "authenticated");
        Ok((user, session))
    }

    /// Resolve the actor behind a session id. Anything short of a live
    /// session pointing at a live user degrades to [`Actor::Anonymous`].
    pub async fn actor(&self, session_id: Uuid) -> Actor {
        let Ok(session) = self.sessions.get(session_id).await else {
            return Actor::Anonymous;
        };
        match self.users.get(session.user).await {
            Ok(user) => Actor::User {
                id: user.id,
                role: user.role,
            },
            Err(_) => Actor::Anonymous,
        }
    }

    /// Renew the given session for a fresh default lifetime.
    pub async fn refresh(&self, session_id: Uuid) -> Result<Timestamp, IdentityError> {
        Ok(self.sessions.renew(session_id).await?)
    }

    /// End the given session. Unknown sessions are a no-op.
    pub async fn logout(&self, session_id: Uuid) {
        self.sessions.end(session_id).await;
    }

    // ── Promotion passes ─────────────────────────────────────────────────

    pub async fn grant_promotion(
        &self,
        actor: &Actor,
        user_id: Uuid,
    ) -> Result<Promotion, IdentityError> {
        actor.require(Role::Chief)?;

        let user = self.users.get(user_id).await?;
        if user.role.promoted().is_none() {
            return Err(IdentityError::AlreadyTopRole);
        }
        let pass = self.promotions.grant(user_id).await;
        tracing::info!(user = %user_id, pass = %pass.id, "promotion pass granted");
        Ok(pass)
    }

    pub async fn list_promotions(
        &self,
        actor: &Actor,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Promotion>, IdentityError> {
        actor.require(Role::Chief)?;
        Ok(self.promotions.list(offset, limit).await)
    }

    pub async fn get_promotion(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Promotion, IdentityError> {
        let pass = self.promotions.get(id).await?;
        actor.require_self_or(pass.user, Role::Chief)?;
        Ok(pass)
    }

    pub async fn revoke_promotion(&self, actor: &Actor, id: Uuid) -> Result<(), IdentityError> {
        actor.require(Role::Chief)?;
        self.promotions.revoke(id).await;
        Ok(())
    }

    /// Redeem a pass: only its subject may redeem it, it is consumed
    /// exactly once (even when the promotion cannot be applied), and the
    /// subject's role moves one rank up.
    pub async fn redeem_promotion(&self, actor: &Actor, id: Uuid) -> Result<User, IdentityError> {
        actor.require(Role::User)?;

        let pass = self.promotions.get(id).await?;
        if !actor.is(pass.user) {
            return Err(IdentityError::PassNotYours);
        }

        let pass = self.promotions.take(id).await?;

        let user = self.users.get(pass.user).await?;
        let role = user.role.promoted().ok_or(IdentityError::AlreadyTopRole)?;
        self.users
            .update(
                user.id,
                UserUpdate {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(user = %user.id, %role, "promotion redeemed");
        self.users.get(user.id).await
    }
}
