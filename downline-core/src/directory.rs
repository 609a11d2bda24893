//! Identity lifecycle: creation, profile, role, status, deletion
//!
//! Balance never changes here; that is the ledger engine's exclusive domain.
//! Like the ledger, these methods run on the single mutation task so
//! uniqueness checks and index rewrites cannot race.

use crate::{
    hierarchy::Hierarchy,
    metrics::Metrics,
    permission,
    storage::Storage,
    types::{NewUser, ProfileUpdate, Role, User, UserId},
    Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

/// User management engine
pub struct Directory {
    storage: Arc<Storage>,
    hierarchy: Hierarchy,
    metrics: Metrics,
}

impl Directory {
    /// Create a directory over the given store
    pub fn new(storage: Arc<Storage>, hierarchy: Hierarchy, metrics: Metrics) -> Self {
        Self {
            storage,
            hierarchy,
            metrics,
        }
    }

    fn validate_username(username: &str) -> Result<()> {
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(Error::Validation(
                "Username must be non-empty and contain no whitespace".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_email(email: &str) -> Result<()> {
        if !email.contains('@') {
            return Err(Error::Validation("Invalid email address".to_string()));
        }
        Ok(())
    }

    fn active_actor(&self, actor_id: UserId) -> Result<User> {
        let actor = self.storage.get_user(actor_id)?;
        if !actor.is_active {
            return Err(Error::Permission);
        }
        Ok(actor)
    }

    fn require_manage(&self, actor: &User, subject: &User) -> Result<()> {
        let is_ancestor = self.hierarchy.is_descendant(actor.id, subject.id)?;
        if !permission::can_manage(actor, subject, is_ancestor) {
            return Err(Error::Permission);
        }
        Ok(())
    }

    /// Create a user. With an actor the new user becomes their child; without
    /// one this is public self-registration and produces a root.
    pub fn create_user(&self, actor_id: Option<UserId>, new: NewUser) -> Result<User> {
        Self::validate_username(&new.username)?;
        Self::validate_email(&new.email)?;
        if new.password_hash.is_empty() {
            return Err(Error::Validation("Password hash must not be empty".to_string()));
        }

        let actor = match actor_id {
            Some(id) => Some(self.active_actor(id)?),
            None => None,
        };

        let role = new.role.unwrap_or(Role::User);
        if !permission::can_assign_role(actor.as_ref().map(|a| a.role), role, None) {
            return Err(Error::Permission);
        }

        if self
            .storage
            .find_user_by_username(&new.username)?
            .is_some()
        {
            return Err(Error::Conflict { field: "username" });
        }
        if self.storage.find_user_by_email(&new.email)?.is_some() {
            return Err(Error::Conflict { field: "email" });
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role,
            balance: Decimal::ZERO,
            created_by: actor.as_ref().map(|a| a.id),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_user(&user)?;
        self.metrics.users_created_total.inc();

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            created_by = ?user.created_by.map(|id| id.to_string()),
            "User created"
        );

        Ok(user)
    }

    /// Change username and/or email, re-checking uniqueness
    pub fn update_profile(
        &self,
        actor_id: UserId,
        subject_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User> {
        let actor = self.active_actor(actor_id)?;
        let subject = self.storage.get_user(subject_id)?;

        if actor_id != subject_id {
            self.require_manage(&actor, &subject)?;
        }
        if !subject.is_active {
            return Err(Error::Validation("User is not active".to_string()));
        }

        let mut updated = subject.clone();

        if let Some(username) = update.username {
            if username != subject.username {
                Self::validate_username(&username)?;
                if self.storage.find_user_by_username(&username)?.is_some() {
                    return Err(Error::Conflict { field: "username" });
                }
                updated.username = username;
            }
        }

        if let Some(email) = update.email {
            if !email.eq_ignore_ascii_case(&subject.email) {
                Self::validate_email(&email)?;
                if self.storage.find_user_by_email(&email)?.is_some() {
                    return Err(Error::Conflict { field: "email" });
                }
                updated.email = email;
            }
        }

        updated.updated_at = Utc::now();
        self.storage.update_user_identity(&subject, &updated)?;

        Ok(updated)
    }

    /// Assign a new role, gated by management rights and the assignment rule.
    /// Works on inactive subjects so accounts can be rehabilitated.
    pub fn change_role(&self, actor_id: UserId, subject_id: UserId, role: Role) -> Result<User> {
        let actor = self.active_actor(actor_id)?;
        let mut subject = self.storage.get_user(subject_id)?;

        self.require_manage(&actor, &subject)?;
        if !permission::can_assign_role(Some(actor.role), role, Some(subject.role)) {
            return Err(Error::Permission);
        }

        subject.role = role;
        subject.updated_at = Utc::now();
        self.storage.put_user(&subject)?;

        tracing::info!(
            actor = %actor.id,
            subject = %subject.id,
            role = %role,
            "Role changed"
        );

        Ok(subject)
    }

    /// Activate or deactivate an account. Manager only.
    pub fn set_active(&self, actor_id: UserId, subject_id: UserId, active: bool) -> Result<User> {
        let actor = self.active_actor(actor_id)?;
        let mut subject = self.storage.get_user(subject_id)?;

        self.require_manage(&actor, &subject)?;

        subject.is_active = active;
        subject.updated_at = Utc::now();
        self.storage.put_user(&subject)?;

        tracing::info!(
            actor = %actor.id,
            subject = %subject.id,
            active,
            "Status toggled"
        );

        Ok(subject)
    }

    /// Delete a drained account. Transactions are retained as audit history.
    pub fn delete_user(&self, actor_id: UserId, subject_id: UserId) -> Result<()> {
        let actor = self.active_actor(actor_id)?;
        let subject = self.storage.get_user(subject_id)?;

        if actor_id == subject_id {
            return Err(Error::Permission);
        }
        self.require_manage(&actor, &subject)?;
        if subject.balance != Decimal::ZERO {
            return Err(Error::Validation(
                "Balance must be zero before deletion".to_string(),
            ));
        }

        self.storage.delete_user(&subject)
    }
}
