//! Main orchestration layer
//!
//! Ties storage, hierarchy resolution, permissions, the ledger engine, and
//! the mutation actor into the high-level API an embedding service consumes.
//!
//! # Example
//!
//! ```no_run
//! use downline_core::{Config, Downline, NewUser};
//!
//! #[tokio::main]
//! async fn main() -> downline_core::Result<()> {
//!     let core = Downline::open(Config::default()).await?;
//!
//!     let alice = core
//!         .create_user(
//!             None,
//!             NewUser {
//!                 username: "alice".into(),
//!                 email: "alice@example.com".into(),
//!                 password_hash: "<hashed>".into(),
//!                 role: None,
//!             },
//!         )
//!         .await?;
//!
//!     let tree = core.downline_tree(alice.id)?;
//!     assert!(tree.is_some());
//!
//!     core.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_mutation_actor, MutationHandle},
    directory::Directory,
    hierarchy::{Hierarchy, TreeNode},
    ledger::{DebitOutcome, LedgerEngine, TransferOutcome},
    metrics::Metrics,
    permission,
    storage::Storage,
    types::{
        DateRange, NewUser, Page, PagedTransactions, ProfileUpdate, Role, SortOrder, Transaction,
        TransactionFilter, TransactionSummary, User, UserId,
    },
    Config, Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Main interface to the directory and ledger
pub struct Downline {
    /// Actor handle for mutations
    handle: MutationHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Tree queries over the same storage
    hierarchy: Hierarchy,

    /// Metrics registry
    metrics: Metrics,
}

impl Downline {
    /// Open the core with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let hierarchy = Hierarchy::new(storage.clone());
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to build metrics: {}", e)))?;

        let ledger = LedgerEngine::new(storage.clone(), hierarchy.clone(), metrics.clone());
        let directory = Directory::new(storage.clone(), hierarchy.clone(), metrics.clone());
        let handle = spawn_mutation_actor(ledger, directory, config.mailbox_capacity);

        tracing::info!(service = %config.service_name, "Core opened");

        Ok(Self {
            handle,
            storage,
            hierarchy,
            metrics,
        })
    }

    // Mutations (serialized through the actor)

    /// Credit a subject, funded per the hierarchy rules
    pub async fn credit(
        &self,
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome> {
        self.handle.credit(actor, subject, amount, description).await
    }

    /// Debit a subject
    pub async fn debit(
        &self,
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<DebitOutcome> {
        self.handle.debit(actor, subject, amount, description).await
    }

    /// Create a user; `actor` None means public self-registration
    pub async fn create_user(&self, actor: Option<UserId>, new_user: NewUser) -> Result<User> {
        self.handle.create_user(actor, new_user).await
    }

    /// Change username and/or email
    pub async fn update_profile(
        &self,
        actor: UserId,
        subject: UserId,
        update: ProfileUpdate,
    ) -> Result<User> {
        self.handle.update_profile(actor, subject, update).await
    }

    /// Assign a new role
    pub async fn change_role(&self, actor: UserId, subject: UserId, role: Role) -> Result<User> {
        self.handle.change_role(actor, subject, role).await
    }

    /// Activate or deactivate an account
    pub async fn set_active(&self, actor: UserId, subject: UserId, active: bool) -> Result<User> {
        self.handle.set_active(actor, subject, active).await
    }

    /// Delete a drained account
    pub async fn delete_user(&self, actor: UserId, subject: UserId) -> Result<()> {
        self.handle.delete_user(actor, subject).await
    }

    // Reads (straight to storage)

    /// Fetch one user
    pub fn user(&self, id: UserId) -> Result<User> {
        self.storage.get_user(id)
    }

    /// All descendants, flat
    pub fn downline(&self, user_id: UserId, include_self: bool) -> Result<Vec<User>> {
        self.hierarchy.downline(user_id, include_self)
    }

    /// The downline as a nested tree, or None for an unknown id
    pub fn downline_tree(&self, user_id: UserId) -> Result<Option<TreeNode>> {
        self.hierarchy.downline_tree(user_id)
    }

    /// Immediate children, sorted by username
    pub fn next_level(&self, user_id: UserId) -> Result<Vec<User>> {
        self.hierarchy.next_level(user_id)
    }

    /// The immediate ancestor, or None
    pub fn parent_of(&self, user_id: UserId) -> Result<Option<User>> {
        self.hierarchy.parent_of(user_id)
    }

    /// May `actor` perform managing operations on `subject`?
    pub fn can_manage(&self, actor_id: UserId, subject_id: UserId) -> Result<bool> {
        let actor = self.storage.get_user(actor_id)?;
        let subject = self.storage.get_user(subject_id)?;
        let is_ancestor = self.hierarchy.is_descendant(actor_id, subject_id)?;
        Ok(permission::can_manage(&actor, &subject, is_ancestor))
    }

    /// Filtered, sorted, paged transaction listing
    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        sort: SortOrder,
        page: Page,
    ) -> Result<PagedTransactions> {
        self.storage.list_transactions(filter, sort, page)
    }

    /// Aggregate one user's ledger activity over a window
    pub fn transaction_summary(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<TransactionSummary> {
        self.storage.summarize(user_id, range)
    }

    /// Look up a transaction by its unique reference
    pub fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        self.storage.find_transaction_by_reference(reference)
    }

    /// Metrics registry for scraping
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown the mutation actor
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
