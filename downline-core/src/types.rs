//! Core types for the directory and ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Immutable audit records (transactions are never updated)

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Raw key bytes for storage
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Reconstruct from raw key bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier (UUIDv7 so storage keys iterate in time order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a fresh time-ordered ID
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Raw key bytes for storage
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Reconstruct from raw key bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User role, totally ordered by rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular user
    User,
    /// Moderator
    Moderator,
    /// Administrator
    Admin,
    /// Super administrator
    SuperAdmin,
}

impl Role {
    /// Rank used for manage-ability comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Role::User => 1,
            Role::Moderator => 2,
            Role::Admin => 3,
            Role::SuperAdmin => 4,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Parse from wire name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Admin and above
    pub fn is_privileged(&self) -> bool {
        self.rank() >= Role::Admin.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user record: one node in the creation forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique ID
    pub id: UserId,

    /// Unique username (exact match)
    pub username: String,

    /// Unique email (case-insensitive)
    pub email: String,

    /// Opaque hash supplied by the external credential verifier
    pub password_hash: String,

    /// Role
    pub role: Role,

    /// Current balance, never negative. Written only by the ledger engine.
    pub balance: Decimal,

    /// Creator edge. None for roots (public registration). Weak reference:
    /// the parent may have been deleted after creation. Never re-parented.
    pub created_by: Option<UserId>,

    /// Inactive users cannot act or be operated on, except role/status
    /// toggling by a manager.
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True for users with no parent edge
    pub fn is_root(&self) -> bool {
        self.created_by.is_none()
    }
}

/// Input for user creation. The password arrives pre-hashed; the core never
/// sees credential material.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested username
    pub username: String,
    /// Requested email
    pub email: String,
    /// Pre-hashed password
    pub password_hash: String,
    /// Requested role; defaults to `user` and is validated against the
    /// actor's assignment rights
    pub role: Option<Role>,
}

/// Partial profile update
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New username, if changing
    pub username: Option<String>,
    /// New email, if changing
    pub email: Option<String>,
}

/// Direction of a balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Balance increased
    Credit,
    /// Balance decreased
    Debit,
}

impl TransactionKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status. The engine only ever produces `Completed`; the other
/// states are reserved for future async settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Reserved
    Pending,
    /// Applied and visible
    Completed,
    /// Reserved
    Failed,
    /// Reserved
    Cancelled,
}

/// Immutable record of one balance movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique ID (time-ordered)
    pub id: TransactionId,

    /// Subject whose balance changed
    pub user_id: UserId,

    /// Who initiated the movement
    pub performed_by: UserId,

    /// Credit or debit
    pub kind: TransactionKind,

    /// Moved amount, always positive
    pub amount: Decimal,

    /// Subject balance before the movement
    pub previous_balance: Decimal,

    /// Subject balance after the movement
    pub new_balance: Decimal,

    /// Human-readable description
    pub description: String,

    /// Settlement status
    pub status: TransactionStatus,

    /// Globally unique human-readable identifier, generated at append time
    pub reference: String,

    /// Shared by the two legs of a single transfer; absent on single-leg
    /// movements
    pub correlation_id: Option<Uuid>,

    /// Append timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Check the snapshot invariant: `new == prev + amount` for credits,
    /// `new == prev - amount` for debits.
    pub fn snapshot_consistent(&self) -> bool {
        match self.kind {
            TransactionKind::Credit => self.new_balance == self.previous_balance + self.amount,
            TransactionKind::Debit => self.new_balance == self.previous_balance - self.amount,
        }
    }
}

/// Generate a transaction reference: millisecond timestamp plus a random
/// alphanumeric suffix. Uniqueness is re-checked against the store at append
/// time.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("TXN-{}-{}", now.timestamp_millis(), suffix.to_uppercase())
}

/// Inclusive time window for transaction queries
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    /// Lower bound, inclusive
    pub from: Option<DateTime<Utc>>,
    /// Upper bound, inclusive
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether a timestamp falls inside the window
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if t < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if t > to {
                return false;
            }
        }
        true
    }
}

/// Transaction query filter
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one subject
    pub user_id: Option<UserId>,
    /// Restrict to credits or debits
    pub kind: Option<TransactionKind>,
    /// Restrict to a time window
    pub date_range: Option<DateRange>,
}

/// Sort direction for transaction listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent first (default)
    NewestFirst,
    /// Oldest first
    OldestFirst,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::NewestFirst
    }
}

/// Page request, 1-based
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Page number, starting at 1
    pub number: usize,
    /// Items per page
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: 20,
        }
    }
}

/// One page of transactions plus pagination metadata
#[derive(Debug, Clone)]
pub struct PagedTransactions {
    /// Items on this page
    pub items: Vec<Transaction>,
    /// Page number served
    pub page: usize,
    /// Requested page size
    pub per_page: usize,
    /// Total matching items across all pages
    pub total_items: usize,
    /// Total pages
    pub total_pages: usize,
}

/// Aggregate of a user's ledger activity over a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Sum of credit amounts
    pub total_credits: Decimal,
    /// Sum of debit amounts
    pub total_debits: Decimal,
    /// Number of credits
    pub credit_count: u64,
    /// Number of debits
    pub debit_count: u64,
    /// Credits minus debits
    pub net_amount: Decimal,
}
