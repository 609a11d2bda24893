//! Downline Core
//!
//! Hierarchical user directory fused with a balance-transfer ledger. Users
//! form a creation forest; managers move balance down the tree; every
//! movement leaves an immutable transaction record.
//!
//! # Architecture
//!
//! - **Single Writer**: all mutations flow through one actor task, so a
//!   sufficiency check and its write can never interleave with another
//!   mutation
//! - **Atomic Batches**: a transfer commits both balances, both transaction
//!   legs, and their indices in one RocksDB write batch
//! - **Exact Money**: `Decimal` everywhere, no floating point
//! - **Append-only Audit**: transactions are never updated or deleted
//!
//! # Invariants
//!
//! - Balances never go below zero
//! - Parent-funded credits conserve money across payer and subject
//! - The creation forest is acyclic; parent edges are set once
//! - Failed operations leave both stores untouched

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod config;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod ledger;
pub mod metrics;
pub mod permission;
pub mod storage;
pub mod telemetry;
pub mod types;

mod downline;

// Re-exports
pub use config::Config;
pub use downline::Downline;
pub use error::{Error, Result};
pub use hierarchy::TreeNode;
pub use ledger::{DebitOutcome, PayerAdjustment, TransferOutcome};
pub use types::{
    DateRange, NewUser, Page, PagedTransactions, ProfileUpdate, Role, SortOrder, Transaction,
    TransactionFilter, TransactionId, TransactionKind, TransactionStatus, TransactionSummary,
    User, UserId,
};
