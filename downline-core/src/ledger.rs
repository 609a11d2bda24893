//! Ledger engine: balance-affecting operations
//!
//! Every operation validates first and commits last. The commit is a single
//! atomic batch, so callers only ever observe "succeeded with new balances
//! and transactions" or "failed, nothing changed".
//!
//! A credit moves money from a payer to the subject:
//! - self-recharge (actor == subject): no payer, money enters the system;
//! - otherwise the subject's parent pays, or the actor pays when the subject
//!   is a root.
//!
//! A debit burns balance from the subject without crediting anyone. The
//! asymmetry is deliberate and matches the upstream accounting rules.
//!
//! These methods are synchronous and are intended to run on the single
//! mutation task (see `actor`), which is what makes the sufficiency check
//! and the write atomic with respect to concurrent operations.

use crate::{
    hierarchy::Hierarchy,
    metrics::Metrics,
    permission,
    storage::Storage,
    types::{
        generate_reference, Transaction, TransactionId, TransactionKind, TransactionStatus, User,
        UserId,
    },
    Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Result of a successful credit
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Subject balance after the credit
    pub subject_new_balance: Decimal,
    /// The credit leg
    pub transaction: Transaction,
    /// The debit side, when a payer funded the transfer
    pub payer_adjustment: Option<PayerAdjustment>,
}

/// The payer's side of a funded credit
#[derive(Debug, Clone)]
pub struct PayerAdjustment {
    /// Who paid
    pub payer_id: UserId,
    /// Payer balance before
    pub previous_balance: Decimal,
    /// Payer balance after
    pub new_balance: Decimal,
    /// The debit leg
    pub transaction: Transaction,
}

/// Result of a successful debit
#[derive(Debug, Clone)]
pub struct DebitOutcome {
    /// Subject balance after the debit
    pub subject_new_balance: Decimal,
    /// The debit record
    pub transaction: Transaction,
}

/// Balance mutation engine
pub struct LedgerEngine {
    storage: Arc<Storage>,
    hierarchy: Hierarchy,
    metrics: Metrics,
}

impl LedgerEngine {
    /// Create an engine over the given store
    pub fn new(storage: Arc<Storage>, hierarchy: Hierarchy, metrics: Metrics) -> Self {
        Self {
            storage,
            hierarchy,
            metrics,
        }
    }

    fn validate_amount(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }
        Ok(())
    }

    /// Mint a reference that is free in the store and distinct from any
    /// not-yet-committed leg of the same transfer. The single-writer
    /// discipline keeps it free until the commit below.
    fn mint_reference(&self, now: chrono::DateTime<Utc>, pending: &[Transaction]) -> Result<String> {
        loop {
            let reference = generate_reference(now);
            if pending.iter().any(|tx| tx.reference == reference) {
                continue;
            }
            if self
                .storage
                .find_transaction_by_reference(&reference)?
                .is_none()
            {
                return Ok(reference);
            }
        }
    }

    fn active_actor(&self, actor_id: UserId) -> Result<User> {
        let actor = self.storage.get_user(actor_id)?;
        if !actor.is_active {
            return Err(Error::Permission);
        }
        Ok(actor)
    }

    fn active_subject(&self, subject_id: UserId) -> Result<User> {
        let subject = self.storage.get_user(subject_id)?;
        if !subject.is_active {
            return Err(Error::Validation("User is not active".to_string()));
        }
        Ok(subject)
    }

    /// Credit `subject` with `amount`, funded per the hierarchy rules
    pub fn credit(
        &self,
        actor_id: UserId,
        subject_id: UserId,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<TransferOutcome> {
        Self::validate_amount(amount)?;

        let actor = self.active_actor(actor_id)?;
        let self_recharge = actor_id == subject_id;
        let mut subject = if self_recharge {
            actor.clone()
        } else {
            self.active_subject(subject_id)?
        };

        let permitted = self_recharge
            || actor.role.is_privileged()
            || self.hierarchy.is_descendant(actor_id, subject_id)?;
        if !permitted {
            self.metrics.rejections_total.inc();
            return Err(Error::Permission);
        }

        // Payer resolution: parent funds the subject; a root subject is
        // funded by the acting manager; self-recharge has no payer at all.
        let payer = if self_recharge {
            None
        } else {
            let parent = match subject.created_by {
                Some(parent_id) => self.storage.find_user(parent_id)?,
                None => None,
            };
            Some(parent.unwrap_or_else(|| actor.clone()))
        };

        let now = Utc::now();
        let correlation_id = payer.as_ref().map(|_| Uuid::new_v4());
        let funding_username = payer.as_ref().map(|p| p.username.clone());

        let mut users = Vec::with_capacity(2);
        let mut transactions = Vec::with_capacity(2);

        let payer_adjustment = match payer {
            Some(mut payer) => {
                if payer.balance < amount {
                    self.metrics.rejections_total.inc();
                    return Err(Error::InsufficientBalance {
                        available: payer.balance,
                        requested: amount,
                    });
                }
                let previous_balance = payer.balance;
                payer.balance -= amount;
                payer.updated_at = now;

                let debit_leg = Transaction {
                    id: TransactionId::generate(),
                    user_id: payer.id,
                    performed_by: actor.id,
                    kind: TransactionKind::Debit,
                    amount,
                    previous_balance,
                    new_balance: payer.balance,
                    description: description
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Transfer to {}", subject.username)),
                    status: TransactionStatus::Completed,
                    reference: self.mint_reference(now, &transactions)?,
                    correlation_id,
                    created_at: now,
                };
                let adjustment = PayerAdjustment {
                    payer_id: payer.id,
                    previous_balance,
                    new_balance: payer.balance,
                    transaction: debit_leg.clone(),
                };
                users.push(payer);
                transactions.push(debit_leg);
                Some(adjustment)
            }
            None => None,
        };

        let previous_balance = subject.balance;
        subject.balance += amount;
        subject.updated_at = now;

        let credit_leg = Transaction {
            id: TransactionId::generate(),
            user_id: subject.id,
            performed_by: actor.id,
            kind: TransactionKind::Credit,
            amount,
            previous_balance,
            new_balance: subject.balance,
            description: description.map(str::to_string).unwrap_or_else(|| {
                match &funding_username {
                    Some(name) => format!("Transfer from {}", name),
                    None => "Self recharge".to_string(),
                }
            }),
            status: TransactionStatus::Completed,
            reference: self.mint_reference(now, &transactions)?,
            correlation_id,
            created_at: now,
        };
        users.push(subject.clone());
        transactions.push(credit_leg.clone());

        let timer = self.metrics.commit_duration.start_timer();
        self.storage.commit_transfer(&users, &transactions)?;
        timer.observe_duration();
        self.metrics.credits_total.inc();

        tracing::info!(
            actor = %actor.id,
            subject = %subject.id,
            amount = %amount,
            reference = %credit_leg.reference,
            funded = payer_adjustment.is_some(),
            "Credit committed"
        );

        Ok(TransferOutcome {
            subject_new_balance: subject.balance,
            transaction: credit_leg,
            payer_adjustment,
        })
    }

    /// Debit `subject` by `amount`. No counterpart credit anywhere.
    pub fn debit(
        &self,
        actor_id: UserId,
        subject_id: UserId,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<DebitOutcome> {
        Self::validate_amount(amount)?;

        let actor = self.active_actor(actor_id)?;
        let mut subject = if actor_id == subject_id {
            actor.clone()
        } else {
            self.active_subject(subject_id)?
        };

        if actor_id != subject_id {
            let is_ancestor = self.hierarchy.is_descendant(actor_id, subject_id)?;
            if !permission::can_manage(&actor, &subject, is_ancestor) {
                self.metrics.rejections_total.inc();
                return Err(Error::Permission);
            }
        }

        if subject.balance < amount {
            self.metrics.rejections_total.inc();
            return Err(Error::InsufficientBalance {
                available: subject.balance,
                requested: amount,
            });
        }

        let now = Utc::now();
        let previous_balance = subject.balance;
        subject.balance -= amount;
        subject.updated_at = now;

        let transaction = Transaction {
            id: TransactionId::generate(),
            user_id: subject.id,
            performed_by: actor.id,
            kind: TransactionKind::Debit,
            amount,
            previous_balance,
            new_balance: subject.balance,
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| "Balance deduction".to_string()),
            status: TransactionStatus::Completed,
            reference: self.mint_reference(now, &[])?,
            correlation_id: None,
            created_at: now,
        };

        let timer = self.metrics.commit_duration.start_timer();
        self.storage
            .commit_transfer(&[subject.clone()], &[transaction.clone()])?;
        timer.observe_duration();
        self.metrics.debits_total.inc();

        tracing::info!(
            actor = %actor.id,
            subject = %subject.id,
            amount = %amount,
            reference = %transaction.reference,
            "Debit committed"
        );

        Ok(DebitOutcome {
            subject_new_balance: subject.balance,
            transaction,
        })
    }
}
