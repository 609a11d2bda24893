//! Actor-based concurrency for mutations
//!
//! All writes (transfers and identity changes) flow through one task with a
//! bounded mailbox. One logical writer means a sufficiency check and the
//! write it guards can never interleave with another mutation: two
//! concurrent debits of the same account are processed strictly one after
//! the other, so both can never pass the check on a stale balance.
//!
//! Reads do not enter the mailbox; they hit storage directly.

use crate::{
    directory::Directory,
    ledger::{DebitOutcome, LedgerEngine, TransferOutcome},
    types::{NewUser, ProfileUpdate, Role, User, UserId},
    Error, Result,
};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the mutation actor
pub enum MutationMessage {
    /// Credit a subject's balance
    Credit {
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
        response: oneshot::Sender<Result<TransferOutcome>>,
    },

    /// Debit a subject's balance
    Debit {
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
        response: oneshot::Sender<Result<DebitOutcome>>,
    },

    /// Create a user
    CreateUser {
        actor: Option<UserId>,
        new_user: NewUser,
        response: oneshot::Sender<Result<User>>,
    },

    /// Update username/email
    UpdateProfile {
        actor: UserId,
        subject: UserId,
        update: ProfileUpdate,
        response: oneshot::Sender<Result<User>>,
    },

    /// Assign a new role
    ChangeRole {
        actor: UserId,
        subject: UserId,
        role: Role,
        response: oneshot::Sender<Result<User>>,
    },

    /// Activate or deactivate an account
    SetActive {
        actor: UserId,
        subject: UserId,
        active: bool,
        response: oneshot::Sender<Result<User>>,
    },

    /// Delete a drained account
    DeleteUser {
        actor: UserId,
        subject: UserId,
        response: oneshot::Sender<Result<()>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes mutation messages
pub struct MutationActor {
    ledger: LedgerEngine,
    directory: Directory,
    mailbox: mpsc::Receiver<MutationMessage>,
}

impl MutationActor {
    /// Create new actor
    pub fn new(
        ledger: LedgerEngine,
        directory: Directory,
        mailbox: mpsc::Receiver<MutationMessage>,
    ) -> Self {
        Self {
            ledger,
            directory,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                MutationMessage::Shutdown => break,
                other => self.handle_message(other),
            }
        }
    }

    fn handle_message(&mut self, msg: MutationMessage) {
        match msg {
            MutationMessage::Credit {
                actor,
                subject,
                amount,
                description,
                response,
            } => {
                let result = self
                    .ledger
                    .credit(actor, subject, amount, description.as_deref());
                let _ = response.send(result);
            }

            MutationMessage::Debit {
                actor,
                subject,
                amount,
                description,
                response,
            } => {
                let result = self
                    .ledger
                    .debit(actor, subject, amount, description.as_deref());
                let _ = response.send(result);
            }

            MutationMessage::CreateUser {
                actor,
                new_user,
                response,
            } => {
                let _ = response.send(self.directory.create_user(actor, new_user));
            }

            MutationMessage::UpdateProfile {
                actor,
                subject,
                update,
                response,
            } => {
                let _ = response.send(self.directory.update_profile(actor, subject, update));
            }

            MutationMessage::ChangeRole {
                actor,
                subject,
                role,
                response,
            } => {
                let _ = response.send(self.directory.change_role(actor, subject, role));
            }

            MutationMessage::SetActive {
                actor,
                subject,
                active,
                response,
            } => {
                let _ = response.send(self.directory.set_active(actor, subject, active));
            }

            MutationMessage::DeleteUser {
                actor,
                subject,
                response,
            } => {
                let _ = response.send(self.directory.delete_user(actor, subject));
            }

            MutationMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct MutationHandle {
    sender: mpsc::Sender<MutationMessage>,
}

impl MutationHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<MutationMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> MutationMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Credit a subject's balance
    pub async fn credit(
        &self,
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome> {
        self.request(|response| MutationMessage::Credit {
            actor,
            subject,
            amount,
            description,
            response,
        })
        .await
    }

    /// Debit a subject's balance
    pub async fn debit(
        &self,
        actor: UserId,
        subject: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<DebitOutcome> {
        self.request(|response| MutationMessage::Debit {
            actor,
            subject,
            amount,
            description,
            response,
        })
        .await
    }

    /// Create a user
    pub async fn create_user(&self, actor: Option<UserId>, new_user: NewUser) -> Result<User> {
        self.request(|response| MutationMessage::CreateUser {
            actor,
            new_user,
            response,
        })
        .await
    }

    /// Update username/email
    pub async fn update_profile(
        &self,
        actor: UserId,
        subject: UserId,
        update: ProfileUpdate,
    ) -> Result<User> {
        self.request(|response| MutationMessage::UpdateProfile {
            actor,
            subject,
            update,
            response,
        })
        .await
    }

    /// Assign a new role
    pub async fn change_role(&self, actor: UserId, subject: UserId, role: Role) -> Result<User> {
        self.request(|response| MutationMessage::ChangeRole {
            actor,
            subject,
            role,
            response,
        })
        .await
    }

    /// Activate or deactivate an account
    pub async fn set_active(&self, actor: UserId, subject: UserId, active: bool) -> Result<User> {
        self.request(|response| MutationMessage::SetActive {
            actor,
            subject,
            active,
            response,
        })
        .await
    }

    /// Delete a drained account
    pub async fn delete_user(&self, actor: UserId, subject: UserId) -> Result<()> {
        self.request(|response| MutationMessage::DeleteUser {
            actor,
            subject,
            response,
        })
        .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MutationMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the mutation actor
pub fn spawn_mutation_actor(
    ledger: LedgerEngine,
    directory: Directory,
    mailbox_capacity: usize,
) -> MutationHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = MutationActor::new(ledger, directory, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    MutationHandle::new(tx)
}
