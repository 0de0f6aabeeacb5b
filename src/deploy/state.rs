//! Deployment states and terminal outcomes.

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::error::DeployError;

/// Where a run is. Moves forward only; `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeploymentState {
    Idle,
    CreatingAccount,
    /// Bytes below `next_offset` are confirmed on-chain.
    WritingChunks { next_offset: u32 },
    Finalizing,
    Succeeded { program_id: Pubkey },
    Failed {
        reason: String,
        last_confirmed_offset: Option<u32>,
    },
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::CreatingAccount => write!(f, "creating account"),
            Self::WritingChunks { next_offset } => write!(f, "writing chunks (offset {})", next_offset),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Succeeded { program_id } => write!(f, "succeeded ({})", program_id),
            Self::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// A finished deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedProgram {
    pub program_id: Pubkey,
    pub explorer_url: String,
    /// Transactions this run got onto the ledger.
    pub transactions: usize,
}

/// A run that stopped short of `Succeeded`.
#[derive(Debug, Error)]
#[error("deployment of {program_id} failed: {error}")]
pub struct DeploymentFailure {
    pub program_id: Pubkey,
    #[source]
    pub error: DeployError,
    /// End of the confirmed prefix of the blob. `None` if the program account
    /// was never confirmed; `Some(0)` right after account creation.
    pub last_confirmed_offset: Option<u32>,
    pub blob_len: u32,
}

impl DeploymentFailure {
    /// The account exists and holds (possibly part of) the blob but is not
    /// executable. Resume with the same identity from
    /// [`last_confirmed_offset`](Self::last_confirmed_offset).
    pub fn is_partial(&self) -> bool {
        self.last_confirmed_offset.is_some()
    }
}

pub type DeploymentOutcome = Result<DeployedProgram, DeploymentFailure>;
