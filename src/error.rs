//! Unified SDK error types.

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use thiserror::Error;

/// Top-level deployment error.
///
/// Every failure a run can hit lands here before it is wrapped into a
/// [`DeploymentFailure`](crate::deploy::DeploymentFailure).
#[derive(Error, Debug)]
pub enum DeployError {
    /// Empty blob, non-positive chunk limit, bad resume offset, mismatched identity.
    /// Detected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Deployment cancelled")]
    Cancelled,
}

impl DeployError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DeployError::InvalidInput(msg.into())
    }
}

/// Errors raised while collecting signatures for a transaction.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Signer rejected the transaction: {0}")]
    Rejected(String),

    #[error("Signer did not respond within {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    #[error("Fee payer mismatch: expected {expected}, got {actual}")]
    FeePayerMismatch { expected: Pubkey, actual: Pubkey },

    #[error("Signature does not verify against fee payer {0}")]
    InvalidSignature(Pubkey),

    #[error("Signer returned a transaction with a different message")]
    MessageTampered,

    #[error("Local signer error: {0}")]
    LocalSigner(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

/// Errors raised by a [`LedgerClient`](crate::ledger::LedgerClient).
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Transaction {signature} failed: {reason}")]
    Confirmation { signature: Signature, reason: String },

    #[error("Transaction {signature} not confirmed after {waited_ms}ms")]
    ConfirmationTimeout { signature: Signature, waited_ms: u64 },
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

pub type DeployResult<T> = Result<T, DeployError>;
