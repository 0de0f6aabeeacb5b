//! Ledger capability: rent queries, submission, and confirmation.
//!
//! Network selection happens when the client is constructed. Timeout and
//! retry policy for submission and confirmation belong to the implementation.

#[cfg(feature = "solana-rpc")]
pub mod rpc;

#[cfg(feature = "solana-rpc")]
pub use rpc::{RpcLedgerClient, RpcLedgerConfig};

use std::future::Future;
use std::sync::Arc;

use solana_hash::Hash;
use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::error::LedgerError;

/// What the deployer needs from the ledger.
pub trait LedgerClient: Send + Sync {
    /// Lamports an account of `space` bytes needs to be rent-exempt.
    fn minimum_balance_for_rent_exemption(
        &self,
        space: usize,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send;

    /// Broadcast a fully signed transaction.
    fn submit(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send;

    /// Resolve once `signature` is confirmed, or fail.
    fn confirm(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

impl<T: LedgerClient> LedgerClient for &T {
    fn minimum_balance_for_rent_exemption(
        &self,
        space: usize,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send {
        (**self).minimum_balance_for_rent_exemption(space)
    }

    fn latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send {
        (**self).latest_blockhash()
    }

    fn submit(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send {
        (**self).submit(transaction)
    }

    fn confirm(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send {
        (**self).confirm(signature)
    }
}

impl<T: LedgerClient> LedgerClient for Arc<T> {
    fn minimum_balance_for_rent_exemption(
        &self,
        space: usize,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send {
        (**self).minimum_balance_for_rent_exemption(space)
    }

    fn latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send {
        (**self).latest_blockhash()
    }

    fn submit(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send {
        (**self).submit(transaction)
    }

    fn confirm(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send {
        (**self).confirm(signature)
    }
}
