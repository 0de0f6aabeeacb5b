//! Signer capability: who pays fees and how the fee-payer signature is obtained.
//!
//! The fee-payer key never has to live in this process. A [`RemoteSigner`]
//! receives a transaction that already carries every local co-signature and
//! either hands it back fully signed or broadcasts it itself and returns the
//! resulting signature. Implementations may take arbitrarily long (human or
//! policy approval) and own their own timeout policy.
//!
//! - [`KeypairSigner`] signs in-process with a local keypair.
//! - [`custody::CustodySigner`] delegates to a custody service over HTTP
//!   (requires the `http` feature).

#[cfg(feature = "http")]
pub mod custody;
pub mod identity;
pub mod native;

pub use identity::ProgramIdentity;
pub use native::KeypairSigner;

use std::future::Future;
use std::sync::Arc;

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::error::SigningError;

/// What a remote signer hands back.
#[derive(Debug, Clone)]
pub enum RemoteSignature {
    /// Fully signed transaction; the caller submits it.
    Signed(Transaction),
    /// The signer broadcast the transaction itself; this is its signature.
    Submitted(Signature),
}

/// External signer supplying the fee-payer signature.
pub trait RemoteSigner: Send + Sync {
    /// Account paying fees and rent for every deployment transaction.
    fn fee_payer(&self) -> Pubkey;

    /// Add the fee-payer signature, then return the transaction or broadcast it.
    fn sign_and_submit_or_return(
        &self,
        transaction: Transaction,
    ) -> impl Future<Output = Result<RemoteSignature, SigningError>> + Send;
}

impl<T: RemoteSigner> RemoteSigner for &T {
    fn fee_payer(&self) -> Pubkey {
        (**self).fee_payer()
    }

    fn sign_and_submit_or_return(
        &self,
        transaction: Transaction,
    ) -> impl Future<Output = Result<RemoteSignature, SigningError>> + Send {
        (**self).sign_and_submit_or_return(transaction)
    }
}

impl<T: RemoteSigner> RemoteSigner for Arc<T> {
    fn fee_payer(&self) -> Pubkey {
        (**self).fee_payer()
    }

    fn sign_and_submit_or_return(
        &self,
        transaction: Transaction,
    ) -> impl Future<Output = Result<RemoteSignature, SigningError>> + Send {
        (**self).sign_and_submit_or_return(transaction)
    }
}
