//! Signed transaction assembly.
//!
//! Local co-signers sign synchronously first; the remote signer is asked for
//! the fee-payer signature last. Whatever comes back is checked against the
//! declared fee payer before it is trusted.

use solana_hash::Hash;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::error::SigningError;
use crate::signer::{RemoteSignature, RemoteSigner};

/// A transaction ready to hand to the ledger.
#[derive(Debug, Clone)]
pub enum SignedTransaction {
    /// Fully signed; submit it.
    Ready(Transaction),
    /// The remote signer already broadcast it under this signature.
    Broadcast(Signature),
}

impl SignedTransaction {
    /// The transaction id: the fee payer's signature.
    pub fn signature(&self) -> Signature {
        match self {
            Self::Ready(tx) => tx.signatures.first().copied().unwrap_or_default(),
            Self::Broadcast(sig) => *sig,
        }
    }
}

/// Build, co-sign, and remotely sign `instructions` as one transaction.
pub async fn build_signed_transaction<S: RemoteSigner>(
    instructions: &[Instruction],
    fee_payer: &Pubkey,
    co_signers: &[&Keypair],
    recent_blockhash: Hash,
    signer: &S,
) -> Result<SignedTransaction, SigningError> {
    let declared = signer.fee_payer();
    if declared != *fee_payer {
        return Err(SigningError::FeePayerMismatch {
            expected: *fee_payer,
            actual: declared,
        });
    }

    let mut tx = Transaction::new_with_payer(instructions, Some(fee_payer));
    tx.try_partial_sign(co_signers, recent_blockhash)
        .map_err(|e| SigningError::LocalSigner(e.to_string()))?;
    let message_data = tx.message_data();

    match signer.sign_and_submit_or_return(tx.clone()).await? {
        RemoteSignature::Signed(signed) => {
            if signed.message != tx.message {
                return Err(SigningError::MessageTampered);
            }
            let payer_sig = signed.signatures.first().copied().unwrap_or_default();
            if !payer_sig.verify(fee_payer.as_ref(), &message_data) {
                return Err(SigningError::InvalidSignature(*fee_payer));
            }
            Ok(SignedTransaction::Ready(signed))
        }
        RemoteSignature::Submitted(signature) => {
            if !signature.verify(fee_payer.as_ref(), &message_data) {
                return Err(SigningError::InvalidSignature(*fee_payer));
            }
            Ok(SignedTransaction::Broadcast(signature))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::KeypairSigner;
    use solana_instruction::AccountMeta;
    use solana_signer::Signer;

    struct Scripted {
        payer: Pubkey,
        reply: RemoteSignature,
    }

    impl RemoteSigner for Scripted {
        fn fee_payer(&self) -> Pubkey {
            self.payer
        }

        async fn sign_and_submit_or_return(
            &self,
            _transaction: Transaction,
        ) -> Result<RemoteSignature, SigningError> {
            Ok(self.reply.clone())
        }
    }

    fn co_signed_ix(program: &Pubkey) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(*program, true)],
            data: vec![1, 0, 0, 0],
        }
    }

    #[tokio::test]
    async fn test_local_and_remote_signatures_verify() {
        let payer = Keypair::new();
        let identity = Keypair::new();
        let signer = KeypairSigner::new(payer.insecure_clone());

        let signed = build_signed_transaction(
            &[co_signed_ix(&identity.pubkey())],
            &payer.pubkey(),
            &[&identity],
            Hash::default(),
            &signer,
        )
        .await
        .unwrap();

        match signed {
            SignedTransaction::Ready(tx) => {
                assert_eq!(tx.signatures.len(), 2);
                let data = tx.message_data();
                for (sig, key) in tx.signatures.iter().zip(&tx.message.account_keys) {
                    assert!(sig.verify(key.as_ref(), &data));
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signer_for_other_payer_is_refused() {
        let identity = Keypair::new();
        let signer = KeypairSigner::new(Keypair::new());

        let err = build_signed_transaction(
            &[co_signed_ix(&identity.pubkey())],
            &Pubkey::new_unique(),
            &[&identity],
            Hash::default(),
            &signer,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SigningError::FeePayerMismatch { .. }));
    }

    #[tokio::test]
    async fn test_bogus_broadcast_signature_rejected() {
        let payer = Keypair::new();
        let identity = Keypair::new();
        let signer = Scripted {
            payer: payer.pubkey(),
            reply: RemoteSignature::Submitted(Signature::from([9u8; 64])),
        };

        let err = build_signed_transaction(
            &[co_signed_ix(&identity.pubkey())],
            &payer.pubkey(),
            &[&identity],
            Hash::default(),
            &signer,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SigningError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_swapped_message_rejected() {
        let payer = Keypair::new();
        let identity = Keypair::new();

        let mut other = Transaction::new_with_payer(
            &[co_signed_ix(&Pubkey::new_unique())],
            Some(&payer.pubkey()),
        );
        other.message.recent_blockhash = Hash::default();
        let signer = Scripted {
            payer: payer.pubkey(),
            reply: RemoteSignature::Signed(other),
        };

        let err = build_signed_transaction(
            &[co_signed_ix(&identity.pubkey())],
            &payer.pubkey(),
            &[&identity],
            Hash::default(),
            &signer,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SigningError::MessageTampered));
    }
}
