//! Native signer: local keypair as fee payer.
//!
//! Useful against devnet/localnet and in tests. Production deployments
//! normally go through [`custody`](super::custody).

use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;

use super::{RemoteSignature, RemoteSigner};
use crate::error::SigningError;

/// Signs the fee-payer slot in-process and returns the transaction.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl RemoteSigner for KeypairSigner {
    fn fee_payer(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_and_submit_or_return(
        &self,
        mut transaction: Transaction,
    ) -> Result<RemoteSignature, SigningError> {
        let blockhash = transaction.message.recent_blockhash.clone();
        let signers = [&self.keypair];
        transaction
            .try_partial_sign(&signers[..], blockhash)
            .map_err(|e| SigningError::LocalSigner(e.to_string()))?;
        Ok(RemoteSignature::Signed(transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_hash::Hash;
    use solana_instruction::{AccountMeta, Instruction};

    #[test]
    fn test_signs_fee_payer_slot() {
        let payer = Keypair::new();
        let signer = KeypairSigner::new(payer.insecure_clone());
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(payer.pubkey(), true)],
            data: vec![],
        };
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer.pubkey()));
        tx.message.recent_blockhash = Hash::new_from_array([1u8; 32]);

        let signed = tokio_test::block_on(signer.sign_and_submit_or_return(tx)).unwrap();
        match signed {
            RemoteSignature::Signed(tx) => {
                assert!(tx.signatures[0].verify(payer.pubkey().as_ref(), &tx.message_data()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
