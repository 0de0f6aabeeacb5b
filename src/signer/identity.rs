//! Program identity: the keypair whose public key becomes the program id.

use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;

use crate::error::{DeployError, DeployResult};

/// Keypair for the account receiving the program.
///
/// It co-signs account creation and every Write/Finalize locally; the
/// fee-payer signature comes from the [`RemoteSigner`](super::RemoteSigner).
pub struct ProgramIdentity {
    keypair: Keypair,
}

impl ProgramIdentity {
    /// Fresh random identity.
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Accept `keypair` only if it matches the address the caller expects.
    ///
    /// Use this for wallet-derived identities: a mismatch is an input error,
    /// never a reason to fall back to a new keypair.
    pub fn from_keypair_checked(keypair: Keypair, expected: &Pubkey) -> DeployResult<Self> {
        let actual = keypair.pubkey();
        if actual != *expected {
            return Err(DeployError::invalid(format!(
                "program identity {} does not match expected {}",
                actual, expected
            )));
        }
        Ok(Self { keypair })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for ProgramIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramIdentity")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}
