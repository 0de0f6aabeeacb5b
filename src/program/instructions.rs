//! Instruction builders for program deployment.
//!
//! Account creation goes through the System Program; Write and Finalize use
//! the loader's own layout:
//!
//! ```text
//! Write:    [discriminator u32 LE = 0][offset u32 LE][bytes...]
//! Finalize: [discriminator u32 LE = 1]
//! ```

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::error::{DeployError, DeployResult};
use crate::program::chunk::Chunk;
use crate::program::constants::{instruction, DISCRIMINATOR_SIZE, OFFSET_SIZE, RENT_SYSVAR_ID};

// ============================================================================
// Helper Functions
// ============================================================================

/// Create an account meta for a signer+writable account.
fn signer_mut(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new(pubkey, true)
}

/// Create an account meta for a read-only account.
fn readonly(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, false)
}

// ============================================================================
// Loader payloads
// ============================================================================

/// Decoded loader instruction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderInstruction {
    Write { offset: u32, bytes: Vec<u8> },
    Finalize,
}

impl LoaderInstruction {
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::Write { offset, bytes } => {
                let mut data = Vec::with_capacity(DISCRIMINATOR_SIZE + OFFSET_SIZE + bytes.len());
                data.extend_from_slice(&instruction::WRITE.to_le_bytes());
                data.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(bytes);
                data
            }
            Self::Finalize => instruction::FINALIZE.to_le_bytes().to_vec(),
        }
    }

    pub fn unpack(data: &[u8]) -> DeployResult<Self> {
        let (tag, rest) = split_u32(data)
            .ok_or_else(|| DeployError::invalid("loader instruction shorter than discriminator"))?;

        match tag {
            instruction::WRITE => {
                let (offset, bytes) = split_u32(rest)
                    .ok_or_else(|| DeployError::invalid("write instruction missing offset"))?;
                Ok(Self::Write {
                    offset,
                    bytes: bytes.to_vec(),
                })
            }
            instruction::FINALIZE if rest.is_empty() => Ok(Self::Finalize),
            instruction::FINALIZE => Err(DeployError::invalid(format!(
                "finalize instruction has {} trailing bytes",
                rest.len()
            ))),
            other => Err(DeployError::invalid(format!(
                "unknown loader discriminator: {}",
                other
            ))),
        }
    }
}

fn split_u32(data: &[u8]) -> Option<(u32, &[u8])> {
    if data.len() < 4 {
        return None;
    }
    let (head, rest) = data.split_at(4);
    let value = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
    Some((value, rest))
}

// ============================================================================
// Instruction Builders
// ============================================================================

/// Build the System Program CreateAccount instruction for the program account.
///
/// Accounts:
/// 0. payer (signer, mut) - Fee payer funding rent exemption
/// 1. new_account (signer, mut) - Program identity
pub fn build_create_account_ix(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    solana_system_interface::instruction::create_account(payer, new_account, lamports, space, owner)
}

/// Build a loader Write instruction for one chunk.
///
/// Accounts:
/// 0. program (signer, mut) - Account being written
pub fn build_write_ix(program: &Pubkey, chunk: &Chunk, loader_id: &Pubkey) -> Instruction {
    let data = LoaderInstruction::Write {
        offset: chunk.offset,
        bytes: chunk.bytes.clone(),
    }
    .pack();

    Instruction {
        program_id: *loader_id,
        accounts: vec![signer_mut(*program)],
        data,
    }
}

/// Build the loader Finalize instruction, marking the account executable.
///
/// Accounts:
/// 0. program (signer, mut) - Account to finalize
/// 1. rent_sysvar (readonly)
pub fn build_finalize_ix(program: &Pubkey, loader_id: &Pubkey) -> Instruction {
    Instruction {
        program_id: *loader_id,
        accounts: vec![signer_mut(*program), readonly(RENT_SYSVAR_ID)],
        data: LoaderInstruction::Finalize.pack(),
    }
}
