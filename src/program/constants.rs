//! Constants for the program loader.
//!
//! Discriminators and account addresses must match what the on-chain loader
//! expects byte for byte.

use solana_pubkey::Pubkey;

// ============================================================================
// Program IDs
// ============================================================================

/// Loader that owns freshly deployed programs (non-upgradeable BPF loader).
pub const BPF_LOADER_ID: Pubkey = solana_sdk_ids::bpf_loader::ID;

/// System Program ID
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk_ids::system_program::ID;

/// Rent Sysvar ID
pub const RENT_SYSVAR_ID: Pubkey = solana_sdk_ids::sysvar::rent::ID;

// ============================================================================
// Instruction Discriminators
// ============================================================================

/// Loader instruction discriminators (4-byte little-endian on the wire)
pub mod instruction {
    pub const WRITE: u32 = 0;
    pub const FINALIZE: u32 = 1;
}

// ============================================================================
// Sizes
// ============================================================================

/// Size of the instruction discriminator in bytes.
pub const DISCRIMINATOR_SIZE: usize = 4;
/// Size of the Write offset field in bytes.
pub const OFFSET_SIZE: usize = 4;
/// Maximum payload bytes per Write instruction on the reference transport.
pub const DEFAULT_CHUNK_LIMIT: usize = 900;
