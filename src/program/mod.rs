//! Program loader interaction: chunking and instruction encoding.
//!
//! Everything here is pure; no network access.

pub mod chunk;
pub mod constants;
pub mod instructions;

pub use chunk::{chunk_blob, Chunk};
pub use constants::*;
pub use instructions::{
    build_create_account_ix, build_finalize_ix, build_write_ix, LoaderInstruction,
};
