//! # custody-deploy
//!
//! Deploy Solana programs whose fee payer lives behind a remote custody signer.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Chunking, loader instruction encoding, network targets, errors (no I/O)
//! 2. **Capabilities**: `LedgerClient` and `RemoteSigner` traits the orchestrator runs against
//! 3. **Transports**: Custody signer over HTTP (`http`), RPC ledger client (`solana-rpc`)
//! 4. **Orchestrator**: `Deployer` and the per-run `DeploymentRun` state machine
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use custody_deploy::prelude::*;
//!
//! let ledger = RpcLedgerClient::new(&DeploymentTarget::Devnet);
//! let signer = CustodySigner::new(CustodySignerConfig::new(
//!     "https://custody.example.com",
//!     &api_token,
//!     "vault-id",
//!     fee_payer,
//! ))?;
//!
//! let deployer = Deployer::builder(ledger, signer)
//!     .target(DeploymentTarget::Devnet)
//!     .build();
//!
//! let run = deployer.start(std::fs::read("program.so")?, ProgramIdentity::generate());
//! let progress = run.into_stream();
//! futures_util::pin_mut!(progress);
//! while let Some(item) = progress.next().await {
//!     match item {
//!         DeployProgress::Event(event) => println!("[{}] {}", event.sequence, event.message),
//!         DeployProgress::State(_) => {}
//!         DeployProgress::Finished(outcome) => println!("{:?}", outcome),
//!     }
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Loader interaction: chunking, constants, instruction builders.
pub mod program;

/// Unified error types.
pub mod error;

/// Cluster selection and explorer URLs.
pub mod network;

/// Transaction assembly: local co-signing + remote fee-payer signature.
pub mod transaction;

// ── Layer 2: Capabilities ────────────────────────────────────────────────────

/// Ledger access used by the orchestrator.
pub mod ledger;

/// Fee-payer signing and program identities.
pub mod signer;

// ── Layer 3: Transports ──────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: Orchestrator ────────────────────────────────────────────────────

/// `Deployer`, runs, states, and the event log.
pub mod deploy;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Core
    pub use crate::error::{DeployError, HttpError, LedgerError, SigningError};
    pub use crate::network::DeploymentTarget;
    pub use crate::program::{
        build_create_account_ix, build_finalize_ix, build_write_ix, chunk_blob, Chunk,
        LoaderInstruction, BPF_LOADER_ID, DEFAULT_CHUNK_LIMIT, RENT_SYSVAR_ID,
    };
    pub use crate::transaction::{build_signed_transaction, SignedTransaction};

    // Capabilities
    pub use crate::ledger::LedgerClient;
    pub use crate::signer::{KeypairSigner, ProgramIdentity, RemoteSignature, RemoteSigner};

    // Transports
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
    #[cfg(feature = "solana-rpc")]
    pub use crate::ledger::{RpcLedgerClient, RpcLedgerConfig};
    #[cfg(feature = "http")]
    pub use crate::signer::custody::{CustodySigner, CustodySignerConfig};

    // Orchestrator
    pub use crate::deploy::{
        CancelHandle, DeployConfig, DeployProgress, DeployedProgram, Deployer, DeployerBuilder,
        DeploymentEvent, DeploymentFailure, DeploymentOutcome, DeploymentReport, DeploymentRun,
        DeploymentState, EventLevel,
    };
}
