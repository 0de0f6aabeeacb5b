//! Deployment orchestration: account creation, chunk writes, finalize.
//!
//! A [`Deployer`] pairs a [`LedgerClient`] with a [`RemoteSigner`]. Each call
//! to [`Deployer::start`] or [`Deployer::resume`] yields an independent
//! [`DeploymentRun`] that owns its blob, identity, state and log; runs share
//! nothing mutable and may proceed concurrently.
//!
//! ```rust,ignore
//! let deployer = Deployer::builder(ledger, signer)
//!     .target(DeploymentTarget::Devnet)
//!     .build();
//!
//! let report = deployer.deploy(program_bytes, ProgramIdentity::generate()).await;
//! match report.outcome {
//!     Ok(program) => println!("deployed {}", program.program_id),
//!     Err(failure) if failure.is_partial() => {
//!         println!("resume from {:?}", failure.last_confirmed_offset)
//!     }
//!     Err(failure) => println!("{}", failure),
//! }
//! ```

pub mod log;
pub mod run;
pub mod state;

pub use log::{DeploymentEvent, DeploymentLog, EventContext, EventLevel};
pub use run::{DeployProgress, DeploymentReport, DeploymentRun};
pub use state::{DeployedProgram, DeploymentFailure, DeploymentOutcome, DeploymentState};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use solana_pubkey::Pubkey;

use crate::ledger::LedgerClient;
use crate::network::DeploymentTarget;
use crate::program::constants::{BPF_LOADER_ID, DEFAULT_CHUNK_LIMIT};
use crate::signer::{ProgramIdentity, RemoteSigner};

/// Settings fixed for every run a [`Deployer`] starts.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub target: DeploymentTarget,
    /// Maximum payload bytes per Write instruction.
    pub chunk_limit: usize,
    /// Loader that will own the program account.
    pub loader_id: Pubkey,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target: DeploymentTarget::default(),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            loader_id: BPF_LOADER_ID,
        }
    }
}

/// Stops a run at its next suspension point. Already-confirmed transactions
/// stay on-chain.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Deployer<L, S> {
    pub(crate) ledger: L,
    pub(crate) signer: S,
    pub(crate) config: DeployConfig,
}

impl<L: LedgerClient, S: RemoteSigner> Deployer<L, S> {
    pub fn builder(ledger: L, signer: S) -> DeployerBuilder<L, S> {
        DeployerBuilder {
            ledger,
            signer,
            config: DeployConfig::default(),
        }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// First-time deployment of `blob` under `identity`.
    pub fn start(&self, blob: Vec<u8>, identity: ProgramIdentity) -> DeploymentRun<'_, L, S> {
        DeploymentRun::new(self, blob, identity, None)
    }

    /// Continue a partial deployment: skip account creation and every chunk
    /// below `offset`. `identity` must be the one the account was created with.
    pub fn resume(
        &self,
        blob: Vec<u8>,
        identity: ProgramIdentity,
        offset: u32,
    ) -> DeploymentRun<'_, L, S> {
        DeploymentRun::new(self, blob, identity, Some(offset))
    }

    /// Run a first-time deployment to completion.
    pub async fn deploy(&self, blob: Vec<u8>, identity: ProgramIdentity) -> DeploymentReport {
        self.start(blob, identity).run_to_completion().await
    }
}

pub struct DeployerBuilder<L, S> {
    ledger: L,
    signer: S,
    config: DeployConfig,
}

impl<L: LedgerClient, S: RemoteSigner> DeployerBuilder<L, S> {
    pub fn target(mut self, target: DeploymentTarget) -> Self {
        self.config.target = target;
        self
    }

    pub fn chunk_limit(mut self, limit: usize) -> Self {
        self.config.chunk_limit = limit;
        self
    }

    pub fn loader_id(mut self, loader_id: Pubkey) -> Self {
        self.config.loader_id = loader_id;
        self
    }

    pub fn config(mut self, config: DeployConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Deployer<L, S> {
        Deployer {
            ledger: self.ledger,
            signer: self.signer,
            config: self.config,
        }
    }
}
