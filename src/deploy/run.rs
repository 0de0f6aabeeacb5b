//! A single deployment run: the state machine.
//!
//! ```text
//! Idle ─▶ CreatingAccount ─▶ WritingChunks(0) ─▶ … ─▶ WritingChunks(len) ─▶ Finalizing ─▶ Succeeded
//!   └──────────────── any step ───────────────────────────────────────────────────────▶ Failed
//! ```
//!
//! Every [`advance`](DeploymentRun::advance) performs at most one ledger
//! transaction. Writes are strictly sequential: chunk `i + 1` is not signed
//! until chunk `i` is confirmed. Nothing is retried here; a failure stops the
//! run and reports the end of the confirmed prefix.

use futures_util::stream::Stream;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use super::log::{DeploymentEvent, DeploymentLog, EventContext, EventLevel};
use super::state::{DeployedProgram, DeploymentFailure, DeploymentOutcome, DeploymentState};
use super::{CancelHandle, Deployer};
use crate::error::{DeployError, DeployResult};
use crate::ledger::LedgerClient;
use crate::program::{build_create_account_ix, build_finalize_ix, build_write_ix, chunk_blob, Chunk};
use crate::signer::{ProgramIdentity, RemoteSigner};
use crate::transaction::{build_signed_transaction, SignedTransaction};

/// Item of [`DeploymentRun::into_stream`].
#[derive(Debug)]
pub enum DeployProgress {
    Event(DeploymentEvent),
    State(DeploymentState),
    /// Always the last item.
    Finished(DeploymentOutcome),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct DeploymentReport {
    pub outcome: DeploymentOutcome,
    /// Every state the run passed through, starting with `Idle`.
    pub states: Vec<DeploymentState>,
    pub events: Vec<DeploymentEvent>,
}

pub struct DeploymentRun<'a, L, S> {
    deployer: &'a Deployer<L, S>,
    blob: Vec<u8>,
    identity: ProgramIdentity,
    resume_from: Option<u32>,
    chunks: Vec<Chunk>,
    state: DeploymentState,
    history: Vec<DeploymentState>,
    log: DeploymentLog,
    last_confirmed_offset: Option<u32>,
    transactions: usize,
    failure: Option<DeploymentFailure>,
    cancel: CancelHandle,
}

impl<'a, L: LedgerClient, S: RemoteSigner> DeploymentRun<'a, L, S> {
    pub(crate) fn new(
        deployer: &'a Deployer<L, S>,
        blob: Vec<u8>,
        identity: ProgramIdentity,
        resume_from: Option<u32>,
    ) -> Self {
        Self {
            deployer,
            blob,
            identity,
            resume_from,
            chunks: Vec::new(),
            state: DeploymentState::Idle,
            history: vec![DeploymentState::Idle],
            log: DeploymentLog::new(),
            last_confirmed_offset: None,
            transactions: 0,
            failure: None,
            cancel: CancelHandle::default(),
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.identity.pubkey()
    }

    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    pub fn history(&self) -> &[DeploymentState] {
        &self.history
    }

    pub fn log(&self) -> &DeploymentLog {
        &self.log
    }

    pub fn last_confirmed_offset(&self) -> Option<u32> {
        self.last_confirmed_offset
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Perform the next transition. No-op once terminal.
    pub async fn advance(&mut self) -> &DeploymentState {
        if self.state.is_terminal() {
            return &self.state;
        }
        if self.cancel.is_cancelled() {
            self.fail(DeployError::Cancelled);
            return &self.state;
        }

        let step = match self.state.clone() {
            DeploymentState::Idle => self.prepare(),
            DeploymentState::CreatingAccount => self.create_account().await,
            DeploymentState::WritingChunks { next_offset } => self.write_chunk(next_offset).await,
            DeploymentState::Finalizing => self.finalize().await,
            DeploymentState::Succeeded { .. } | DeploymentState::Failed { .. } => Ok(()),
        };
        if let Err(error) = step {
            self.fail(error);
        }
        &self.state
    }

    pub async fn run_to_completion(mut self) -> DeploymentReport {
        while !self.is_finished() {
            self.advance().await;
        }
        self.into_report()
    }

    /// Drive the run lazily, yielding events and state changes as they
    /// happen. Dropping the stream stops the run before its next submission.
    pub fn into_stream(mut self) -> impl Stream<Item = DeployProgress> + 'a {
        async_stream::stream! {
            let mut seen_events = 0;
            let mut seen_states = 1;

            while !self.is_finished() {
                self.advance().await;

                let events = self.log.skip(seen_events).to_vec();
                seen_events += events.len();
                for event in events {
                    yield DeployProgress::Event(event);
                }

                let states = self.history[seen_states..].to_vec();
                seen_states += states.len();
                for state in states {
                    yield DeployProgress::State(state);
                }
            }

            yield DeployProgress::Finished(self.into_report().outcome);
        }
    }

    /// Finish the run. A run stopped before reaching a terminal state is
    /// failed as cancelled first, so its log ends with the failure.
    pub fn into_report(mut self) -> DeploymentReport {
        if !self.is_finished() {
            self.fail(DeployError::Cancelled);
        }

        let outcome = match self.failure.take() {
            Some(failure) => Err(failure),
            None => {
                let program_id = self.program_id();
                Ok(DeployedProgram {
                    program_id,
                    explorer_url: self.deployer.config.target.explorer_address_url(&program_id),
                    transactions: self.transactions,
                })
            }
        };

        DeploymentReport {
            outcome,
            states: self.history,
            events: self.log.into_events(),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────

    fn prepare(&mut self) -> DeployResult<()> {
        let config = &self.deployer.config;
        self.chunks = chunk_blob(&self.blob, config.chunk_limit)?;

        let message = format!(
            "Deploying {} bytes to {} as {} in {} chunk(s) of up to {} bytes",
            self.blob.len(),
            config.target,
            self.program_id(),
            self.chunks.len(),
            config.chunk_limit
        );
        self.record(EventLevel::Info, message, EventContext::default());

        match self.resume_from {
            None => self.transition(DeploymentState::CreatingAccount),
            Some(offset) => {
                let len = self.blob_len();
                if offset != len && self.chunk_index(offset).is_none() {
                    return Err(DeployError::invalid(format!(
                        "resume offset {} is not a chunk boundary of a {}-byte blob",
                        offset, len
                    )));
                }
                self.last_confirmed_offset = Some(offset);
                self.record(
                    EventLevel::Info,
                    format!("Resuming at offset {}; skipping account creation", offset),
                    EventContext::at_offset(Some(offset)),
                );
                self.transition(DeploymentState::WritingChunks { next_offset: offset });
            }
        }
        Ok(())
    }

    async fn create_account(&mut self) -> DeployResult<()> {
        let deployer = self.deployer;
        let space = self.blob.len();

        self.record(
            EventLevel::Info,
            format!("Querying rent-exempt minimum for {} bytes", space),
            EventContext::default(),
        );
        let lamports = deployer.ledger.minimum_balance_for_rent_exemption(space).await?;
        self.record(
            EventLevel::Info,
            format!("Rent-exempt minimum is {} lamports", lamports),
            EventContext::default(),
        );

        let ix = build_create_account_ix(
            &deployer.signer.fee_payer(),
            &self.program_id(),
            lamports,
            space as u64,
            &deployer.config.loader_id,
        );
        self.execute(&[ix], "program account creation", None).await?;

        self.last_confirmed_offset = Some(0);
        self.transition(DeploymentState::WritingChunks { next_offset: 0 });
        Ok(())
    }

    async fn write_chunk(&mut self, offset: u32) -> DeployResult<()> {
        let len = self.blob_len();
        if offset >= len {
            self.record(
                EventLevel::Info,
                format!("All {} bytes written", len),
                EventContext::at_offset(Some(len)),
            );
            self.transition(DeploymentState::Finalizing);
            return Ok(());
        }

        let index = self
            .chunk_index(offset)
            .ok_or_else(|| DeployError::invalid(format!("no chunk starts at offset {}", offset)))?;
        let chunk = &self.chunks[index];
        let ix = build_write_ix(&self.program_id(), chunk, &self.deployer.config.loader_id);
        let end = chunk.end();
        let label = format!(
            "chunk {}/{} ({} bytes at offset {})",
            index + 1,
            self.chunks.len(),
            chunk.bytes.len(),
            offset
        );

        self.execute(&[ix], &label, Some(offset)).await?;

        self.last_confirmed_offset = Some(end);
        self.transition(DeploymentState::WritingChunks { next_offset: end });
        Ok(())
    }

    async fn finalize(&mut self) -> DeployResult<()> {
        let program_id = self.program_id();
        let ix = build_finalize_ix(&program_id, &self.deployer.config.loader_id);
        self.execute(&[ix], "finalize", Some(self.blob_len())).await?;

        let url = self.deployer.config.target.explorer_address_url(&program_id);
        self.record(
            EventLevel::Info,
            format!("Program {} deployed", program_id),
            EventContext::default().with_explorer_url(url),
        );
        self.transition(DeploymentState::Succeeded { program_id });
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Sign, submit, and confirm one transaction, logging around each call.
    async fn execute(
        &mut self,
        instructions: &[Instruction],
        label: &str,
        offset: Option<u32>,
    ) -> DeployResult<Signature> {
        let deployer = self.deployer;
        let fee_payer = deployer.signer.fee_payer();

        self.record(
            EventLevel::Info,
            format!("Fetching recent blockhash for {}", label),
            EventContext::at_offset(offset),
        );
        let blockhash = deployer.ledger.latest_blockhash().await?;
        self.record(
            EventLevel::Info,
            format!("Requesting signature for {}", label),
            EventContext::at_offset(offset),
        );
        let signed = build_signed_transaction(
            instructions,
            &fee_payer,
            &[self.identity.keypair()],
            blockhash,
            &deployer.signer,
        )
        .await?;

        let expected = signed.signature();
        let signature = match signed {
            SignedTransaction::Ready(tx) => {
                if self.cancel.is_cancelled() {
                    return Err(DeployError::Cancelled);
                }
                self.record(
                    EventLevel::Info,
                    format!("Submitting {}", label),
                    EventContext::at_offset(offset),
                );
                let returned = deployer.ledger.submit(&tx).await?;
                if returned != expected {
                    self.record(
                        EventLevel::Warn,
                        format!(
                            "Ledger reported {} for {}, expected fee-payer signature {}; confirming the reported one",
                            returned, label, expected
                        ),
                        EventContext::at_offset(offset),
                    );
                }
                returned
            }
            SignedTransaction::Broadcast(signature) => signature,
        };
        self.transactions += 1;

        let url = deployer.config.target.explorer_tx_url(&signature);
        self.record(
            EventLevel::Info,
            format!("Submitted {}; awaiting confirmation", label),
            EventContext::at_offset(offset).with_transaction(signature, url.clone()),
        );
        deployer.ledger.confirm(&signature).await?;
        self.record(
            EventLevel::Info,
            format!("Confirmed {}", label),
            EventContext::at_offset(offset).with_transaction(signature, url),
        );
        Ok(signature)
    }

    fn fail(&mut self, error: DeployError) {
        let len = self.blob_len();
        let context = EventContext::at_offset(self.last_confirmed_offset);

        self.record(
            EventLevel::Error,
            format!("{} failed: {}", self.state, error),
            context.clone(),
        );
        let summary = match self.last_confirmed_offset {
            None => "Deployment failed before the program account was confirmed".to_string(),
            Some(offset) if offset >= len => format!(
                "Deployment failed after all {} bytes were written; account {} is not executable",
                len,
                self.program_id()
            ),
            Some(offset) => format!(
                "Deployment failed with {} of {} bytes confirmed; resume {} from offset {}",
                offset,
                len,
                self.program_id(),
                offset
            ),
        };
        self.record(EventLevel::Error, summary, context);

        self.transition(DeploymentState::Failed {
            reason: error.to_string(),
            last_confirmed_offset: self.last_confirmed_offset,
        });
        self.failure = Some(DeploymentFailure {
            program_id: self.program_id(),
            error,
            last_confirmed_offset: self.last_confirmed_offset,
            blob_len: len,
        });
    }

    fn transition(&mut self, next: DeploymentState) {
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next.clone();
        self.history.push(next);
    }

    fn record(&mut self, level: EventLevel, message: impl Into<String>, context: EventContext) {
        self.log.record(level, message, context);
    }

    fn chunk_index(&self, offset: u32) -> Option<usize> {
        self.chunks.binary_search_by_key(&offset, |c| c.offset).ok()
    }

    /// Blob length as a loader offset; `chunk_blob` rejects anything larger.
    fn blob_len(&self) -> u32 {
        u32::try_from(self.blob.len()).unwrap_or(u32::MAX)
    }
}
