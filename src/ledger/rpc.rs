//! RPC-backed ledger client over `solana-client`.

use std::time::{Duration, Instant};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_hash::Hash;
use solana_signature::Signature;
use solana_transaction::Transaction;

use super::LedgerClient;
use crate::error::LedgerError;
use crate::network::DeploymentTarget;

/// Confirmation policy for [`RpcLedgerClient`].
#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub commitment: CommitmentConfig,
    pub poll_interval: Duration,
    /// Give up waiting for confirmation after this long. `None` polls forever.
    pub confirm_timeout: Option<Duration>,
}

impl Default for RpcLedgerConfig {
    fn default() -> Self {
        Self {
            commitment: CommitmentConfig::confirmed(),
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Some(Duration::from_secs(90)),
        }
    }
}

/// [`LedgerClient`] talking JSON-RPC to a cluster.
pub struct RpcLedgerClient {
    /// RPC client for Solana
    pub rpc_client: RpcClient,
    config: RpcLedgerConfig,
}

impl RpcLedgerClient {
    pub fn new(target: &DeploymentTarget) -> Self {
        Self::with_config(target, RpcLedgerConfig::default())
    }

    pub fn with_config(target: &DeploymentTarget, config: RpcLedgerConfig) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(target.rpc_url().to_string(), config.commitment),
            config,
        }
    }

    /// Wrap an existing RpcClient.
    pub fn from_rpc_client(rpc_client: RpcClient, config: RpcLedgerConfig) -> Self {
        Self { rpc_client, config }
    }
}

impl LedgerClient for RpcLedgerClient {
    async fn minimum_balance_for_rent_exemption(&self, space: usize) -> Result<u64, LedgerError> {
        self.rpc_client
            .get_minimum_balance_for_rent_exemption(space)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.rpc_client
            .send_transaction(transaction)
            .await
            .map_err(|e| LedgerError::Submission(e.to_string()))
    }

    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError> {
        let started = Instant::now();

        loop {
            let status = self
                .rpc_client
                .get_signature_status_with_commitment(signature, self.config.commitment)
                .await
                .map_err(|e| LedgerError::Rpc(e.to_string()))?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => {
                    return Err(LedgerError::Confirmation {
                        signature: *signature,
                        reason: err.to_string(),
                    })
                }
                None => {}
            }

            if let Some(limit) = self.config.confirm_timeout {
                if started.elapsed() >= limit {
                    return Err(LedgerError::ConfirmationTimeout {
                        signature: *signature,
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
