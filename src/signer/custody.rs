//! Custody signer: fee-payer signatures from a remote custody service.
//!
//! The fee-payer key lives in a vault behind the service. Each transaction
//! becomes a signing request that the service's policy engine (and possibly
//! a human approver) must accept:
//!
//! 1. `POST /api/v1/signing-requests` with the partially signed transaction.
//! 2. Poll `GET /api/v1/signing-requests/{id}` until the request reaches a
//!    terminal state.
//!
//! Depending on [`CustodySignerConfig::broadcast`], the service either returns
//! the signed transaction or broadcasts it and returns the signature.

use std::str::FromStr;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

use super::{RemoteSignature, RemoteSigner};
use crate::error::{HttpError, SigningError};
use crate::http::CustodyHttp;

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSigningRequest {
    pub vault_id: String,
    pub base64_tx: String,
    /// Ask the service to broadcast after signing.
    #[serde(default)]
    pub broadcast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningRequestState {
    Pending,
    WaitingApproval,
    Signed,
    Submitted,
    Rejected,
    Failed,
}

impl SigningRequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::WaitingApproval)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningRequest {
    pub id: String,
    pub state: SigningRequestState,
    /// Base64 bincode transaction, present once `signed`.
    #[serde(default)]
    pub signed_tx: Option<String>,
    /// Base58 signature, present once `submitted`.
    #[serde(default)]
    pub hash: Option<String>,
    /// Policy or approver message on `rejected` / `failed`.
    #[serde(default)]
    pub reason: Option<String>,
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Explicit configuration for the custody signer. Nothing is read from the
/// process environment.
#[derive(Debug, Clone)]
pub struct CustodySignerConfig {
    pub base_url: String,
    pub api_token: String,
    pub vault_id: String,
    /// Vault address paying fees.
    pub fee_payer: Pubkey,
    /// Let the service broadcast instead of returning the signed transaction.
    pub broadcast: bool,
    pub poll_interval: Duration,
    /// How long to wait for approval. `None` waits until the future is dropped.
    pub approval_timeout: Option<Duration>,
    /// Per-HTTP-request timeout.
    pub request_timeout: Duration,
}

impl CustodySignerConfig {
    pub fn new(base_url: &str, api_token: &str, vault_id: &str, fee_payer: Pubkey) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_token: api_token.to_string(),
            vault_id: vault_id.to_string(),
            fee_payer,
            broadcast: false,
            poll_interval: Duration::from_secs(2),
            approval_timeout: Some(Duration::from_secs(600)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

// ─── Signer ──────────────────────────────────────────────────────────────────

pub struct CustodySigner {
    http: CustodyHttp,
    config: CustodySignerConfig,
}

impl CustodySigner {
    pub fn new(config: CustodySignerConfig) -> Result<Self, HttpError> {
        let http = CustodyHttp::new(&config.base_url, &config.api_token, config.request_timeout)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CustodySignerConfig {
        &self.config
    }

    async fn wait_for_terminal(&self, mut request: SigningRequest) -> Result<SigningRequest, SigningError> {
        let started = Instant::now();

        while !request.state.is_terminal() {
            if let Some(limit) = self.config.approval_timeout {
                if started.elapsed() >= limit {
                    return Err(SigningError::Timeout {
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
            }
            futures_timer::Delay::new(self.config.poll_interval).await;
            request = self.http.get_signing_request(&request.id).await?;
            tracing::debug!(id = %request.id, state = ?request.state, "Polled signing request");
        }

        Ok(request)
    }
}

impl RemoteSigner for CustodySigner {
    fn fee_payer(&self) -> Pubkey {
        self.config.fee_payer
    }

    async fn sign_and_submit_or_return(
        &self,
        transaction: Transaction,
    ) -> Result<RemoteSignature, SigningError> {
        let body = CreateSigningRequest {
            vault_id: self.config.vault_id.clone(),
            base64_tx: encode_transaction(&transaction)?,
            broadcast: self.config.broadcast,
        };

        let created = self.http.create_signing_request(&body).await?;
        tracing::info!(
            id = %created.id,
            vault = %self.config.vault_id,
            service = %self.http.base_url(),
            "Signing request created"
        );

        let done = self.wait_for_terminal(created).await?;
        into_remote_signature(done)
    }
}

fn into_remote_signature(request: SigningRequest) -> Result<RemoteSignature, SigningError> {
    match request.state {
        SigningRequestState::Signed => {
            let encoded = request
                .signed_tx
                .ok_or_else(|| SigningError::Encoding("signed request without signed_tx".into()))?;
            Ok(RemoteSignature::Signed(decode_transaction(&encoded)?))
        }
        SigningRequestState::Submitted => {
            let hash = request
                .hash
                .ok_or_else(|| SigningError::Encoding("submitted request without hash".into()))?;
            let signature = Signature::from_str(&hash)
                .map_err(|e| SigningError::Encoding(format!("bad signature {}: {}", hash, e)))?;
            Ok(RemoteSignature::Submitted(signature))
        }
        SigningRequestState::Rejected | SigningRequestState::Failed => Err(SigningError::Rejected(
            request.reason.unwrap_or_else(|| format!("{:?}", request.state)),
        )),
        SigningRequestState::Pending | SigningRequestState::WaitingApproval => {
            Err(SigningError::Rejected("signing request still pending".into()))
        }
    }
}

pub fn encode_transaction(transaction: &Transaction) -> Result<String, SigningError> {
    let bytes = bincode::serialize(transaction).map_err(|e| SigningError::Encoding(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

pub fn decode_transaction(encoded: &str) -> Result<Transaction, SigningError> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| SigningError::Encoding(e.to_string()))?;
    bincode::deserialize(&bytes).map_err(|e| SigningError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_hash::Hash;
    use solana_instruction::{AccountMeta, Instruction};

    fn sample_tx() -> Transaction {
        let payer = Pubkey::new_unique();
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(payer, true)],
            data: vec![1, 2, 3],
        };
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        tx.message.recent_blockhash = Hash::default();
        tx
    }

    #[test]
    fn test_transaction_survives_base64_transport() {
        let tx = sample_tx();
        let back = decode_transaction(&encode_transaction(&tx).unwrap()).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_signing_request_deserialize() {
        let json = r#"{"id": "req_1", "state": "waiting_approval"}"#;
        let req: SigningRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.state, SigningRequestState::WaitingApproval);
        assert!(!req.state.is_terminal());
        assert!(req.signed_tx.is_none());
    }

    #[test]
    fn test_submitted_maps_to_signature() {
        let sig = Signature::from([7u8; 64]);
        let req = SigningRequest {
            id: "req_2".into(),
            state: SigningRequestState::Submitted,
            signed_tx: None,
            hash: Some(sig.to_string()),
            reason: None,
        };
        match into_remote_signature(req).unwrap() {
            RemoteSignature::Submitted(s) => assert_eq!(s, sig),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejection_carries_reason() {
        let req = SigningRequest {
            id: "req_3".into(),
            state: SigningRequestState::Rejected,
            signed_tx: None,
            hash: None,
            reason: Some("velocity limit exceeded".into()),
        };
        let err = into_remote_signature(req).unwrap_err();
        assert!(matches!(err, SigningError::Rejected(ref r) if r == "velocity limit exceeded"));
    }

    #[test]
    fn test_create_request_serialize() {
        let body = CreateSigningRequest {
            vault_id: "vault-9".into(),
            base64_tx: "AAA=".into(),
            broadcast: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["vault_id"], "vault-9");
        assert_eq!(json["broadcast"], true);
    }

    // ── Signing flow against a local service ─────────────────────────────

    use serde_json::json;
    use solana_keypair::Keypair;
    use solana_signer::Signer;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serve `pending` for the create call and `poll_reply` for every poll.
    /// Returns the base URL and the raw requests received.
    async fn custody_service(poll_reply: serde_json::Value) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let body = if request.starts_with("POST") {
                    json!({"id": "req_1", "state": "pending"})
                } else {
                    poll_reply.clone()
                }
                .to_string();
                seen.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), requests)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .filter_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().unwrap_or(0))
                    })
                    .next()
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn signer_for(base_url: &str, fee_payer: Pubkey) -> CustodySigner {
        let mut config = CustodySignerConfig::new(base_url, "test-token", "vault-1", fee_payer);
        config.poll_interval = Duration::from_millis(20);
        config.approval_timeout = Some(Duration::from_millis(300));
        config.request_timeout = Duration::from_secs(5);
        CustodySigner::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_pending_approval_times_out() {
        let (url, requests) =
            custody_service(json!({"id": "req_1", "state": "waiting_approval"})).await;
        let signer = signer_for(&url, Pubkey::new_unique());

        let err = signer
            .sign_and_submit_or_return(sample_tx())
            .await
            .unwrap_err();

        match err {
            SigningError::Timeout { waited_ms } => assert!(waited_ms >= 300),
            other => panic!("expected timeout, got {:?}", other),
        }

        let requests = requests.lock().unwrap().clone();
        assert!(requests[0].starts_with("POST /api/v1/signing-requests "));
        assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer test-token"));
        assert!(requests[0].contains("\"vault_id\":\"vault-1\""));
        assert!(requests[1..]
            .iter()
            .all(|r| r.starts_with("GET /api/v1/signing-requests/req_1 ")));
        assert!(requests.len() > 2);
    }

    #[tokio::test]
    async fn test_rejection_reason_is_returned() {
        let (url, _) = custody_service(json!({
            "id": "req_1",
            "state": "rejected",
            "reason": "velocity limit exceeded"
        }))
        .await;
        let signer = signer_for(&url, Pubkey::new_unique());

        let err = signer
            .sign_and_submit_or_return(sample_tx())
            .await
            .unwrap_err();

        assert!(matches!(err, SigningError::Rejected(ref r) if r == "velocity limit exceeded"));
    }

    #[tokio::test]
    async fn test_signed_transaction_is_returned() {
        let payer = Keypair::new();
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(payer.pubkey(), true)],
            data: vec![9],
        };
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer.pubkey()));
        let signers = [&payer];
        tx.try_sign(&signers[..], Hash::new_from_array([4u8; 32]))
            .unwrap();

        let (url, _) = custody_service(json!({
            "id": "req_1",
            "state": "signed",
            "signed_tx": encode_transaction(&tx).unwrap()
        }))
        .await;
        let signer = signer_for(&url, payer.pubkey());

        match signer.sign_and_submit_or_return(tx.clone()).await.unwrap() {
            RemoteSignature::Signed(signed) => assert_eq!(signed, tx),
            other => panic!("unexpected {:?}", other),
        }
    }
}
