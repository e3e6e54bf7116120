//! JSON-RPC ledger client.
//!
//! Speaks the standard HTTP JSON-RPC dialect: `getAccountInfo`,
//! `getLatestBlockhash`, `sendTransaction` and `getSignatureStatuses`.
//! Any error object returned for `sendTransaction` is a rejection of the
//! submission; for every other method it is a transport failure. Status
//! polling only asks for recent statuses; reconciliation searches history.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tracing::{debug, warn};

use super::{Commitment, LedgerClient, SignatureStatus};
use crate::config::ClientConfig;
use crate::errors::LedgerError;

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct UiAccount {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiSignatureStatus {
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

enum CallError {
    Http(String),
    Rpc {
        code: i64,
        message: String,
        logs: Vec<String>,
    },
}

impl CallError {
    fn into_transport(self) -> LedgerError {
        match self {
            CallError::Http(message) => LedgerError::Transport(message),
            CallError::Rpc { code, message, .. } => {
                LedgerError::Transport(format!("rpc error {code}: {message}"))
            }
        }
    }
}

/// Ledger client over HTTP JSON-RPC.
pub struct RpcLedger {
    http: Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(
        url: impl Into<String>,
        commitment: Commitment,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, LedgerError> {
        Self::new(
            config.rpc_url.clone(),
            config.commitment,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallError::Http(format!(
                "{method} returned HTTP {}",
                response.status()
            )));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| CallError::Http(format!("invalid {method} response: {e}")))?;

        parsed.into_result(method)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        search_history: bool,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let statuses: WithContext<Vec<Option<UiSignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                signature_status_params(signature, search_history),
            )
            .await
            .map_err(CallError::into_transport)?;

        Ok(first_status(statuses.value))
    }
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T, CallError> {
        if let Some(error) = self.error {
            let logs = error
                .data
                .as_ref()
                .and_then(|d| d.get("logs"))
                .and_then(|l| l.as_array())
                .map(|lines| {
                    lines
                        .iter()
                        .filter_map(|line| line.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            return Err(CallError::Rpc {
                code: error.code,
                message: error.message,
                logs,
            });
        }

        self.result
            .ok_or_else(|| CallError::Http(format!("{method} response has no result")))
    }
}

fn signature_status_params(signature: &Signature, search_history: bool) -> Value {
    json!([[signature.to_string()], { "searchTransactionHistory": search_history }])
}

fn account_data(account: Option<UiAccount>) -> Result<Option<Vec<u8>>, LedgerError> {
    let Some(UiAccount {
        data: (payload, encoding),
    }) = account
    else {
        return Ok(None);
    };
    if encoding != "base64" {
        return Err(LedgerError::Transport(format!(
            "unexpected account encoding {encoding}"
        )));
    }
    BASE64_STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|e| LedgerError::Transport(format!("invalid base64 account data: {e}")))
}

fn first_status(statuses: Vec<Option<UiSignatureStatus>>) -> Option<SignatureStatus> {
    statuses
        .into_iter()
        .next()
        .flatten()
        .map(|status| match status.err {
            Some(err) => SignatureStatus::Failed(err.to_string()),
            None => SignatureStatus::Landed(
                status.confirmation_status.unwrap_or(Commitment::Processed),
            ),
        })
}

/// An error object on `sendTransaction` is the node refusing the submission.
fn send_error(err: CallError) -> LedgerError {
    match err {
        CallError::Rpc {
            code,
            message,
            logs,
        } => {
            warn!(code, %message, "transaction rejected");
            LedgerError::Rejected { message, logs }
        }
        other => other.into_transport(),
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let params = json!([
            address.to_string(),
            { "encoding": "base64", "commitment": self.commitment.as_str() }
        ]);
        let account: WithContext<Option<UiAccount>> = self
            .call("getAccountInfo", params)
            .await
            .map_err(CallError::into_transport)?;

        account_data(account.value)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let params = json!([{ "commitment": self.commitment.as_str() }]);
        let latest: WithContext<BlockhashValue> = self
            .call("getLatestBlockhash", params)
            .await
            .map_err(CallError::into_transport)?;

        Hash::from_str(&latest.value.blockhash)
            .map_err(|e| LedgerError::Transport(format!("invalid blockhash: {e}")))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        let wire = bincode::serialize(transaction)
            .map_err(|e| LedgerError::Transport(format!("failed to serialize transaction: {e}")))?;
        let params = json!([
            BASE64_STANDARD.encode(wire),
            { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
        ]);

        let signature: String = self
            .call("sendTransaction", params)
            .await
            .map_err(send_error)?;

        Signature::from_str(&signature)
            .map_err(|e| LedgerError::Transport(format!("invalid signature in response: {e}")))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.signature_status(signature, false).await
    }

    async fn get_signature_status_with_history(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.signature_status(signature, true).await
    }
}
