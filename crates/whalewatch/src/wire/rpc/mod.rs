pub mod resolve;
pub mod subscribe_logs;

use crate::core::types::TransactionDetail;
use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;

/// Point-lookup seam against the ledger RPC. The watch pipeline only ever
/// needs this one call, so tests stub it directly.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetches resolved detail for a signature. `Ok(None)` means the
    /// transaction is not visible at the requested commitment yet; `Err`
    /// means the lookup itself failed. Callers treat both the same way.
    async fn get_transaction_detail(
        &self,
        signature: &Signature,
    ) -> anyhow::Result<Option<TransactionDetail>>;
}

pub struct RpcLedgerClient {
    rpc: Arc<RpcClient>,
}

impl RpcLedgerClient {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        RpcLedgerClient { rpc }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_transaction_detail(
        &self,
        signature: &Signature,
    ) -> anyhow::Result<Option<TransactionDetail>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::finalized()),
            max_supported_transaction_version: Some(0),
        };
        // A not-yet-visible signature surfaces as an error from the typed
        // client; the resolver retries errors and None identically.
        let encoded = self
            .rpc
            .get_transaction_with_config(signature, config)
            .await?;
        Ok(Some(TransactionDetail::from_encoded(*signature, encoded)))
    }
}
