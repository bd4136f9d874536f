use super::LedgerClient;
use crate::core::types::TransactionDetail;

use std::time::Duration;

use log::{error, warn};
use solana_sdk::signature::Signature;

pub const DEFAULT_RESOLVE_RETRIES: u8 = 5;
pub const DEFAULT_RESOLVE_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Resolves a signature into transaction detail, tolerating the RPC's
/// eventual consistency with a fixed-delay bounded retry. The delay is
/// constant across attempts; failed lookups and not-found responses share
/// the same budget. Returns `None` once the budget is exhausted.
pub async fn get_transaction_detail_with_retry(
    client: &dyn LedgerClient,
    signature: &Signature,
    retries: u8,
    delay: Duration,
) -> Option<TransactionDetail> {
    for attempt in 1..=retries {
        match client.get_transaction_detail(signature).await {
            Ok(Some(detail)) => return Some(detail),
            Ok(None) => warn!(
                "Transaction {} not found yet. Retry #{}/{} - waiting {}ms",
                signature,
                attempt,
                retries,
                delay.as_millis()
            ),
            Err(e) => error!(
                "Error fetching transaction {} (attempt {}): {}",
                signature, attempt, e
            ),
        }
        tokio::time::sleep(delay).await;
    }

    error!(
        "Transaction {} not found after {} retries",
        signature, retries
    );
    None
}
