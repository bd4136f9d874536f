use serde::Serialize;
use solana_sdk::signature::Signature;
use solana_sdk::slot_history::Slot;
use solana_sdk::transaction::TransactionError;
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;

/// A raw entry from the log subscription. Transient; only the signature and
/// the error flag are ever inspected.
#[derive(Debug, Clone)]
pub struct LogNotification {
    pub signature: String,
    pub err: Option<TransactionError>,
}

/// Per-account lamport balances before and after a transaction. The two
/// sequences share indices; entry `i` belongs to the transaction's account `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionBalances {
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
}

/// Resolved detail for a single confirmed transaction, fetched on demand and
/// consumed once by the transfer computation.
#[derive(Debug, Clone)]
pub struct TransactionDetail {
    /// The transaction signature
    pub signature: Signature,
    /// Balance deltas from the transaction meta, if the meta was present
    pub balances: Option<TransactionBalances>,
    /// Unix timestamp of the block containing the transaction
    pub block_time: Option<i64>,
    /// The slot corresponding to this transaction's entry
    pub slot: Slot,
}

impl TransactionDetail {
    pub fn from_encoded(
        signature: Signature,
        encoded: EncodedConfirmedTransactionWithStatusMeta,
    ) -> Self {
        let balances = encoded.transaction.meta.map(|meta| TransactionBalances {
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
        });
        TransactionDetail {
            signature,
            balances,
            block_time: encoded.block_time,
            slot: encoded.slot,
        }
    }
}

/// The payload pushed to the observer for a transfer that passed the filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub signature: String,
    pub sol_amount: f64,
    pub block_time: Option<i64>,
    pub slot: Slot,
}

impl TransactionEvent {
    pub fn new(detail: &TransactionDetail, sol_amount: f64) -> Self {
        TransactionEvent {
            signature: detail.signature.to_string(),
            sol_amount,
            block_time: detail.block_time,
            slot: detail.slot,
        }
    }
}
