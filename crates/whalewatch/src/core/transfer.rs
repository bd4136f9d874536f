use crate::core::types::{TransactionBalances, TransactionDetail};

use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Sum of the strictly positive per-account balance deltas, i.e. the total
/// lamports received across all accounts touched by the transaction. Senders'
/// negative deltas are ignored. Mismatched balance sequences yield 0.
pub fn net_transfer_lamports(balances: &TransactionBalances) -> u64 {
    if balances.pre_balances.len() != balances.post_balances.len() {
        return 0;
    }
    balances
        .pre_balances
        .iter()
        .zip(balances.post_balances.iter())
        .filter_map(|(pre, post)| post.checked_sub(*pre))
        .sum()
}

/// Net positive transfer for a transaction, in SOL. Absent balance data
/// yields 0.0.
pub fn net_transfer_sol(detail: &TransactionDetail) -> f64 {
    match &detail.balances {
        Some(balances) => net_transfer_lamports(balances) as f64 / LAMPORTS_PER_SOL as f64,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signature;

    fn detail_with_balances(pre: Vec<u64>, post: Vec<u64>) -> TransactionDetail {
        TransactionDetail {
            signature: Signature::default(),
            balances: Some(TransactionBalances {
                pre_balances: pre,
                post_balances: post,
            }),
            block_time: Some(1_700_000_000),
            slot: 250_000_000,
        }
    }

    #[test]
    fn sums_only_positive_deltas() {
        // One sender losing 150, two receivers gaining 100 and 50.
        let balances = TransactionBalances {
            pre_balances: vec![1_000, 500, 0],
            post_balances: vec![850, 600, 50],
        };
        assert_eq!(net_transfer_lamports(&balances), 150);
    }

    #[test]
    fn unchanged_balances_contribute_nothing() {
        let balances = TransactionBalances {
            pre_balances: vec![1_000, 2_000],
            post_balances: vec![1_000, 2_000],
        };
        assert_eq!(net_transfer_lamports(&balances), 0);
    }

    #[test]
    fn mismatched_lengths_yield_zero() {
        let balances = TransactionBalances {
            pre_balances: vec![1_000, 2_000],
            post_balances: vec![1_000],
        };
        assert_eq!(net_transfer_lamports(&balances), 0);
    }

    #[test]
    fn missing_balances_yield_zero() {
        let detail = TransactionDetail {
            signature: Signature::default(),
            balances: None,
            block_time: None,
            slot: 0,
        };
        assert_eq!(net_transfer_sol(&detail), 0.0);
    }

    #[test]
    fn converts_lamports_to_sol() {
        let detail = detail_with_balances(vec![1_000, 2_000], vec![1_000, 2_051]);
        assert_eq!(net_transfer_sol(&detail), 51.0 / LAMPORTS_PER_SOL as f64);
    }

    #[test]
    fn whole_sol_transfer() {
        let detail = detail_with_balances(
            vec![5 * LAMPORTS_PER_SOL, 0],
            vec![4 * LAMPORTS_PER_SOL, LAMPORTS_PER_SOL],
        );
        assert_eq!(net_transfer_sol(&detail), 1.0);
    }
}
