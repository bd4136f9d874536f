pub mod transaction;

pub use transaction::{LogNotification, TransactionBalances, TransactionDetail, TransactionEvent};
