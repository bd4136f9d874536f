pub mod dedup;
pub mod transfer;
pub mod types;

pub type JoinHandleResult<E> = tokio::task::JoinHandle<std::result::Result<(), E>>;
