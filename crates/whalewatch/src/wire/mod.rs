pub mod rpc;
pub mod ws;
