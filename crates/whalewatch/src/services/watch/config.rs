use crate::core::dedup::DEFAULT_SIGNATURE_WINDOW;
use crate::wire::rpc::resolve::{DEFAULT_RESOLVE_RETRIES, DEFAULT_RESOLVE_RETRY_DELAY};
use crate::wire::rpc::subscribe_logs::DEFAULT_RECONNECT_AFTER;

use envconfig::Envconfig;

const DEFAULT_THRESHOLD_SOL: f64 = 100.0;

#[derive(Clone, Debug, Envconfig)]
pub struct WatchConfig {
    /// The SOL threshold reported to observers before the first start command
    #[envconfig(from = "WW_THRESHOLD_SOL", default = "100")]
    pub default_threshold_sol: f64,

    /// How many times to attempt a detail lookup for one signature
    #[envconfig(from = "WW_RESOLVE_RETRIES", default = "5")]
    pub resolve_retries: u8,

    /// Fixed delay between lookup attempts
    #[envconfig(from = "WW_RESOLVE_RETRY_DELAY_MS", default = "2000")]
    pub resolve_retry_delay_ms: u64,

    /// Size bound on the recently-seen signature window
    #[envconfig(from = "WW_SIGNATURE_WINDOW", default = "50")]
    pub signature_window: usize,

    /// How long to wait before re-establishing a dropped log subscription
    #[envconfig(from = "WW_RECONNECT_AFTER_SECS", default = "5")]
    pub reconnect_after_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            default_threshold_sol: DEFAULT_THRESHOLD_SOL,
            resolve_retries: DEFAULT_RESOLVE_RETRIES,
            resolve_retry_delay_ms: DEFAULT_RESOLVE_RETRY_DELAY.as_millis() as u64,
            signature_window: DEFAULT_SIGNATURE_WINDOW,
            reconnect_after_secs: DEFAULT_RECONNECT_AFTER.as_secs(),
        }
    }
}
