pub mod core;
pub mod services;
pub mod wire;
