pub mod config;
pub mod replay;

pub use config::{show_config, ConfigArgs};
pub use replay::{replay, ReplayArgs};
