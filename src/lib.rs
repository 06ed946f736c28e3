pub mod cli;
pub mod config;
pub mod entity;
pub mod observe;
pub mod provider;
pub mod search;
pub mod session;
pub mod stat;
pub mod storage;
pub mod types;

pub use cli::CliOptions;
pub use config::Config;
pub use session::{Session, SessionEvent};
