pub mod activity;
pub mod board;
pub mod config;
pub mod store;
pub mod streak;
pub mod task;

pub use activity::*;
pub use board::*;
pub use config::*;
pub use store::*;
pub use streak::*;
pub use task::*;
