pub mod board_io;
pub mod config_io;
pub mod kv;
pub mod lock;
pub mod recovery;
