pub mod backend;
pub mod codec;
pub mod config_io;
pub mod lock;
