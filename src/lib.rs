pub mod cli;
pub mod error;
pub mod form;
pub mod map;
pub mod render;
pub mod session;
pub mod shell;
pub mod storage;
pub mod types;
pub mod utils;
