pub mod bench;
pub mod config;
pub mod error;
pub mod plot;
pub mod result;
pub mod sweep;
pub mod util;
