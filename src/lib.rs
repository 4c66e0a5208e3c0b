//! zvault: a local-first terminal vault for secrets and tasks.

pub mod app;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod dates;
pub mod errors;
pub mod logging;
pub mod models;
pub mod platform;
pub mod storage;
pub mod totp;
pub mod ui;
