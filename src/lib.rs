//! Chilean economic indicators (dólar, euro, UF, IPC, UTM) from mindicador.cl,
//! with user accounts and a per-user record of every lookup.

pub mod auth;
pub mod cli;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod history;
pub mod indicators;
pub mod log;
pub mod memory;
pub mod service;
pub mod session;

pub use error::{ServiceError, ServiceResult};
pub use service::IndicatorService;
pub use session::{CurrentUser, Session, SessionState};
