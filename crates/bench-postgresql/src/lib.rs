//! PostgreSQL connection helpers shared by the load, run and report stages.

mod connection;
mod ident;

pub use connection::{connect, mask_connection_password, ConnectionOpts};
pub use ident::{qualified, quote_ident, quote_literal};
