//! Adds up the tips recorded on emailed receipts in a Gmail mailbox.

pub mod auth;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod mail;
pub mod session;
pub mod tally;
pub mod tips;
