//! Backend for tracking shared expenses inside groups of people.
//!
//! Users register and log in with a session cookie, create groups, and log
//! expenses paid by one member and split among others. Every expense listing
//! carries the requesting user's own position on it (see
//! [`balance::compute_balance`]), and each group exposes net balances and a
//! settle-up plan.

pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod store;
