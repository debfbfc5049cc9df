//! Core types and logic for the JobSwipe matching service.
//!
//! This crate owns the feed, swipe, inbox and chat rules. It has no HTTP or
//! database dependencies; storage is reached through the traits in
//! [`store`], which `jobswipe-store-sqlite` implements.

pub mod account;
pub mod chat;
pub mod error;
pub mod feed;
pub mod inbox;
pub mod matching;
pub mod profile;
pub mod realtime;
pub mod role;
pub mod store;
pub mod swipe;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
