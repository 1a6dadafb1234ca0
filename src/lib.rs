//! Dreamer profile engine.
//!
//! Scores a dreamer on five dimensions by blending census answers with dream
//! journal signals, classifies the result into archetypes, tracks unlock
//! progress, and persists the outcome as a per-user snapshot.
//!
//! The analytical core lives in [`profile`]; [`db`] provides the libSQL
//! (default) and PostgreSQL backends it reads from and writes to.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod profile;

pub use config::Config;
pub use error::{Error, Result};
pub use profile::ProfileEngine;
