//! # PIB Common Library
//!
//! Shared types and definitions for the Profiler Interface Board control
//! firmware. Everything the control brain and its hosts agree on lives here:
//! the closed action-identifier space, operating modes, motion kinds, typed
//! peer messages, telecommands, the persisted configuration set, and the
//! tick clock.
//!
//! # Module Structure
//!
//! - [`action`] - Scheduled/flagged action identifiers
//! - [`config`] - Persisted configuration snapshot + TOML load/save
//! - [`consts`] - Timeouts, buffer sizes, fixed protocol constants
//! - [`mode`] - Top-level operating modes
//! - [`motion`] - Reel motion kinds
//! - [`msg`] - Typed frames and commands for the MCB, PU and Zephyr links
//! - [`status`] - Peer status snapshots (PU housekeeping, Zephyr GPS)
//! - [`telecommand`] - Ground telecommand set
//! - [`text`] - Fixed-capacity detail strings for telemetry and logs
//! - [`time`] - Monotonic/wall tick clock

pub mod action;
pub mod config;
pub mod consts;
pub mod mode;
pub mod motion;
pub mod msg;
pub mod status;
pub mod telecommand;
pub mod text;
pub mod time;
