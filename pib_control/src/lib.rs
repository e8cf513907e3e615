//! # PIB Control
//!
//! Deterministic, single-threaded control brain for the Profiler Interface
//! Board: the hierarchical mode/substate scheduler and the motion/profile
//! coordination machines that run safe, interruptible multi-step procedures
//! (reel out, dwell, reel in, dock, verify, low power) over unreliable
//! serial links.
//!
//! ## Architecture Levels
//!
//! 1. **Mode** — OBC-commanded lifecycle (Standby/Flight/LowPower/Safety/EndOfFlight)
//! 2. **Mode substate** — entry/loop/error/shutdown/exit per mode
//! 3. **Flight sub-machines** — restartable FSMs (profile, PU offload, TSEN,
//!    redock, docked profile, manual motion, PU check)
//! 4. **Motion sequencer** — shared command/verify/monitor template for the reel
//!
//! ## Zero-Allocation Tick
//!
//! All runtime state is owned by one [`supervisor::Pib`] value, pre-sized at
//! startup. The tick performs zero heap allocations: queues, telemetry
//! accumulators and log details are fixed-capacity.
//!
//! The host main loop drives [`supervisor::Pib::tick`] at a fixed cadence and
//! shuttles bytes between the typed queues and the real serial links.

#![deny(clippy::disallowed_types)]

pub mod flags;
pub mod link;
pub mod lora;
pub mod modes;
pub mod router;
pub mod runner;
pub mod sched;
pub mod supervisor;
pub mod telecommand;
pub mod telemetry;
