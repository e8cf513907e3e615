//! Inbound message routers.
//!
//! Each router drains its peer's inbox to empty and runs the handlers to
//! completion before the mode tick, so anything a handler sets is visible
//! to the same tick's mode code.

pub mod mcb;
pub mod pu;
