//! Typed peer messages.
//!
//! Wire framing and checksums live below this layer: inbound types arrive
//! already classified, carrying a `checksum_valid` flag where the payload
//! integrity matters. Outbound types are commands the host serializes.

pub mod mcb;
pub mod pu;
pub mod zephyr;
