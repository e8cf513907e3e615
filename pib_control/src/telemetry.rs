//! MCB motion telemetry accumulation.
//!
//! Packet layout (buffered mode): a big-endian u32 profile-start epoch
//! header, then per packet a 0xA5 sync byte, a big-endian u16 elapsed time
//! in tenths of seconds since profile start, and the fixed-size motion TM
//! binary. In real-time mode each packet is downlinked as it arrives with
//! no sync/time framing; the epoch header still prefaces the first.

use heapless::Vec;
use pib_common::consts::{MCB_TM_BUFFER_SIZE, MCB_TM_SYNC};
use pib_common::msg::zephyr::TmPayload;

/// Accumulator for MCB motion TM between profile start and downlink.
#[derive(Debug, Default)]
pub struct McbTmBuffer {
    buf: Vec<u8, MCB_TM_BUFFER_SIZE>,
    packet_count: u16,
}

impl McbTmBuffer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            packet_count: 0,
        }
    }

    /// Reset for a new profile and stamp the epoch header.
    pub fn start_profile(&mut self, epoch: u32) {
        self.buf.clear();
        self.packet_count = 0;
        let _ = self.buf.extend_from_slice(&epoch.to_be_bytes());
    }

    /// Append one motion TM packet. Buffered mode adds the sync/time
    /// framing; real-time mode appends the packet bytes alone.
    /// Returns false (dropping the packet) when out of room.
    #[must_use]
    pub fn push_packet(&mut self, data: &[u8], elapsed_tenths: u16, real_time: bool) -> bool {
        let framing = if real_time { 0 } else { 3 };
        if self.buf.len() + framing + data.len() > self.buf.capacity() {
            return false;
        }
        if !real_time {
            let _ = self.buf.push(MCB_TM_SYNC);
            let _ = self.buf.extend_from_slice(&elapsed_tenths.to_be_bytes());
        }
        let _ = self.buf.extend_from_slice(data);
        true
    }

    /// Next downlink packet number (1-based).
    pub fn next_packet_num(&mut self) -> u16 {
        self.packet_count = self.packet_count.wrapping_add(1);
        self.packet_count
    }

    /// Move the accumulated bytes out for downlink.
    pub fn take(&mut self) -> TmPayload {
        core::mem::take(&mut self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
