//! LoRa downlink aggregation.
//!
//! The PU radios two packet families while undocked: "ST" status strings,
//! forwarded to the OBC as fine logs, and "TM" profile telemetry fragments,
//! accumulated until the buffer nears capacity or the link goes idle, then
//! flushed as one telemetry packet.

use heapless::Vec;
use pib_common::consts::{LORA_TM_BUFFER_SIZE, LORA_TM_TIMEOUT_S};
use pib_common::detail;
use pib_common::msg::zephyr::{StateFlag, TmPayload, ZephyrMsg};
use tracing::info;

use crate::supervisor::Pib;

/// Aggregation buffer for LoRa profile-TM fragments.
#[derive(Debug, Default)]
pub struct LoraTmBuffer {
    buf: Vec<u8, LORA_TM_BUFFER_SIZE>,
    last_rx_ms: u64,
    packet_count: u16,
}

impl LoraTmBuffer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            last_rx_ms: 0,
            packet_count: 0,
        }
    }

    fn room_for(&self, len: usize) -> bool {
        self.buf.len() + len <= self.buf.capacity()
    }

    fn take(&mut self) -> TmPayload {
        let mut out = TmPayload::new();
        let _ = out.extend_from_slice(&self.buf);
        self.buf.clear();
        out
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Pib {
    /// Drain the LoRa inbox and run the idle-flush timer.
    pub(crate) fn lora_rx(&mut self) {
        while let Some(packet) = self.lora.inbox.pop_front() {
            let bytes = packet.0.as_slice();
            if bytes.starts_with(b"ST") {
                // Null-terminated status string; forward verbatim.
                let rest = &bytes[2..];
                let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
                let text = core::str::from_utf8(&rest[..end]).unwrap_or("<bad PU status>");
                self.zephyr.log_fine(detail!("{text}"));
            } else if bytes.starts_with(b"TM") {
                let rest = &bytes[2..];
                if !self.lora_tm.room_for(rest.len()) {
                    self.flush_lora_tm(false);
                }
                let _ = self.lora_tm.buf.extend_from_slice(rest);
                self.lora_tm.last_rx_ms = self.clock.mono_ms;
            } else {
                info!("Received unknown LoRa packet");
            }
        }

        // The PU sends TM fragments back to back; a long gap means the
        // profile dump is over and the tail should go out.
        if !self.lora_tm.is_empty()
            && self.clock.mono_ms - self.lora_tm.last_rx_ms > u64::from(LORA_TM_TIMEOUT_S) * 1000
        {
            self.flush_lora_tm(true);
            self.lora_tm.packet_count = 0;
        }
    }

    fn flush_lora_tm(&mut self, last: bool) {
        self.lora_tm.packet_count = self.lora_tm.packet_count.wrapping_add(1);
        let n = self.lora_tm.packet_count;
        let d = if last {
            detail!("Last PU TM Packet {n}")
        } else {
            detail!("PU TM Packet {n}")
        };
        info!("{}", d.as_str());
        let payload = self.lora_tm.take();
        // Out-of-band of the tracked TM handshake: a flush must not clobber
        // a sub-machine's pending TM ack.
        if self
            .zephyr
            .outbox
            .push_back(ZephyrMsg::Tm {
                flag: StateFlag::Fine,
                detail: d,
                payload,
            })
            .is_err()
        {
            tracing::error!("Zephyr outbox full, LoRa TM dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LoraPacket;
    use pib_common::config::PibConfig;
    use pib_common::time::TickClock;

    fn packet(bytes: &[u8]) -> LoraPacket {
        let mut v = Vec::new();
        let _ = v.extend_from_slice(bytes);
        LoraPacket(v)
    }

    fn pop_tm(pib: &mut Pib) -> Option<(String, usize)> {
        while let Some(msg) = pib.zephyr.outbox.pop_front() {
            if let ZephyrMsg::Tm {
                detail, payload, ..
            } = msg
            {
                return Some((detail.as_str().to_string(), payload.len()));
            }
        }
        None
    }

    #[test]
    fn status_packet_forwards_as_log() {
        let mut pib = Pib::new(PibConfig::default());
        pib.lora.inbox.push_back(packet(b"STPU OK\0junk")).unwrap();
        pib.tick(TickClock::new(1_000, 100));
        let log = pib.zephyr.outbox.pop_front().unwrap();
        assert_eq!(
            log,
            ZephyrMsg::Log {
                level: pib_common::msg::zephyr::LogLevel::Fine,
                text: detail!("PU OK"),
            }
        );
    }

    #[test]
    fn tm_fragments_accumulate_until_idle_timeout() {
        let mut pib = Pib::new(PibConfig::default());
        pib.lora.inbox.push_back(packet(b"TM\x01\x02\x03")).unwrap();
        pib.tick(TickClock::new(1_000, 100));
        assert_eq!(pib.lora_tm.len(), 3);
        assert!(pop_tm(&mut pib).is_none());

        // Idle past the timeout: the tail flushes.
        pib.tick(TickClock::new(1_000 + 601_000, 100 + 601));
        let (detail, len) = pop_tm(&mut pib).unwrap();
        assert_eq!(detail, "Last PU TM Packet 1");
        assert_eq!(len, 3);
        assert!(pib.lora_tm.is_empty());
    }

    #[test]
    fn near_overflow_flushes_before_appending() {
        let mut pib = Pib::new(PibConfig::default());
        let chunk = [0xAAu8; 200];
        let mut frame = heapless::Vec::<u8, 256>::new();
        frame.extend_from_slice(b"TM").unwrap();
        frame.extend_from_slice(&chunk).unwrap();
        let full_runs = LORA_TM_BUFFER_SIZE / 200;
        for i in 0..=full_runs {
            pib.lora.inbox.push_back(LoraPacket(frame.clone())).unwrap();
            pib.tick(TickClock::new(1_000 + i as u64, 100));
        }
        let (detail, len) = pop_tm(&mut pib).unwrap();
        assert_eq!(detail, "PU TM Packet 1");
        assert_eq!(len, full_runs * 200);
        assert_eq!(pib.lora_tm.len(), 200);
    }

    #[test]
    fn unknown_prefix_ignored() {
        let mut pib = Pib::new(PibConfig::default());
        pib.lora.inbox.push_back(packet(b"XY123")).unwrap();
        pib.tick(TickClock::new(1_000, 100));
        assert!(pib.lora_tm.is_empty());
        assert!(pop_tm(&mut pib).is_none());
    }
}
