//! Fixed-capacity detail strings for telemetry and logs.
//!
//! Telemetry details and Zephyr-bound log lines are bounded on the wire, so
//! they are built into a fixed-capacity string with silent truncation rather
//! than a heap `String`. The [`detail!`] macro is the `snprintf` of this
//! codebase.

use core::fmt::{self, Write};

/// Bounded message text for TM state details and Zephyr logs.
pub type DetailString = heapless::String<192>;

struct Truncating<'a>(&'a mut DetailString);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Truncation is acceptable; overflow must not abort formatting.
        let room = self.0.capacity() - self.0.len();
        let take = if s.len() <= room {
            s
        } else {
            // Back off to a char boundary.
            let mut end = room;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            &s[..end]
        };
        let _ = self.0.push_str(take);
        Ok(())
    }
}

/// Format into a truncating [`DetailString`].
pub fn fmt_detail(args: fmt::Arguments<'_>) -> DetailString {
    let mut out = DetailString::new();
    let _ = Truncating(&mut out).write_fmt(args);
    out
}

/// `format!` for [`DetailString`]: truncates instead of allocating.
#[macro_export]
macro_rules! detail {
    ($($arg:tt)*) => {
        $crate::text::fmt_detail(core::format_args!($($arg)*))
    };
}
