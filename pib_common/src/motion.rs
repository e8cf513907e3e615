//! Reel motion kinds.

/// One commanded reel motion. At most one is active at a time; the
/// supervisor tracks the active kind as `Option<MotionKind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// Retract the tether by a commanded number of revolutions.
    ReelIn,
    /// Deploy the tether.
    ReelOut,
    /// Final approach onto the dock.
    Dock,
    /// Retract ignoring the loose-wire detector.
    InNoLooseWire,
}

impl MotionKind {
    /// Whether this motion terminates on the dock (the MCB reports dock
    /// contact via its loose-wire fault line).
    #[inline]
    pub const fn ends_on_dock(self) -> bool {
        matches!(self, MotionKind::Dock | MotionKind::InNoLooseWire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dock_kinds() {
        assert!(MotionKind::Dock.ends_on_dock());
        assert!(MotionKind::InNoLooseWire.ends_on_dock());
        assert!(!MotionKind::ReelIn.ends_on_dock());
        assert!(!MotionKind::ReelOut.ends_on_dock());
    }
}
