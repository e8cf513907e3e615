//! Action identifiers shared by the scheduler, the flag registry and the
//! telecommand handler.
//!
//! The set is closed: every deferred timer, inter-machine signal and
//! multi-step ground command draws from this enumeration, so a scheduled
//! entry and the flag it posts are always the same identity.

/// Identity of a schedulable / flaggable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionId {
    // ── Scheduled resends ──
    /// Periodic instrument mode request to the OBC.
    SendImr,
    /// Retry the safety message handshake.
    ResendSafety,
    /// Retry the MCB low-power command.
    ResendMcbLowPower,
    /// Retry the request-authority handshake.
    ResendRa,
    /// Retry an unacknowledged MCB motion command.
    ResendMotionCommand,
    /// Retry an unacknowledged telemetry packet.
    ResendTm,
    /// Retry the PU status request.
    ResendPuCheck,
    /// Retry the PU TSEN record request.
    ResendPuTsen,
    /// Retry the PU profile record request.
    ResendPuRecord,
    /// Retry the PU warmup command.
    ResendPuWarmup,
    /// Retry the PU go-profile command.
    ResendPuGoProfile,
    /// Retry the MCB full-retract command.
    ResendFullRetract,

    /// Leave the mode error loop (ground command only).
    ExitErrorState,

    // ── Internal signals ──
    ReelOut,
    ReelIn,
    InNoLooseWire,
    Dock,
    MotionStop,
    BeginProfile,
    EndDwell,
    CheckPu,
    RequestTsen,
    EndWarmup,
    EndPreprofile,
    OverrideTsen,
    OffloadPu,
    MotionTimeout,
    EndDockWait,

    // ── Multi-step ground commands ──
    /// Reel out, reel in ignoring loose wire, check the PU.
    Redock,
    /// Check the PU, request a TSEN record, downlink it.
    SendTsen,
    ManualProfile,
    DockedProfile,
}

impl ActionId {
    /// Number of distinct actions; sizes the flag registry.
    pub const COUNT: usize = 32;

    /// Registry slot for this action.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
