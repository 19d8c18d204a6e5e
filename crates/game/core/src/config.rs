/// Cast configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CastConfig {
    /// Maximum distance covered by aim traces (ground point, actor pick).
    pub trace_range: f32,
    /// Half height used by capsule overlaps when the caller does not give one.
    pub capsule_half_height: f32,
    /// Turn rate in degrees per second used by look-at tasks.
    pub default_turn_rate: f32,
    /// Acceptance radius used by move tasks when the caller does not give one.
    pub default_acceptance_radius: f32,
    /// How many times a blocked or off-path move is re-issued before the task
    /// gives up.
    pub max_move_retries: u32,
}

impl CastConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of spell slots per actor.
    pub const MAX_SLOTS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TRACE_RANGE: f32 = 2000.0;
    pub const DEFAULT_CAPSULE_HALF_HEIGHT: f32 = 300.0;
    pub const DEFAULT_TURN_RATE: f32 = 360.0;
    pub const DEFAULT_ACCEPTANCE_RADIUS: f32 = 50.0;
    pub const DEFAULT_MAX_MOVE_RETRIES: u32 = 5;

    pub fn new() -> Self {
        Self {
            trace_range: Self::DEFAULT_TRACE_RANGE,
            capsule_half_height: Self::DEFAULT_CAPSULE_HALF_HEIGHT,
            default_turn_rate: Self::DEFAULT_TURN_RATE,
            default_acceptance_radius: Self::DEFAULT_ACCEPTANCE_RADIUS,
            max_move_retries: Self::DEFAULT_MAX_MOVE_RETRIES,
        }
    }

    pub fn with_trace_range(mut self, trace_range: f32) -> Self {
        self.trace_range = trace_range;
        self
    }

    pub fn with_max_move_retries(mut self, max_move_retries: u32) -> Self {
        self.max_move_retries = max_move_retries;
        self
    }
}

impl Default for CastConfig {
    fn default() -> Self {
        Self::new()
    }
}
