//! Action selector: function-pointer finite state machine.
//!
//! The classic embedded FSM table, one row per state:
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │  StateTable                                       │
//! │  ┌───────────────┬───────────┬──────────────────┐ │
//! │  │ StateId       │ on_enter  │ on_update        │ │
//! │  ├───────────────┼───────────┼──────────────────┤ │
//! │  │ Idle          │ —         │ fn(ctx)->Option<>│ │
//! │  │ WithinWindow  │ fn(ctx)   │ fn(ctx)->Option<>│ │
//! │  │ OutsideWindow │ fn(ctx)   │ fn(ctx)->Option<>│ │
//! │  └───────────────┴───────────┴──────────────────┘ │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! A fresh machine is built for every wake cycle and starts in `Idle`.
//! One tick classifies the current time against the window; the `on_enter`
//! of the target state writes the [`Decision`] into the context.  Nothing
//! carries over between cycles, so the decision is a pure function of
//! (time, mode, light, battery, config) plus the injected RNG.

pub mod context;
pub mod states;

use chrono::{NaiveTime, Timelike};
use log::{debug, info};
use rand::RngCore;

use crate::app::ports::{ClipId, NeckPattern};
use crate::config::{BirdConfig, Mode};
use context::{SelectorContext, SelectorInput};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all selector states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    WithinWindow = 1,
    OutsideWindow = 2,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::WithinWindow,
            2 => Self::OutsideWindow,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// A sound step: `repeats` plays of one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue {
    pub clip: ClipId,
    pub repeats: u8,
}

/// The three behavior tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Eyes on, neck moves, optional sound, eyes off.
    FullAction {
        neck: NeckPattern,
        sound: Option<SoundCue>,
    },
    /// Eyes flash only.
    QuietAction { flashes: u8 },
    /// Stay dormant.
    Skip,
}

/// Why the selector chose what it chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Current time is outside the activity window.
    OutsideWindow,
    /// Scheduled behavior is switched off (empty interval).
    IntervalOff,
    /// The room is dark (or the light sensor failed).
    Dark,
    /// Battery below the configured critical level.
    CriticalBattery,
    /// Clock mode at an hour or half-hour boundary.
    Chime,
    /// Clock mode between boundaries: movement without sound.
    BetweenChimes,
    /// Random mode clip pick.
    RandomClip,
}

/// Outcome of one selector evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub reason: Reason,
}

impl Decision {
    pub fn skip(reason: Reason) -> Self {
        Self {
            kind: DecisionKind::Skip,
            reason,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.kind == DecisionKind::Skip
    }
}

/// Eye flashes used for the low-battery warning.
pub const CRITICAL_BATTERY_FLASHES: u8 = 5;

/// How far from an exact hour or half-hour a wake may land and still chime.
pub const CHIME_TOLERANCE_SECS: u32 = 90;

const HALF_HOUR_SECS: u32 = 30 * 60;

/// Seconds from `t` to the hour or half-hour boundary it is aimed at,
/// when that boundary is within [`CHIME_TOLERANCE_SECS`].  Positive when
/// `t` is early, negative when late.
pub fn chime_offset_secs(t: NaiveTime) -> Option<i64> {
    let secs = t.num_seconds_from_midnight();
    let nearest = (secs + HALF_HOUR_SECS / 2) / HALF_HOUR_SECS * HALF_HOUR_SECS;
    if secs.abs_diff(nearest) > CHIME_TOLERANCE_SECS {
        return None;
    }
    Some(i64::from(nearest) - i64::from(secs))
}

/// Caws to chime at `t` in Clock mode.
///
/// Near the hour: the 12-hour clock hour (midnight and noon give 12).
/// Near the half-hour: one.  Anywhere else: `None`.  "Near" is within
/// [`CHIME_TOLERANCE_SECS`] either side, so a wake that lands a little
/// early or late still chimes the boundary it was aimed at.
pub fn chime_count(t: NaiveTime) -> Option<u8> {
    const DAY: i64 = 24 * 60 * 60;

    let offset = chime_offset_secs(t)?;
    let boundary = (i64::from(t.num_seconds_from_midnight()) + offset).rem_euclid(DAY);
    if boundary % 3600 == 0 {
        let hour12 = match (boundary / 3600) % 12 {
            0 => 12,
            h => h,
        };
        Some(hour12 as u8)
    } else {
        Some(1)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.
pub type StateActionFn = fn(&mut SelectorContext<'_>);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut SelectorContext<'_>) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single selector state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut SelectorContext<'_>) {
        debug!("selector starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Call `on_update` for the current state and follow any transition.
    pub fn tick(&mut self, ctx: &mut SelectorContext<'_>) {
        if let Some(next_id) = (self.table[self.current].on_update)(ctx) {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut SelectorContext<'_>) {
        let next_idx = next_id as usize;

        info!(
            "selector: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Evaluate one wake cycle, returning the state the machine settled in and
/// the decision it produced.
pub fn evaluate(
    input: &SelectorInput,
    config: &BirdConfig,
    rng: &mut dyn RngCore,
) -> (StateId, Decision) {
    let mut ctx = SelectorContext::new(*input, config, rng);
    let mut fsm = Fsm::new(states::build_state_table(), StateId::Idle);
    fsm.start(&mut ctx);
    fsm.tick(&mut ctx);

    let decision = ctx
        .decision
        .unwrap_or_else(|| Decision::skip(Reason::IntervalOff));
    (fsm.current_state(), decision)
}

/// Choose this cycle's behavior.
pub fn select(input: &SelectorInput, config: &BirdConfig, rng: &mut dyn RngCore) -> Decision {
    evaluate(input, config, rng).1
}

impl Mode {
    /// Neck movement for a full action in this mode.
    pub(crate) fn default_neck(self) -> NeckPattern {
        match self {
            Self::Clock => NeckPattern::Sweep,
            Self::Random => NeckPattern::Glance,
        }
    }
}
