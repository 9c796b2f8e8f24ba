//! Concrete state handler functions and table builder.
//!
//! ```text
//!                 ┌──[in window]──▶ WITHIN_WINDOW  ─▶ Full / Quiet
//!  IDLE ──────────┤
//!   │             └──[outside]────▶ OUTSIDE_WINDOW ─▶ Skip
//!   │
//!   └──[interval off]──▶ (stays) ─▶ Skip
//! ```

use log::info;
use rand::Rng;

use super::context::SelectorContext;
use super::{
    CRITICAL_BATTERY_FLASHES, Decision, DecisionKind, Reason, SoundCue, StateDescriptor, StateId,
    chime_count,
};
use crate::app::ports::ClipId;
use crate::config::Mode;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once per evaluation.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_update: idle_update,
        },
        // Index 1 — WithinWindow
        StateDescriptor {
            id: StateId::WithinWindow,
            name: "WithinWindow",
            on_enter: Some(within_enter),
            on_update: settled_update,
        },
        // Index 2 — OutsideWindow
        StateDescriptor {
            id: StateId::OutsideWindow,
            name: "OutsideWindow",
            on_enter: Some(outside_enter),
            on_update: settled_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — classify the wake time
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut SelectorContext<'_>) -> Option<StateId> {
    if ctx.config.interval_minutes.is_none() && !ctx.config.debug {
        ctx.decision = Some(Decision::skip(Reason::IntervalOff));
        return None;
    }

    if ctx.in_window() {
        Some(StateId::WithinWindow)
    } else {
        Some(StateId::OutsideWindow)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WITHIN_WINDOW — pick between full and quiet action
// ═══════════════════════════════════════════════════════════════════════════

fn within_enter(ctx: &mut SelectorContext<'_>) {
    let decision = if ctx.input.battery_critical {
        Decision {
            kind: DecisionKind::QuietAction {
                flashes: CRITICAL_BATTERY_FLASHES,
            },
            reason: Reason::CriticalBattery,
        }
    } else if !ctx.input.light_sufficient {
        Decision {
            kind: DecisionKind::QuietAction {
                flashes: ctx.config.dark_flash_count,
            },
            reason: Reason::Dark,
        }
    } else {
        full_action(ctx)
    };

    info!("WITHIN_WINDOW: {:?} ({:?})", decision.kind, decision.reason);
    ctx.decision = Some(decision);
}

fn full_action(ctx: &mut SelectorContext<'_>) -> Decision {
    let mode = ctx.input.mode;
    let neck = mode.default_neck();

    let (sound, reason) = match mode {
        Mode::Clock => match chime_count(ctx.input.now) {
            Some(caws) => (
                Some(SoundCue {
                    clip: ClipId::CAW,
                    repeats: caws,
                }),
                Reason::Chime,
            ),
            None => (None, Reason::BetweenChimes),
        },
        Mode::Random => {
            let sound = (ctx.input.clip_count > 0).then(|| SoundCue {
                clip: ClipId(ctx.rng.gen_range(0..ctx.input.clip_count)),
                repeats: 1,
            });
            (sound, Reason::RandomClip)
        }
    };

    Decision {
        kind: DecisionKind::FullAction { neck, sound },
        reason,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OUTSIDE_WINDOW — quiet hours
// ═══════════════════════════════════════════════════════════════════════════

fn outside_enter(ctx: &mut SelectorContext<'_>) {
    info!("OUTSIDE_WINDOW: staying dormant");
    ctx.decision = Some(Decision::skip(Reason::OutsideWindow));
}

/// Window states are terminal for one evaluation.
fn settled_update(_ctx: &mut SelectorContext<'_>) -> Option<StateId> {
    None
}
