//! Actuator sequencer.
//!
//! Turns a [`Decision`] into driver calls, strictly in order:
//!
//! ```text
//!  Skip         ─▶ (nothing)
//!  QuietAction  ─▶ Eyes::flash(n)
//!  FullAction   ─▶ Eyes::on ─▶ Neck::rotate ─▶ Speaker::play ×N ─▶ Eyes::off
//! ```
//!
//! Execution is best effort.  A failing step is logged, reported through
//! the event sink and recorded, and the remaining steps still run: eyes
//! left on all night are worse than a missing caw.

use heapless::Vec;
use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::{ClipId, EventSink, Eyes, Neck, NeckPattern, Speaker};
use crate::config::Mode;
use crate::error::ActuatorError;
use crate::selector::{Decision, DecisionKind};

/// Upper bound on recorded failures per sequence (a full midnight chime
/// plus the eye and neck steps).
pub const MAX_FAILURES: usize = 16;

/// One actuator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EyesOn,
    EyesOff,
    EyesFlash,
    NeckRotate,
    SpeakerPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFailure {
    pub step: Step,
    pub error: ActuatorError,
}

/// What happened while executing one sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Steps attempted, successful or not.
    pub attempted: u8,
    /// Failed steps in order of occurrence.
    pub failures: Vec<StepFailure, MAX_FAILURES>,
}

impl SequenceReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(
        &mut self,
        step: Step,
        result: Result<(), ActuatorError>,
        sink: &mut impl EventSink,
    ) {
        self.attempted = self.attempted.saturating_add(1);
        if let Err(error) = result {
            warn!("sequencer: {:?} failed: {}", step, error);
            sink.emit(&AppEvent::StepFailed { step, error });
            if self.failures.push(StepFailure { step, error }).is_err() {
                warn!("sequencer: failure log full, dropping {:?}", step);
            }
        }
    }
}

/// Execute one decision against the bird's actuators.
pub fn execute(
    decision: &Decision,
    hw: &mut (impl Eyes + Neck + Speaker),
    volume: f32,
    sink: &mut impl EventSink,
) -> SequenceReport {
    let mut report = SequenceReport::default();

    match decision.kind {
        DecisionKind::Skip => {}
        DecisionKind::QuietAction { flashes } => {
            report.record(Step::EyesFlash, hw.flash(flashes), sink);
        }
        DecisionKind::FullAction { neck, sound } => {
            report.record(Step::EyesOn, hw.on(), sink);
            report.record(Step::NeckRotate, hw.rotate(neck), sink);
            if let Some(cue) = sound {
                for _ in 0..cue.repeats {
                    report.record(Step::SpeakerPlay, hw.play(cue.clip, volume), sink);
                }
            }
            report.record(Step::EyesOff, hw.off(), sink);
        }
    }

    report
}

/// Cold-boot gesture: a full sweep with one caw, then the mode indicator
/// (one eye flash per mode position).
pub fn flourish(
    hw: &mut (impl Eyes + Neck + Speaker),
    mode: Mode,
    volume: f32,
    sink: &mut impl EventSink,
) -> SequenceReport {
    let mut report = SequenceReport::default();

    report.record(Step::EyesOn, hw.on(), sink);
    report.record(Step::NeckRotate, hw.rotate(NeckPattern::Sweep), sink);
    if hw.clip_count() > 0 {
        report.record(Step::SpeakerPlay, hw.play(ClipId::CAW, volume), sink);
    }
    report.record(Step::EyesOff, hw.off(), sink);
    report.record(Step::EyesFlash, hw.flash(mode.position()), sink);

    report
}
