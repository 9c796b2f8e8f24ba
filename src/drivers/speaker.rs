//! Speaker driver: synthesised bird calls.
//!
//! A square wave from the LEDC speaker channel feeds a class-D amplifier.
//! Each clip is a short list of frequency glides; volume scales the duty
//! cycle (50 % is the loudest a square wave gets).  The amplifier is only
//! enabled while a clip plays, since its idle current would otherwise
//! drain a battery bird overnight.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{ClipId, Speaker};
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

/// One glide: frequency ramps from `from_hz` to `to_hz` over `ms`.
#[derive(Debug, Clone, Copy)]
pub struct Glide {
    pub from_hz: u32,
    pub to_hz: u32,
    pub ms: u32,
}

const fn glide(from_hz: u32, to_hz: u32, ms: u32) -> Glide {
    Glide { from_hz, to_hz, ms }
}

/// Named clip in the table; index = [`ClipId`].
pub struct Clip {
    pub name: &'static str,
    pub glides: &'static [Glide],
}

pub static CLIPS: [Clip; 4] = [
    Clip {
        name: "caw",
        glides: &[glide(1_400, 900, 180), glide(900, 700, 120)],
    },
    Clip {
        name: "chirp",
        glides: &[glide(3_000, 4_200, 60), glide(0, 0, 40), glide(3_200, 4_400, 60)],
    },
    Clip {
        name: "trill",
        glides: &[
            glide(2_600, 3_000, 40),
            glide(3_000, 2_600, 40),
            glide(2_600, 3_000, 40),
            glide(3_000, 2_600, 40),
        ],
    },
    Clip {
        name: "coo",
        glides: &[glide(500, 650, 250), glide(650, 450, 350)],
    },
];

/// Gap between repeated plays so consecutive caws stay distinct.
const CLIP_GAP_MS: u32 = 250;
const GLIDE_STEP_MS: u32 = 10;
const MAX_DUTY: f32 = 128.0;

pub struct SpeakerDriver<D> {
    delay: D,
}

impl<D: DelayNs> SpeakerDriver<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    fn amp(&mut self, on: bool) -> Result<(), ActuatorError> {
        if hw_init::gpio_write(pins::AMP_ENABLE_GPIO, on) {
            Ok(())
        } else {
            Err(ActuatorError::GpioWriteFailed)
        }
    }

    fn tone(&mut self, freq_hz: u32, duty: u32) -> Result<(), ActuatorError> {
        if freq_hz == 0 {
            // rest
            return set_duty(0);
        }
        if !hw_init::ledc_set_speaker_freq(freq_hz) {
            return Err(ActuatorError::PwmWriteFailed);
        }
        set_duty(duty)
    }

    fn render(&mut self, clip: &Clip, duty: u32) -> Result<(), ActuatorError> {
        for g in clip.glides {
            let steps = (g.ms / GLIDE_STEP_MS).max(1);
            for i in 0..steps {
                let freq = interpolate(g.from_hz, g.to_hz, i, steps);
                self.tone(freq, duty)?;
                self.delay.delay_ms(GLIDE_STEP_MS);
            }
        }
        set_duty(0)
    }
}

impl<D: DelayNs> Speaker for SpeakerDriver<D> {
    fn play(&mut self, clip: ClipId, volume: f32) -> Result<(), ActuatorError> {
        let clip = CLIPS
            .get(usize::from(clip.0))
            .ok_or(ActuatorError::UnknownClip)?;
        let duty = volume_to_duty(volume);
        if duty == 0 {
            debug!("speaker: volume 0, '{}' muted", clip.name);
            return Ok(());
        }

        self.amp(true)?;
        let rendered = self.render(clip, duty);
        // always release the amplifier, even after a failed note
        let released = set_duty(0).and(self.amp(false));
        self.delay.delay_ms(CLIP_GAP_MS);
        rendered.and(released)
    }

    fn clip_count(&self) -> u8 {
        CLIPS.len() as u8
    }
}

fn set_duty(duty: u32) -> Result<(), ActuatorError> {
    if hw_init::ledc_set(hw_init::LEDC_CH_SPEAKER, duty) {
        Ok(())
    } else {
        Err(ActuatorError::PwmWriteFailed)
    }
}

fn volume_to_duty(volume: f32) -> u32 {
    if !volume.is_finite() {
        return 0;
    }
    (volume.clamp(0.0, 1.0) * MAX_DUTY).round() as u32
}

fn interpolate(from: u32, to: u32, step: u32, steps: u32) -> u32 {
    let from = i64::from(from);
    let to = i64::from(to);
    (from + (to - from) * i64::from(step) / i64::from(steps)) as u32
}
