//! Timed visual effects.
//!
//! Each [`Effect`] maps to an `{init, run}` pair. `init` runs once when the
//! element is cued and may look at the cue window; `run` turns the local
//! frame index into a [`Look`], the scale and opacity the element's shape
//! is drawn with on that frame. Shapes advertise the effects they accept
//! through an [`EffectTable`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{GeoAnimError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Static draw of the full shape.
    #[default]
    None,
    /// Lengthens from the anchor toward the end point.
    Grow,
    /// Recedes toward the anchor.
    Shrink,
    /// Opacity ramps up to 1.
    FadeIn,
    /// Opacity ramps down to 0.
    FadeOut,
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::None,
        Effect::Grow,
        Effect::Shrink,
        Effect::FadeIn,
        Effect::FadeOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Grow => "grow",
            Effect::Shrink => "shrink",
            Effect::FadeIn => "fadein",
            Effect::FadeOut => "fadeout",
        }
    }

    /// The `{init, run}` pair implementing this effect.
    pub fn entry(self) -> EffectEntry {
        match self {
            Effect::None => EffectEntry {
                init: None,
                run: run_none,
            },
            Effect::Grow => EffectEntry {
                init: Some(init_ramp),
                run: run_grow,
            },
            Effect::Shrink => EffectEntry {
                init: Some(init_ramp),
                run: run_shrink,
            },
            Effect::FadeIn => EffectEntry {
                init: Some(init_ramp),
                run: run_fade_in,
            },
            Effect::FadeOut => EffectEntry {
                init: Some(init_ramp),
                run: run_fade_out,
            },
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = GeoAnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Effect::None),
            "grow" => Ok(Effect::Grow),
            "shrink" => Ok(Effect::Shrink),
            "fadein" | "fade_in" => Ok(Effect::FadeIn),
            "fadeout" | "fade_out" => Ok(Effect::FadeOut),
            _ => Err(GeoAnimError::unknown_effect(s, "any shape")),
        }
    }
}

/// How an element is drawn on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Look {
    /// Length factor about the shape's anchor.
    pub scale: f64,
    /// Opacity multiplier.
    pub alpha: f64,
}

impl Look {
    pub const FULL: Look = Look {
        scale: 1.0,
        alpha: 1.0,
    };
}

impl Default for Look {
    fn default() -> Self {
        Self::FULL
    }
}

/// Per-element effect state filled in by `init`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectState {
    pub total_frames: u64,
}

impl EffectState {
    /// Fraction of the effect completed after local frame `n`.
    fn progress(&self, n: u64) -> f64 {
        if self.total_frames == 0 {
            return 1.0;
        }
        (n + 1) as f64 / self.total_frames as f64
    }
}

pub type InitFn = fn(&mut EffectState, u64);
pub type RunFn = fn(&EffectState, u64) -> Look;

#[derive(Clone, Copy)]
pub struct EffectEntry {
    pub init: Option<InitFn>,
    pub run: RunFn,
}

impl fmt::Debug for EffectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectEntry")
            .field("init", &self.init.is_some())
            .finish()
    }
}

fn init_ramp(state: &mut EffectState, total_frames: u64) {
    state.total_frames = total_frames;
}

fn run_none(_: &EffectState, _: u64) -> Look {
    Look::FULL
}

fn run_grow(state: &EffectState, n: u64) -> Look {
    Look {
        scale: state.progress(n),
        alpha: 1.0,
    }
}

fn run_shrink(state: &EffectState, n: u64) -> Look {
    Look {
        scale: 1.0 - state.progress(n),
        alpha: 1.0,
    }
}

fn run_fade_in(state: &EffectState, n: u64) -> Look {
    Look {
        scale: 1.0,
        alpha: state.progress(n),
    }
}

fn run_fade_out(state: &EffectState, n: u64) -> Look {
    Look {
        scale: 1.0,
        alpha: 1.0 - state.progress(n),
    }
}

/// The effects a shape accepts, keyed by [`Effect`].
#[derive(Debug, Clone)]
pub struct EffectTable {
    entries: Vec<(Effect, EffectEntry)>,
}

impl EffectTable {
    pub fn new(effects: &[Effect]) -> Self {
        Self {
            entries: effects.iter().map(|&e| (e, e.entry())).collect(),
        }
    }

    /// Table with every effect in [`Effect::ALL`].
    pub fn full() -> Self {
        Self::new(&Effect::ALL)
    }

    /// Table for shapes that cannot change length.
    pub fn static_shape() -> Self {
        Self::new(&[Effect::None, Effect::FadeIn, Effect::FadeOut])
    }

    pub fn get(&self, effect: Effect) -> Option<&EffectEntry> {
        self.entries
            .iter()
            .find_map(|(key, entry)| (*key == effect).then_some(entry))
    }

    pub fn supports(&self, effect: Effect) -> bool {
        self.get(effect).is_some()
    }

    pub fn effects(&self) -> impl Iterator<Item = Effect> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }
}
