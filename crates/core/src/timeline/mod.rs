//! Parts, cueing and per-tick dispatch.
//!
//! A [`Part`] groups elements that run concurrently for a fixed duration.
//! Cueing turns seconds into frame windows: absolute frames for the part,
//! part-relative frames for each element. The resulting [`Tick`] sequence is
//! what a [`FrameDriver`] walks through, calling [`dispatch_tick`] once per
//! entry.

use serde::{Deserialize, Serialize};

use crate::{
    element::VisualElement,
    render::{RenderSurface, SurfaceId},
    GeoAnimError, Result, SceneConfig,
};

/// One step of the timeline: a frame inside a given part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub part: usize,
    pub frame_in_part: u64,
}

impl Tick {
    pub const fn new(part: usize, frame_in_part: u64) -> Self {
        Self {
            part,
            frame_in_part,
        }
    }
}

/// Absolute scene frames taken by a part, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
}

impl FrameRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug)]
pub struct Part {
    index: usize,
    script: Vec<VisualElement>,
    duration: f64,
    default_surface: SurfaceId,
    frames: Option<FrameRange>,
}

impl Part {
    pub fn new(
        index: usize,
        script: Vec<VisualElement>,
        duration: f64,
        default_surface: SurfaceId,
    ) -> Result<Self> {
        if script.is_empty() {
            return Err(GeoAnimError::config("part must not be empty"));
        }
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(GeoAnimError::config(format!(
                "duration ({duration}) must be > 0"
            )));
        }

        Ok(Self {
            index,
            script,
            duration,
            default_surface,
            frames: None,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn script(&self) -> &[VisualElement] {
        &self.script
    }

    /// Absolute frames of the part, once cued.
    pub fn frames(&self) -> Option<FrameRange> {
        self.frames
    }

    /// Elements ready for dispatch; empty until the part is cued.
    pub fn cued_elements(&self) -> &[VisualElement] {
        if self.frames.is_some() {
            &self.script
        } else {
            &[]
        }
    }

    /// Computes the part's frame range right after `last_taken_frame` and
    /// cues every scripted element inside it.
    ///
    /// The part's own duration sets its length. An element's `end_at` only
    /// bounds that element and is clamped to the part's last frame.
    pub fn cue(&mut self, last_taken_frame: Option<u64>, config: &SceneConfig) -> Result<FrameRange> {
        let frame_count = config.frames_for(self.duration)?;
        if frame_count == 0 {
            return Err(GeoAnimError::config(format!(
                "part {} lasts {}s, shorter than one frame at {} fps",
                self.index, self.duration, config.fps
            )));
        }

        let overflow = || {
            GeoAnimError::config(format!(
                "part {} runs past the last representable frame",
                self.index
            ))
        };
        let start = match last_taken_frame {
            Some(last) => last.checked_add(1).ok_or_else(overflow)?,
            None => 0,
        };
        let range = FrameRange {
            start,
            end: start.checked_add(frame_count - 1).ok_or_else(overflow)?,
        };
        let last_in_part = range.end - range.start;

        for (position, element) in self.script.iter_mut().enumerate() {
            let options = element.options();
            let start_in_part = match options.start_after {
                Some(seconds) => config.frames_for(seconds)?,
                None => 0,
            };
            let mut end_in_part = match options.end_at {
                Some(seconds) => config.frames_for(seconds)?.saturating_sub(1),
                None => last_in_part,
            };

            if start_in_part > last_in_part {
                return Err(GeoAnimError::config(format!(
                    "element {position} of part {} starts at frame {start_in_part}, after the part ends at frame {last_in_part}",
                    self.index
                )));
            }
            if end_in_part > last_in_part {
                tracing::warn!(
                    part = self.index,
                    element = position,
                    end_in_part,
                    last_in_part,
                    "element ends after its part; clamping to the part's last frame"
                );
                end_in_part = last_in_part;
            }

            element.cue(start_in_part, end_in_part, self.default_surface)?;
        }

        tracing::debug!(
            part = self.index,
            start = range.start,
            end = range.end,
            elements = self.script.len(),
            "cued part"
        );
        self.frames = Some(range);
        Ok(range)
    }

    /// One tick per frame of the part; empty until cued.
    pub fn ticker(&self) -> Vec<Tick> {
        match self.frames {
            Some(range) => (0..range.len())
                .map(|frame| Tick::new(self.index, frame))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Removes the visuals of every element that should not outlive the part.
    pub fn remove_transient(&mut self, surface: &mut dyn RenderSurface) {
        for element in self.script.iter_mut().filter(|e| !e.stay()) {
            element.remove_visual(surface);
        }
    }
}

/// Runs one tick against `parts`.
///
/// On the first frame of every part but the first, elements of the previous
/// part that do not stay are removed before anything new is drawn. Elements
/// are then dispatched in script order.
pub fn dispatch_tick(parts: &mut [Part], tick: Tick, surface: &mut dyn RenderSurface) -> Result<()> {
    if tick.part >= parts.len() {
        return Err(GeoAnimError::config(format!(
            "tick refers to part {} but the scene has {} parts",
            tick.part,
            parts.len()
        )));
    }

    if tick.frame_in_part == 0 && tick.part > 0 {
        tracing::debug!(part = tick.part - 1, "removing transient elements");
        parts[tick.part - 1].remove_transient(surface);
    }

    let part = &mut parts[tick.part];
    if part.frames.is_none() {
        return Err(GeoAnimError::config(format!(
            "part {} dispatched before being cued",
            part.index
        )));
    }
    for element in part.script.iter_mut() {
        element.dispatch(tick.frame_in_part, surface)?;
    }
    Ok(())
}

/// Everything a host loop needs to step through a cued scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    pub ticker: Vec<Tick>,
    /// Milliseconds between frames.
    pub interval_ms: f64,
    /// Last absolute frame number, `None` for an empty scene.
    pub last_frame: Option<u64>,
}

impl Playback {
    pub fn frame_count(&self) -> usize {
        self.ticker.len()
    }
}

/// Per-tick callback handed to a [`FrameDriver`].
pub type StepFn<'a> = dyn FnMut(Tick, &mut dyn RenderSurface) -> Result<()> + 'a;

/// Host loop that walks a [`Playback`] and invokes `step` for each tick, in
/// order.
pub trait FrameDriver {
    fn drive(&mut self, playback: &Playback, step: &mut StepFn<'_>) -> Result<()>;
}

/// [`FrameDriver`] that steps every tick synchronously against an owned
/// surface, as fast as possible. Pacing is left to whoever consumes the
/// surface.
#[derive(Debug, Default)]
pub struct SteppingDriver<S> {
    surface: S,
    max_frames: Option<usize>,
    frames_run: usize,
}

impl<S: RenderSurface> SteppingDriver<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            max_frames: None,
            frames_run: 0,
        }
    }

    /// Stops after `frames` ticks instead of running the whole ticker.
    pub fn truncate_after(mut self, frames: usize) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn frames_run(&self) -> usize {
        self.frames_run
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

impl<S: RenderSurface> FrameDriver for SteppingDriver<S> {
    fn drive(&mut self, playback: &Playback, step: &mut StepFn<'_>) -> Result<()> {
        let limit = self.max_frames.unwrap_or(usize::MAX);
        for (frame, tick) in playback.ticker.iter().take(limit).enumerate() {
            step(*tick, &mut self.surface)?;
            self.surface.end_frame(frame as u64);
            self.frames_run += 1;
        }

        if self.frames_run < playback.frame_count() {
            tracing::info!(
                frames = self.frames_run,
                total = playback.frame_count(),
                "playback truncated"
            );
        }
        Ok(())
    }
}
