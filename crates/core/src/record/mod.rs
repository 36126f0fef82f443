use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    render::{Primitive, PrimitiveHandle, RenderSurface, SurfaceId},
    Result, SceneConfig,
};

/// Primitive as it was attached to the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPrimitive {
    pub handle: PrimitiveHandle,
    pub target: SurfaceId,
    pub primitive: Primitive,
}

/// Everything visible once a frame finished dispatching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub primitives: Vec<RecordedPrimitive>,
}

/// Serialisable output of a recorded render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameLog {
    pub config: SceneConfig,
    pub frames: Vec<FrameSnapshot>,
}

impl FrameLog {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// In-memory [`RenderSurface`] that keeps the attached set and snapshots it
/// at every frame boundary.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_handle: u64,
    attached: BTreeMap<PrimitiveHandle, (SurfaceId, Primitive)>,
    frames: Vec<FrameSnapshot>,
    attach_count: usize,
    detach_count: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently attached primitives, in attach order.
    pub fn attached(&self) -> impl Iterator<Item = (PrimitiveHandle, &Primitive)> {
        self.attached
            .iter()
            .map(|(handle, (_, primitive))| (*handle, primitive))
    }

    pub fn attached_on(&self, target: SurfaceId) -> impl Iterator<Item = &Primitive> {
        self.attached
            .values()
            .filter(move |(t, _)| *t == target)
            .map(|(_, primitive)| primitive)
    }

    pub fn is_attached(&self, handle: PrimitiveHandle) -> bool {
        self.attached.contains_key(&handle)
    }

    pub fn frames(&self) -> &[FrameSnapshot] {
        &self.frames
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }

    pub fn into_log(self, config: SceneConfig) -> FrameLog {
        FrameLog {
            config,
            frames: self.frames,
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn attach(&mut self, target: SurfaceId, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;
        self.attach_count += 1;
        self.attached.insert(handle, (target, primitive));
        handle
    }

    fn detach(&mut self, handle: PrimitiveHandle) {
        if self.attached.remove(&handle).is_some() {
            self.detach_count += 1;
        } else {
            tracing::warn!(?handle, "detaching a primitive that is not attached");
        }
    }

    fn end_frame(&mut self, frame: u64) {
        let primitives = self
            .attached
            .iter()
            .map(|(handle, (target, primitive))| RecordedPrimitive {
                handle: *handle,
                target: *target,
                primitive: primitive.clone(),
            })
            .collect();
        self.frames.push(FrameSnapshot { frame, primitives });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::Point,
        render::{MarkerGlyph, PrimitiveKind, Style},
    };

    fn marker(x: f64) -> Primitive {
        Primitive::new(
            PrimitiveKind::Marker {
                at: Point::new(x, 0.0),
                glyph: MarkerGlyph::Circle,
                size: 4.0,
            },
            Style::default(),
        )
    }

    #[test]
    fn snapshots_what_is_attached_at_frame_end() {
        let mut surface = RecordingSurface::new();
        let first = surface.attach(SurfaceId(0), marker(0.0));
        surface.end_frame(0);
        surface.detach(first);
        surface.attach(SurfaceId(1), marker(1.0));
        surface.end_frame(1);

        let frames = surface.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].primitives[0].handle, first);
        assert_eq!(frames[1].primitives.len(), 1);
        assert_eq!(frames[1].primitives[0].target, SurfaceId(1));
        assert_eq!(surface.attached_on(SurfaceId(0)).count(), 0);
    }

    #[test]
    fn unknown_detach_is_ignored() {
        let mut surface = RecordingSurface::new();
        surface.detach(PrimitiveHandle(42));
        assert_eq!(surface.detach_count(), 0);
    }

    #[test]
    fn log_round_trips_through_json() {
        let mut surface = RecordingSurface::new();
        surface.attach(SurfaceId(0), marker(2.0));
        surface.end_frame(0);
        let log = surface.into_log(SceneConfig::default());

        let json = serde_json::to_string(&log).unwrap();
        let back: FrameLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames, log.frames);
    }
}
