//! Core library for the geometric diagram animator.
//!
//! A scene is a sequence of parts. Each part holds a script of visual
//! elements (segments, vectors, points, polygons and angles) that are cued
//! into a window of frames and animated through a small set of effects.
//! Rendering goes through the [`RenderSurface`] trait so the same timeline
//! can drive an on-screen canvas or the in-memory [`RecordingSurface`].

pub mod config;
pub mod effect;
pub mod element;
pub mod error;
pub mod geometry;
pub mod record;
pub mod render;
pub mod scene;
pub mod timeline;

pub use config::SceneConfig;
pub use effect::{Effect, EffectTable, Look};
pub use element::{
    AngleShape, AngleStyle, CueWindow, Draw, ElementOptions, PointShape, PolygonShape,
    PolygonStyle, SegmentShape, Shape, VectorShape, VisualElement,
};
pub use error::{GeoAnimError, Result};
pub use geometry::{Affine, Point, Polygon, Segment};
pub use record::{FrameLog, RecordingSurface};
pub use render::{Color, LineStyle, MarkerGlyph, Primitive, RenderSurface, Style, SurfaceId};
pub use scene::{Scene, SceneDescription};
pub use timeline::{dispatch_tick, FrameDriver, Part, Playback, SteppingDriver, Tick};
