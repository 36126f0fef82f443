//! Effect-driven drawables.
//!
//! A [`VisualElement`] pairs a [`Shape`] (what to draw) with
//! [`ElementOptions`] (how and when to draw it). The element is cued once per
//! part activation and then dispatched every tick of its part; each dispatch
//! runs the configured effect, asks the shape for fresh primitives and swaps
//! them onto the rendering surface.

mod angle;
mod line;
mod point;
mod polygon;

pub use angle::{AngleShape, AngleStyle};
pub use line::{SegmentShape, VectorShape};
pub use point::PointShape;
pub use polygon::{PolygonShape, PolygonStyle};

use serde::Serialize;

use crate::{
    effect::{Effect, EffectState, EffectTable, Look},
    geometry::{Point, Segment},
    render::{Color, LineStyle, Primitive, PrimitiveHandle, RenderSurface, Style, SurfaceId},
    GeoAnimError, Result,
};

/// Options shared by every element, with the defaults used when a script
/// leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementOptions {
    pub effect: Effect,
    pub color: Color,
    pub line_width: f64,
    pub line_style: LineStyle,
    pub opacity: f64,
    /// Seconds after the start of the part before the element appears.
    pub start_after: Option<f64>,
    /// Seconds after the start of the part when the element stops changing.
    pub end_at: Option<f64>,
    /// Keep the last drawn primitives once the part is over.
    pub stay: bool,
    /// Explicit target; the part's default surface is used otherwise.
    pub surface: Option<SurfaceId>,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            effect: Effect::None,
            color: Color::WHITE,
            line_width: 2.0,
            line_style: LineStyle::Solid,
            opacity: 1.0,
            start_after: None,
            end_at: None,
            stay: true,
            surface: None,
        }
    }
}

impl ElementOptions {
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn start_after(mut self, seconds: f64) -> Self {
        self.start_after = Some(seconds);
        self
    }

    pub fn end_at(mut self, seconds: f64) -> Self {
        self.end_at = Some(seconds);
        self
    }

    pub fn stay(mut self, stay: bool) -> Self {
        self.stay = stay;
        self
    }

    pub fn on_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.line_width >= 0.0) {
            return Err(GeoAnimError::config(format!(
                "line width must be >= 0, got {}",
                self.line_width
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(GeoAnimError::config(format!(
                "opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if let Some(start) = self.start_after {
            if !(start >= 0.0) {
                return Err(GeoAnimError::config(format!(
                    "start_after must be >= 0, got {start}"
                )));
            }
        }
        if let Some(end) = self.end_at {
            if !(end > 0.0) {
                return Err(GeoAnimError::config(format!(
                    "end_at must be > 0, got {end}"
                )));
            }
            if let Some(start) = self.start_after {
                if end <= start {
                    return Err(GeoAnimError::config(format!(
                        "end_at ({end}) must come after start_after ({start})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stroke-only style carrying the effect's opacity.
    pub(crate) fn stroke_style(&self, look: Look) -> Style {
        Style {
            stroke: Some(self.color),
            fill: None,
            line_width: self.line_width,
            line_style: self.line_style,
            opacity: self.opacity * look.alpha,
        }
    }
}

/// Per-shape strategy: which effects apply and how to build primitives.
pub trait Draw {
    /// Human readable shape name, used in errors and logs.
    fn name(&self) -> &'static str;

    fn effects(&self) -> EffectTable;

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Segment(SegmentShape),
    Vector(VectorShape),
    Point(PointShape),
    Polygon(PolygonShape),
    Angle(AngleShape),
}

impl Draw for Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Segment(s) => s.name(),
            Shape::Vector(s) => s.name(),
            Shape::Point(s) => s.name(),
            Shape::Polygon(s) => s.name(),
            Shape::Angle(s) => s.name(),
        }
    }

    fn effects(&self) -> EffectTable {
        match self {
            Shape::Segment(s) => s.effects(),
            Shape::Vector(s) => s.effects(),
            Shape::Point(s) => s.effects(),
            Shape::Polygon(s) => s.effects(),
            Shape::Angle(s) => s.effects(),
        }
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        match self {
            Shape::Segment(s) => s.primitives(look, options),
            Shape::Vector(s) => s.primitives(look, options),
            Shape::Point(s) => s.primitives(look, options),
            Shape::Polygon(s) => s.primitives(look, options),
            Shape::Angle(s) => s.primitives(look, options),
        }
    }
}

impl From<SegmentShape> for Shape {
    fn from(shape: SegmentShape) -> Self {
        Shape::Segment(shape)
    }
}

impl From<VectorShape> for Shape {
    fn from(shape: VectorShape) -> Self {
        Shape::Vector(shape)
    }
}

impl From<PointShape> for Shape {
    fn from(shape: PointShape) -> Self {
        Shape::Point(shape)
    }
}

impl From<PolygonShape> for Shape {
    fn from(shape: PolygonShape) -> Self {
        Shape::Polygon(shape)
    }
}

impl From<AngleShape> for Shape {
    fn from(shape: AngleShape) -> Self {
        Shape::Angle(shape)
    }
}

/// Frames of a part during which an element draws, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CueWindow {
    pub start_frame_in_part: u64,
    pub end_frame_in_part: u64,
}

impl CueWindow {
    pub fn total_frames(&self) -> u64 {
        self.end_frame_in_part - self.start_frame_in_part + 1
    }

    pub fn contains(&self, frame_in_part: u64) -> bool {
        (self.start_frame_in_part..=self.end_frame_in_part).contains(&frame_in_part)
    }
}

#[derive(Debug, Clone)]
pub struct VisualElement {
    shape: Shape,
    options: ElementOptions,
    effects: EffectTable,
    state: EffectState,
    cue: Option<CueWindow>,
    surface: Option<SurfaceId>,
    current: Vec<PrimitiveHandle>,
    pending: Vec<Primitive>,
}

impl VisualElement {
    /// Builds an element, rejecting options the shape cannot honor.
    pub fn new(shape: impl Into<Shape>, options: ElementOptions) -> Result<Self> {
        let shape = shape.into();
        let effects = shape.effects();
        let mut element = Self {
            shape,
            options: ElementOptions::default(),
            effects,
            state: EffectState::default(),
            cue: None,
            surface: None,
            current: Vec::new(),
            pending: Vec::new(),
        };
        element.configure(options)?;
        Ok(element)
    }

    pub fn segment(a: impl Into<Point>, b: impl Into<Point>, options: ElementOptions) -> Result<Self> {
        Self::new(SegmentShape::new(Segment::new(a, b)), options)
    }

    pub fn vector(a: impl Into<Point>, b: impl Into<Point>, options: ElementOptions) -> Result<Self> {
        Self::new(VectorShape::new(Segment::new(a, b)), options)
    }

    pub fn point(at: impl Into<Point>, options: ElementOptions) -> Result<Self> {
        Self::new(PointShape::new(at.into()), options)
    }

    pub fn polygon(vertices: Vec<Point>, style: PolygonStyle, options: ElementOptions) -> Result<Self> {
        Self::new(PolygonShape::new(vertices, style)?, options)
    }

    pub fn angle(
        center: Option<Point>,
        seg1: Segment,
        seg2: Segment,
        style: AngleStyle,
        options: ElementOptions,
    ) -> Result<Self> {
        Self::new(AngleShape::new(center, seg1, seg2, style)?, options)
    }

    /// Replaces the element's options after validating them against the
    /// shape's effect table.
    pub fn configure(&mut self, options: ElementOptions) -> Result<()> {
        options.validate()?;
        if !self.effects.supports(options.effect) {
            return Err(GeoAnimError::unknown_effect(
                options.effect.name(),
                self.shape.name(),
            ));
        }
        self.surface = options.surface;
        self.options = options;
        Ok(())
    }

    /// Assigns the element's window inside its part and initialises the
    /// effect for that window.
    pub fn cue(
        &mut self,
        start_frame_in_part: u64,
        end_frame_in_part: u64,
        default_surface: SurfaceId,
    ) -> Result<()> {
        if end_frame_in_part < start_frame_in_part {
            return Err(GeoAnimError::config(format!(
                "{} would end (frame {end_frame_in_part}) before it starts (frame {start_frame_in_part})",
                self.shape.name()
            )));
        }

        let window = CueWindow {
            start_frame_in_part,
            end_frame_in_part,
        };
        self.cue = Some(window);
        self.surface.get_or_insert(default_surface);

        let entry = self
            .effects
            .get(self.options.effect)
            .ok_or_else(|| GeoAnimError::unknown_effect(self.options.effect.name(), self.shape.name()))?;
        self.state = EffectState::default();
        if let Some(init) = entry.init {
            init(&mut self.state, window.total_frames());
        }
        Ok(())
    }

    /// Draws the element for `frame_in_part`. Returns whether anything was
    /// drawn; frames outside the cue window leave the surface untouched.
    pub fn dispatch(&mut self, frame_in_part: u64, surface: &mut dyn RenderSurface) -> Result<bool> {
        let window = self.cue.ok_or_else(|| {
            GeoAnimError::config(format!("{} dispatched before being cued", self.shape.name()))
        })?;
        if !window.contains(frame_in_part) {
            return Ok(false);
        }

        let local = frame_in_part - window.start_frame_in_part;
        let entry = self
            .effects
            .get(self.options.effect)
            .ok_or_else(|| GeoAnimError::unknown_effect(self.options.effect.name(), self.shape.name()))?;
        let look = (entry.run)(&self.state, local);

        self.pending = self.shape.primitives(look, &self.options);
        self.draw(surface);
        Ok(true)
    }

    /// Detaches whatever the element currently shows. Safe to call repeatedly.
    pub fn remove_visual(&mut self, surface: &mut dyn RenderSurface) {
        for handle in self.current.drain(..) {
            surface.detach(handle);
        }
    }

    fn draw(&mut self, surface: &mut dyn RenderSurface) {
        self.remove_visual(surface);
        let target = self.surface.unwrap_or_default();
        self.current = self
            .pending
            .drain(..)
            .map(|primitive| surface.attach(target, primitive))
            .collect();
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn options(&self) -> &ElementOptions {
        &self.options
    }

    pub fn stay(&self) -> bool {
        self.options.stay
    }

    pub fn cue_window(&self) -> Option<CueWindow> {
        self.cue
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn is_visible(&self) -> bool {
        !self.current.is_empty()
    }

    pub fn current_handles(&self) -> &[PrimitiveHandle] {
        &self.current
    }
}
