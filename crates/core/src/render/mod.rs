//! Primitives handed to the rendering surface and the surface abstraction
//! itself.
//!
//! The core never rasterises anything. Elements build [`Primitive`] values
//! and hand them to a [`RenderSurface`], which decides how to draw, style and
//! export them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Affine, Point},
    GeoAnimError, Result,
};

/// RGBA color with 8-bit components. Serialised as `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with its alpha replaced by `alpha` in `[0, 1]`.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl FromStr for Color {
    type Err = GeoAnimError;

    /// Accepts single-letter and full color names (`w`, `white`, `r`, ...)
    /// and hex notation (`#rrggbb` or `#rrggbbaa`).
    fn from_str(s: &str) -> Result<Self> {
        let named = match s.trim().to_ascii_lowercase().as_str() {
            "w" | "white" => Some(Color::WHITE),
            "k" | "black" => Some(Color::BLACK),
            "r" | "red" => Some(Color::RED),
            "g" | "green" => Some(Color::GREEN),
            "b" | "blue" => Some(Color::BLUE),
            "y" | "yellow" => Some(Color::YELLOW),
            "c" | "cyan" => Some(Color::CYAN),
            "m" | "magenta" => Some(Color::MAGENTA),
            "gray" | "grey" => Some(Color::GRAY),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| GeoAnimError::config(format!("unknown color `{s}`")))?;
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| GeoAnimError::config(format!("malformed hex color `{s}`")))
        };
        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(GeoAnimError::config(format!("malformed hex color `{s}`"))),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = GeoAnimError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Dash pattern for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    #[serde(alias = "-")]
    Solid,
    #[serde(alias = "--")]
    Dashed,
    #[serde(alias = ":")]
    Dotted,
    #[serde(alias = "-.")]
    DashDot,
}

/// Marker glyph used by point elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerGlyph {
    #[default]
    #[serde(alias = "o")]
    Circle,
    #[serde(alias = "s")]
    Square,
    #[serde(alias = "^")]
    Triangle,
    #[serde(alias = "x")]
    Cross,
    #[serde(alias = "+")]
    Plus,
}

/// Visual style attached to a primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    pub line_width: f64,
    pub line_style: LineStyle,
    /// Global opacity multiplier in `[0, 1]`, applied on top of the colors'
    /// own alpha.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Some(Color::WHITE),
            fill: None,
            line_width: 2.0,
            line_style: LineStyle::Solid,
            opacity: 1.0,
        }
    }
}

/// Geometry of a primitive, in data coordinates before `transform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveKind {
    Line {
        from: Point,
        to: Point,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
    },
    Marker {
        at: Point,
        glyph: MarkerGlyph,
        size: f64,
    },
    /// Circular sector from `theta1` to `theta2`, counter-clockwise, degrees.
    Wedge {
        center: Point,
        radius: f64,
        theta1: f64,
        theta2: f64,
    },
    Text {
        at: Point,
        text: String,
    },
}

/// A single drawable handed to the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub style: Style,
    #[serde(default, skip_serializing_if = "Affine::is_identity")]
    pub transform: Affine,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind, style: Style) -> Self {
        Self {
            kind,
            style,
            transform: Affine::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Points of the primitive after its transform, useful to hosts that do
    /// not support transforms natively. Wedges and text report their anchor.
    pub fn transformed_points(&self) -> Vec<Point> {
        let raw = match &self.kind {
            PrimitiveKind::Line { from, to } => vec![*from, *to],
            PrimitiveKind::Polyline { points, .. } => points.clone(),
            PrimitiveKind::Marker { at, .. } | PrimitiveKind::Text { at, .. } => vec![*at],
            PrimitiveKind::Wedge { center, .. } => vec![*center],
        };
        raw.into_iter().map(|p| self.transform.apply(p)).collect()
    }
}

/// Identifies one drawing target (an axes) on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// Opaque handle returned by [`RenderSurface::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrimitiveHandle(pub u64);

/// Rendering backend collaborator.
///
/// The engine only ever attaches and detaches primitives; drawing, styling
/// and export are the implementor's business.
pub trait RenderSurface {
    /// Adds `primitive` to `target` and returns a handle for later removal.
    fn attach(&mut self, target: SurfaceId, primitive: Primitive) -> PrimitiveHandle;

    /// Removes a previously attached primitive.
    fn detach(&mut self, handle: PrimitiveHandle);

    /// Called by the driver after every element of a tick has been
    /// dispatched.
    fn end_frame(&mut self, _frame: u64) {}
}
