use crate::{
    effect::{EffectTable, Look},
    geometry::Point,
    render::{MarkerGlyph, Primitive, PrimitiveKind},
};

use super::{Draw, ElementOptions};

const MARKER_SIZE_DEFAULT: f64 = 4.0;

/// A single marker glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct PointShape {
    at: Point,
    marker: MarkerGlyph,
    marker_size: f64,
}

impl PointShape {
    pub fn new(at: Point) -> Self {
        Self {
            at,
            marker: MarkerGlyph::default(),
            marker_size: MARKER_SIZE_DEFAULT,
        }
    }

    pub fn with_marker(mut self, marker: MarkerGlyph) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_marker_size(mut self, size: f64) -> Self {
        self.marker_size = size.max(0.0);
        self
    }

    pub fn at(&self) -> Point {
        self.at
    }
}

impl Draw for PointShape {
    fn name(&self) -> &'static str {
        "point"
    }

    fn effects(&self) -> EffectTable {
        EffectTable::static_shape()
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        let mut style = options.stroke_style(look);
        style.fill = Some(options.color);
        vec![Primitive::new(
            PrimitiveKind::Marker {
                at: self.at,
                glyph: self.marker,
                size: self.marker_size,
            },
            style,
        )]
    }
}
