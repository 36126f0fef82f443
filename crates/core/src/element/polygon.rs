use serde::{Deserialize, Serialize};

use crate::{
    effect::{EffectTable, Look},
    geometry::{Point, Polygon, Segment},
    render::{Color, Primitive, PrimitiveKind, Style},
    Result,
};

use super::{Draw, ElementOptions, VisualElement};

/// Edge and face channels of a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonStyle {
    /// Falls back to the element's `color` when unset.
    #[serde(alias = "edgecolor")]
    pub edge_color: Option<Color>,
    #[serde(alias = "facecolor")]
    pub face_color: Color,
    #[serde(alias = "edgealpha")]
    pub edge_alpha: f64,
    #[serde(alias = "facealpha")]
    pub face_alpha: f64,
    pub fill: bool,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            edge_color: None,
            face_color: Color::YELLOW,
            edge_alpha: 1.0,
            face_alpha: 0.5,
            fill: true,
        }
    }
}

/// Closed path over a vertex list.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    polygon: Polygon,
    style: PolygonStyle,
}

impl PolygonShape {
    pub fn new(vertices: Vec<Point>, style: PolygonStyle) -> Result<Self> {
        Ok(Self {
            polygon: Polygon::new(vertices)?,
            style,
        })
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn sides(&self) -> Vec<Segment> {
        self.polygon.sides()
    }

    /// One segment element per side, so the boundary can be drawn (or grown)
    /// side by side.
    pub fn side_elements(&self, options: &ElementOptions) -> Result<Vec<VisualElement>> {
        self.sides()
            .into_iter()
            .map(|side| VisualElement::segment(side.a, side.b, options.clone()))
            .collect()
    }
}

impl Draw for PolygonShape {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn effects(&self) -> EffectTable {
        EffectTable::static_shape()
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        let edge = self.style.edge_color.unwrap_or(options.color);
        let style = Style {
            stroke: Some(edge.with_alpha(self.style.edge_alpha)),
            fill: self
                .style
                .fill
                .then(|| self.style.face_color.with_alpha(self.style.face_alpha)),
            line_width: options.line_width,
            line_style: options.line_style,
            opacity: options.opacity * look.alpha,
        };

        vec![Primitive::new(
            PrimitiveKind::Polyline {
                points: self.polygon.vertices().to_vec(),
                closed: true,
            },
            style,
        )]
    }
}
