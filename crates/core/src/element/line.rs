use crate::{
    effect::{EffectTable, Look},
    geometry::{Affine, Point, Segment},
    render::{Primitive, PrimitiveKind, Style},
};

use super::{Draw, ElementOptions};

const HEAD_WIDTH_DEFAULT: f64 = 0.15;
const HEAD_LENGTH_DEFAULT: f64 = 0.25;

/// Straight segment from `a` to `b`. Grow and shrink keep `a` fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentShape {
    segment: Segment,
}

impl SegmentShape {
    pub fn new(segment: Segment) -> Self {
        Self { segment }
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// Inclination in degrees, see [`crate::geometry::angle_of`].
    pub fn angle(&self) -> f64 {
        self.segment.angle()
    }
}

impl Draw for SegmentShape {
    fn name(&self) -> &'static str {
        "segment"
    }

    fn effects(&self) -> EffectTable {
        EffectTable::full()
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        let line = Primitive::new(
            PrimitiveKind::Line {
                from: self.segment.a,
                to: self.segment.b,
            },
            options.stroke_style(look),
        );

        if look.scale == 1.0 {
            vec![line]
        } else {
            vec![line.with_transform(Affine::scale_about(self.segment.a, look.scale))]
        }
    }
}

/// Segment with an arrow head at `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorShape {
    segment: Segment,
    head_width: f64,
    head_length: f64,
}

impl VectorShape {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            head_width: HEAD_WIDTH_DEFAULT,
            head_length: HEAD_LENGTH_DEFAULT,
        }
    }

    pub fn with_head_width(mut self, width: f64) -> Self {
        self.head_width = width.max(0.0);
        self
    }

    pub fn with_head_length(mut self, length: f64) -> Self {
        self.head_length = length.max(0.0);
        self
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    fn head(&self, tip: Point, visible: f64) -> Vec<Point> {
        let length = self.segment.length();
        let (ux, uy) = (
            (self.segment.b.x - self.segment.a.x) / length,
            (self.segment.b.y - self.segment.a.y) / length,
        );
        let head_length = self.head_length.min(visible);
        let half_width = self.head_width / 2.0;
        let base = Point::new(tip.x - ux * head_length, tip.y - uy * head_length);

        vec![
            tip,
            Point::new(base.x - uy * half_width, base.y + ux * half_width),
            Point::new(base.x + uy * half_width, base.y - ux * half_width),
        ]
    }
}

impl Draw for VectorShape {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn effects(&self) -> EffectTable {
        EffectTable::full()
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        let tip = self.segment.a.lerp(self.segment.b, look.scale);
        let stroke = options.stroke_style(look);
        let mut primitives = vec![Primitive::new(
            PrimitiveKind::Line {
                from: self.segment.a,
                to: tip,
            },
            stroke.clone(),
        )];

        let visible = self.segment.a.distance(tip);
        if visible > 0.0 && self.head_length > 0.0 {
            primitives.push(Primitive::new(
                PrimitiveKind::Polyline {
                    points: self.head(tip, visible),
                    closed: true,
                },
                Style {
                    fill: Some(options.color),
                    ..stroke
                },
            ));
        }
        primitives
    }
}
