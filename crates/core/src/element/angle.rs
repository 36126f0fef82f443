use serde::{Deserialize, Serialize};

use crate::{
    effect::{EffectTable, Look},
    geometry::{self, Affine, Point, Segment},
    render::{Color, Primitive, PrimitiveKind, Style},
    GeoAnimError, Result,
};

use super::{Draw, ElementOptions};

/// Side of the right-angle marker relative to the radius.
const RIGHT_MARKER_RATIO: f64 = 0.4;
/// Distance of the label from the center relative to the radius.
const LABEL_RATIO: f64 = 1.3;

/// Edge and face channels of an angle, plus its radius and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleStyle {
    pub radius: f64,
    /// Falls back to the element's `color` when unset.
    #[serde(alias = "edgecolor")]
    pub edge_color: Option<Color>,
    #[serde(alias = "facecolor")]
    pub face_color: Color,
    #[serde(alias = "edgealpha")]
    pub edge_alpha: f64,
    #[serde(alias = "facealpha")]
    pub face_alpha: f64,
    pub label: Option<String>,
}

impl Default for AngleStyle {
    fn default() -> Self {
        Self {
            radius: 1.0,
            edge_color: None,
            face_color: Color::YELLOW,
            edge_alpha: 1.0,
            face_alpha: 0.5,
            label: None,
        }
    }
}

/// Angle between two segments that meet.
///
/// Drawn as a wedge from `seg1`'s inclination counter-clockwise to `seg2`'s,
/// or as a square bracket when the two are perpendicular.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleShape {
    center: Point,
    seg1: Segment,
    seg2: Segment,
    theta1: f64,
    theta2: f64,
    right: bool,
    style: AngleStyle,
}

impl AngleShape {
    /// Fails with a geometry error unless the segments intersect or both pass
    /// through `center`. Without an explicit center the intersection is used.
    /// The intersection test is exact, so an endpoint shared within
    /// [`Segment::contains`] tolerance also counts as meeting there.
    pub fn new(center: Option<Point>, seg1: Segment, seg2: Segment, style: AngleStyle) -> Result<Self> {
        if !(style.radius > 0.0) {
            return Err(GeoAnimError::config(format!(
                "angle radius must be > 0, got {}",
                style.radius
            )));
        }

        let meeting = geometry::intersect(&seg1, &seg2, false).or_else(|| {
            geometry::intersect(&seg1, &seg2, true)?;
            [seg1.a, seg1.b]
                .into_iter()
                .find(|&end| seg2.contains(end))
                .or_else(|| [seg2.a, seg2.b].into_iter().find(|&end| seg1.contains(end)))
        });
        let center = match (center, meeting) {
            (Some(center), _) if seg1.contains(center) && seg2.contains(center) => center,
            (Some(center), Some(_)) => {
                return Err(GeoAnimError::geometry(format!(
                    "segments meet, but not at the given center {center}"
                )))
            }
            (None, Some(point)) => point,
            (_, None) => {
                return Err(GeoAnimError::geometry(format!(
                    "segments {:?} and {:?} do not intersect",
                    seg1, seg2
                )))
            }
        };

        let theta1 = geometry::round_degrees(geometry::angle_of(&seg1));
        let theta2 = geometry::round_degrees(geometry::angle_of(&seg2));

        Ok(Self {
            center,
            seg1,
            seg2,
            theta1,
            theta2,
            right: geometry::is_right_angle(theta1, theta2),
            style,
        })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn segments(&self) -> (Segment, Segment) {
        (self.seg1, self.seg2)
    }

    /// Start and end inclination in degrees.
    pub fn span(&self) -> (f64, f64) {
        (self.theta1, self.theta2)
    }

    pub fn is_right(&self) -> bool {
        self.right
    }

    fn bisector(&self) -> f64 {
        let sweep = (self.theta2 - self.theta1).rem_euclid(360.0);
        self.theta1 + sweep / 2.0
    }

    fn right_marker(&self, edge: Style, face: Style) -> Vec<Primitive> {
        let side = self.style.radius * RIGHT_MARKER_RATIO;
        let placement = Affine::rotate_degrees(self.theta1)
            .then(Affine::translate(self.center.x, self.center.y));

        let square = Primitive::new(
            PrimitiveKind::Polyline {
                points: vec![
                    Point::ORIGIN,
                    Point::new(side, 0.0),
                    Point::new(side, side),
                    Point::new(0.0, side),
                ],
                closed: true,
            },
            face,
        )
        .with_transform(placement);

        let bracket = Primitive::new(
            PrimitiveKind::Polyline {
                points: vec![
                    Point::new(side, 0.0),
                    Point::new(side, side),
                    Point::new(0.0, side),
                ],
                closed: false,
            },
            edge,
        )
        .with_transform(placement);

        vec![square, bracket]
    }
}

impl Draw for AngleShape {
    fn name(&self) -> &'static str {
        "angle"
    }

    fn effects(&self) -> EffectTable {
        EffectTable::static_shape()
    }

    fn primitives(&self, look: Look, options: &ElementOptions) -> Vec<Primitive> {
        let opacity = options.opacity * look.alpha;
        let edge_color = self
            .style
            .edge_color
            .unwrap_or(options.color)
            .with_alpha(self.style.edge_alpha);
        let face_color = self.style.face_color.with_alpha(self.style.face_alpha);
        let edge = Style {
            stroke: Some(edge_color),
            fill: None,
            line_width: options.line_width,
            line_style: options.line_style,
            opacity,
        };

        let mut primitives = if self.right {
            let face = Style {
                stroke: None,
                fill: Some(face_color),
                ..edge.clone()
            };
            self.right_marker(edge.clone(), face)
        } else {
            vec![Primitive::new(
                PrimitiveKind::Wedge {
                    center: self.center,
                    radius: self.style.radius,
                    theta1: self.theta1,
                    theta2: self.theta2,
                },
                Style {
                    fill: Some(face_color),
                    ..edge.clone()
                },
            )]
        };

        if let Some(label) = &self.style.label {
            primitives.push(Primitive::new(
                PrimitiveKind::Text {
                    at: self
                        .center
                        .polar(self.style.radius * LABEL_RATIO, self.bisector()),
                    text: label.clone(),
                },
                Style {
                    stroke: None,
                    fill: Some(edge_color),
                    ..edge
                },
            ));
        }
        primitives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(a: (f64, f64), b: (f64, f64)) -> Segment {
        Segment::new(a, b)
    }

    #[test]
    fn segments_that_never_meet_are_rejected() {
        let err = AngleShape::new(
            None,
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((3.0, 1.0), (3.0, 2.0)),
            AngleStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeoAnimError::Geometry(_)));
    }

    #[test]
    fn fractional_shared_endpoint_becomes_the_center() {
        let corner = (0.1, 0.7);
        let angle = AngleShape::new(
            None,
            seg((0.3, 0.1), corner),
            seg(corner, (1.7, 2.9)),
            AngleStyle::default(),
        )
        .unwrap();
        let center = angle.center();
        assert!((center.x - 0.1).abs() < 1e-9 && (center.y - 0.7).abs() < 1e-9);

        let err = AngleShape::new(
            None,
            seg((0.0, 0.0), (0.1, 0.0)),
            seg((0.1, 0.0), (0.3, 0.0)),
            AngleStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeoAnimError::Geometry(_)));
    }

    #[test]
    fn center_defaults_to_intersection() {
        let angle = AngleShape::new(
            None,
            seg((0.0, 0.0), (2.0, 2.0)),
            seg((0.0, 2.0), (2.0, 0.0)),
            AngleStyle::default(),
        )
        .unwrap();
        let center = angle.center();
        assert!((center.x - 1.0).abs() < 1e-9 && (center.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shared_endpoint_is_accepted_as_center() {
        let angle = AngleShape::new(
            Some(Point::new(0.0, 0.0)),
            seg((0.0, 0.0), (2.0, 1.0)),
            seg((0.0, 0.0), (3.0, 5.0)),
            AngleStyle::default(),
        )
        .unwrap();
        assert!(!angle.is_right());
        let primitives = angle.primitives(Look::FULL, &ElementOptions::default());
        assert_eq!(primitives.len(), 1);
        match &primitives[0].kind {
            PrimitiveKind::Wedge {
                center,
                radius,
                theta1,
                theta2,
            } => {
                assert_eq!(*center, Point::ORIGIN);
                assert_eq!(*radius, 1.0);
                assert!((theta1 - 26.565051).abs() < 1e-6);
                assert!((theta2 - 59.036243).abs() < 1e-6);
            }
            other => panic!("expected wedge, got {other:?}"),
        }
    }

    #[test]
    fn perpendicular_segments_draw_a_bracket() {
        let angle = AngleShape::new(
            Some(Point::new(0.0, 0.0)),
            seg((0.0, 0.0), (2.0, 0.0)),
            seg((0.0, 0.0), (0.0, 2.0)),
            AngleStyle::default(),
        )
        .unwrap();
        assert!(angle.is_right());

        let primitives = angle.primitives(Look::FULL, &ElementOptions::default());
        assert_eq!(primitives.len(), 2);
        assert!(primitives
            .iter()
            .all(|p| matches!(p.kind, PrimitiveKind::Polyline { .. })));
        assert_eq!(primitives[0].style.stroke, None);
        assert!(primitives[1].style.stroke.is_some());
    }

    #[test]
    fn bracket_rotates_with_first_segment() {
        let angle = AngleShape::new(
            Some(Point::new(1.0, 1.0)),
            seg((1.0, 1.0), (3.0, 3.0)),
            seg((1.0, 1.0), (-1.0, 3.0)),
            AngleStyle::default(),
        )
        .unwrap();
        assert!(angle.is_right());

        let primitives = angle.primitives(Look::FULL, &ElementOptions::default());
        let corner = primitives[1].transformed_points()[1];
        let expected = 0.4 * std::f64::consts::SQRT_2;
        assert!((corner.x - 1.0).abs() < 1e-9);
        assert!((corner.y - (1.0 + expected)).abs() < 1e-9);
    }

    #[test]
    fn wraparound_right_angle() {
        let angle = AngleShape::new(
            Some(Point::new(0.0, 0.0)),
            seg((0.0, 0.0), (0.0, -2.0)),
            seg((0.0, 0.0), (2.0, 0.0)),
            AngleStyle::default(),
        )
        .unwrap();
        assert_eq!(angle.span(), (270.0, 0.0));
        assert!(angle.is_right());
    }

    #[test]
    fn label_sits_on_the_bisector() {
        let angle = AngleShape::new(
            Some(Point::new(0.0, 0.0)),
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((0.0, 0.0), (-1.0, 0.0001)),
            AngleStyle {
                label: Some("alpha".to_string()),
                ..AngleStyle::default()
            },
        )
        .unwrap();

        let primitives = angle.primitives(Look::FULL, &ElementOptions::default());
        let label = primitives.last().unwrap();
        match &label.kind {
            PrimitiveKind::Text { at, text } => {
                assert_eq!(text, "alpha");
                assert!(at.x.abs() < 1e-3);
                assert!((at.y - 1.3).abs() < 1e-6);
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn center_off_both_segments_is_rejected() {
        let err = AngleShape::new(
            Some(Point::new(5.0, 5.0)),
            seg((0.0, 0.0), (2.0, 2.0)),
            seg((0.0, 2.0), (2.0, 0.0)),
            AngleStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeoAnimError::Geometry(_)));
    }
}
