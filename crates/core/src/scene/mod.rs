use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    effect::Effect,
    element::{
        AngleShape, AngleStyle, ElementOptions, PointShape, PolygonShape, PolygonStyle, SegmentShape, Shape,
        VectorShape, VisualElement,
    },
    geometry::{Point, Segment},
    render::{Color, LineStyle, MarkerGlyph, RenderSurface, SurfaceId},
    timeline::{self, FrameDriver, Part, Playback, Tick},
    GeoAnimError, Result, SceneConfig,
};

/// Ordered sequence of parts played one after another.
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    parts: Vec<Part>,
    default_surface: SurfaceId,
    last_frame: Option<u64>,
    ticker: Option<Vec<Tick>>,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parts: Vec::new(),
            default_surface: SurfaceId::default(),
            last_frame: None,
            ticker: None,
        })
    }

    /// Surface used by elements that do not name one.
    pub fn with_default_surface(mut self, surface: SurfaceId) -> Self {
        self.default_surface = surface;
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Last absolute frame taken by the cued parts.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Appends a part whose elements run concurrently for `duration` seconds.
    /// Returns the part's index.
    pub fn add_part(&mut self, script: Vec<VisualElement>, duration: f64) -> Result<usize> {
        let index = self.parts.len();
        let part = Part::new(index, script, duration, self.default_surface)?;
        if self.config.frames_for(duration)? == 0 {
            return Err(GeoAnimError::config(format!(
                "duration ({duration}) is shorter than one frame at {} fps",
                self.config.fps
            )));
        }

        self.parts.push(part);
        self.ticker = None;
        Ok(index)
    }

    /// Assigns frame windows to every part and element. Running it again
    /// recomputes the same windows.
    pub fn cue_parts(&mut self) -> Result<()> {
        let mut last_taken = None;
        for part in &mut self.parts {
            let range = part.cue(last_taken, &self.config)?;
            last_taken = Some(range.end);
        }

        self.last_frame = last_taken;
        self.ticker = None;
        tracing::debug!(parts = self.parts.len(), last_frame = ?self.last_frame, "cued scene");
        Ok(())
    }

    /// Every `(part, frame_in_part)` pair of the scene, in playback order.
    /// Parts must be cued first.
    pub fn build_ticker(&mut self) -> Result<&[Tick]> {
        if self.parts.iter().any(|part| part.frames().is_none()) {
            return Err(GeoAnimError::config("scene must be cued before building its ticker"));
        }

        let parts = &self.parts;
        let ticker = self
            .ticker
            .get_or_insert_with(|| parts.iter().flat_map(Part::ticker).collect());
        Ok(ticker.as_slice())
    }

    /// Cues the scene and packages its ticker for a host loop.
    pub fn playback(&mut self) -> Result<Playback> {
        self.cue_parts()?;
        let interval_ms = self.config.interval_ms();
        let last_frame = self.last_frame;
        let ticker = self.build_ticker()?.to_vec();
        Ok(Playback {
            ticker,
            interval_ms,
            last_frame,
        })
    }

    pub fn dispatch(&mut self, tick: Tick, surface: &mut dyn RenderSurface) -> Result<()> {
        timeline::dispatch_tick(&mut self.parts, tick, surface)
    }

    /// Cues the scene and hands its ticker and dispatch step to `driver`.
    /// Cueing errors surface before any frame is dispatched.
    pub fn render<D: FrameDriver>(&mut self, driver: &mut D) -> Result<()> {
        let playback = self.playback()?;
        tracing::info!(
            parts = self.parts.len(),
            frames = playback.frame_count(),
            interval_ms = playback.interval_ms,
            "rendering scene"
        );

        driver.drive(&playback, &mut |tick: Tick, surface: &mut dyn RenderSurface| {
            timeline::dispatch_tick(&mut self.parts, tick, surface)
        })?;

        tracing::info!("scene rendered");
        Ok(())
    }

    pub fn from_description(description: SceneDescription) -> Result<Self> {
        let mut scene = Scene::new(description.config)?;
        for part in description.parts {
            let script = part
                .actions
                .into_iter()
                .map(ActionDescription::into_element)
                .collect::<Result<Vec<_>>>()?;
            scene.add_part(script, part.duration)?;
        }
        Ok(scene)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let description: SceneDescription = serde_json::from_str(json)?;
        Self::from_description(description)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Serialised form of a scene: a configuration plus its parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    #[serde(default)]
    pub config: SceneConfig,
    pub parts: Vec<PartDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartDescription {
    pub duration: f64,
    pub actions: Vec<ActionDescription>,
}

/// One scripted element: a shape plus the options shared by every element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescription {
    #[serde(flatten)]
    pub shape: ShapeDescription,
    #[serde(flatten)]
    pub options: ActionOptions,
    /// Keys not consumed by `options`. Shape fields land here too and are
    /// filtered out before the rest is reported.
    #[serde(flatten, skip_serializing)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

impl ActionDescription {
    pub fn into_element(self) -> Result<VisualElement> {
        let shape_name = self.shape.name();
        let known = self.shape.field_names();
        let unknown: Vec<&str> = self
            .rest
            .keys()
            .map(String::as_str)
            .filter(|key| *key != "shape" && !known.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(GeoAnimError::config(format!(
                "unknown {shape_name} option(s): {}",
                unknown.join(", ")
            )));
        }

        let options = self.options.merge_over(ElementOptions::default(), shape_name)?;
        let shape: Shape = match self.shape {
            ShapeDescription::Segment { a, b } => SegmentShape::new(Segment { a, b }).into(),
            ShapeDescription::Vector {
                a,
                b,
                head_width,
                head_length,
            } => {
                let mut vector = VectorShape::new(Segment { a, b });
                if let Some(width) = head_width {
                    vector = vector.with_head_width(width);
                }
                if let Some(length) = head_length {
                    vector = vector.with_head_length(length);
                }
                vector.into()
            }
            ShapeDescription::Point {
                at,
                marker,
                marker_size,
            } => {
                let mut point = PointShape::new(at).with_marker(marker);
                if let Some(size) = marker_size {
                    point = point.with_marker_size(size);
                }
                point.into()
            }
            ShapeDescription::Polygon { vertices, style } => {
                PolygonShape::new(vertices, style)?.into()
            }
            ShapeDescription::Angle {
                center,
                seg1,
                seg2,
                style,
            } => AngleShape::new(
                center,
                Segment::new(seg1[0], seg1[1]),
                Segment::new(seg2[0], seg2[1]),
                style,
            )?
            .into(),
        };
        VisualElement::new(shape, options)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ShapeDescription {
    Segment {
        #[serde(alias = "point_a")]
        a: Point,
        #[serde(alias = "point_b")]
        b: Point,
    },
    Vector {
        #[serde(alias = "point_a")]
        a: Point,
        #[serde(alias = "point_b")]
        b: Point,
        #[serde(default)]
        head_width: Option<f64>,
        #[serde(default)]
        head_length: Option<f64>,
    },
    Point {
        #[serde(alias = "coords")]
        at: Point,
        #[serde(default)]
        marker: MarkerGlyph,
        #[serde(default, alias = "markersize")]
        marker_size: Option<f64>,
    },
    Polygon {
        vertices: Vec<Point>,
        #[serde(default)]
        style: PolygonStyle,
    },
    Angle {
        #[serde(default)]
        center: Option<Point>,
        seg1: [Point; 2],
        seg2: [Point; 2],
        #[serde(default)]
        style: AngleStyle,
    },
}

impl ShapeDescription {
    /// Every key the shape accepts, aliases included.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            ShapeDescription::Segment { .. } => &["a", "b", "point_a", "point_b"],
            ShapeDescription::Vector { .. } => {
                &["a", "b", "point_a", "point_b", "head_width", "head_length"]
            }
            ShapeDescription::Point { .. } => &["at", "coords", "marker", "marker_size", "markersize"],
            ShapeDescription::Polygon { .. } => &["vertices", "style"],
            ShapeDescription::Angle { .. } => &["center", "seg1", "seg2", "style"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeDescription::Segment { .. } => "segment",
            ShapeDescription::Vector { .. } => "vector",
            ShapeDescription::Point { .. } => "point",
            ShapeDescription::Polygon { .. } => "polygon",
            ShapeDescription::Angle { .. } => "angle",
        }
    }
}

/// Element options as written in a description; anything left out keeps the
/// element default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionOptions {
    pub effect: Option<String>,
    pub color: Option<Color>,
    #[serde(rename = "linewidth")]
    pub line_width: Option<f64>,
    #[serde(rename = "linestyle")]
    pub line_style: Option<LineStyle>,
    pub opacity: Option<f64>,
    #[serde(alias = "startAfter")]
    pub start_after: Option<f64>,
    #[serde(alias = "endAt")]
    pub end_at: Option<f64>,
    pub stay: Option<bool>,
    #[serde(alias = "ax")]
    pub surface: Option<SurfaceId>,
}

impl ActionOptions {
    /// Overlays the written options on `defaults`. Effect names are resolved
    /// here, so a typo fails as an unknown effect of `shape`.
    pub fn merge_over(self, defaults: ElementOptions, shape: &'static str) -> Result<ElementOptions> {
        let effect = match self.effect {
            Some(name) => name
                .parse::<Effect>()
                .map_err(|_| GeoAnimError::unknown_effect(name, shape))?,
            None => defaults.effect,
        };

        Ok(ElementOptions {
            effect,
            color: self.color.unwrap_or(defaults.color),
            line_width: self.line_width.unwrap_or(defaults.line_width),
            line_style: self.line_style.unwrap_or(defaults.line_style),
            opacity: self.opacity.unwrap_or(defaults.opacity),
            start_after: self.start_after.or(defaults.start_after),
            end_at: self.end_at.or(defaults.end_at),
            stay: self.stay.unwrap_or(defaults.stay),
            surface: self.surface.or(defaults.surface),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::RecordingSurface, timeline::SteppingDriver};

    fn segment(options: ElementOptions) -> VisualElement {
        VisualElement::segment((0.0, 0.0), (2.0, 0.0), options).unwrap()
    }

    fn scene(fps: u32) -> Scene {
        Scene::new(SceneConfig::with_fps(fps)).unwrap()
    }

    #[test]
    fn add_part_validates_input() {
        let mut s = scene(10);
        assert!(matches!(s.add_part(Vec::new(), 1.0), Err(GeoAnimError::Config(_))));
        assert!(matches!(
            s.add_part(vec![segment(ElementOptions::default())], 0.0),
            Err(GeoAnimError::Config(_))
        ));
        assert!(s.add_part(vec![segment(ElementOptions::default())], 0.01).is_err());
        assert_eq!(s.add_part(vec![segment(ElementOptions::default())], 1.0).unwrap(), 0);
        assert_eq!(s.add_part(vec![segment(ElementOptions::default())], 1.0).unwrap(), 1);
    }

    #[test]
    fn parts_are_contiguous() {
        let mut s = scene(24);
        for duration in [1.0, 0.5, 2.25, 1.0 / 3.0] {
            s.add_part(vec![segment(ElementOptions::default())], duration).unwrap();
        }
        s.cue_parts().unwrap();

        let ranges: Vec<_> = s.parts().iter().map(|p| p.frames().unwrap()).collect();
        assert_eq!(ranges[0].start, 0);
        for (part, range) in s.parts().iter().zip(&ranges) {
            assert_eq!(range.len(), s.config().frames_for(part.duration()).unwrap());
        }
        for pair in ranges.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + 1);
        }
        assert_eq!(s.last_frame(), Some(ranges[3].end));
    }

    #[test]
    fn cue_parts_is_repeatable() {
        let mut s = scene(10);
        s.add_part(vec![segment(ElementOptions::default())], 1.0).unwrap();
        s.add_part(vec![segment(ElementOptions::default())], 2.0).unwrap();
        s.cue_parts().unwrap();
        let first = s.build_ticker().unwrap().to_vec();
        s.cue_parts().unwrap();
        assert_eq!(s.build_ticker().unwrap(), first.as_slice());
        assert_eq!(s.last_frame(), Some(29));
    }

    #[test]
    fn ticker_requires_cueing_and_concatenates_parts() {
        let mut s = scene(2);
        s.add_part(vec![segment(ElementOptions::default())], 1.0).unwrap();
        s.add_part(vec![segment(ElementOptions::default())], 1.5).unwrap();
        assert!(s.build_ticker().is_err());

        s.cue_parts().unwrap();
        assert_eq!(
            s.build_ticker().unwrap(),
            &[
                Tick::new(0, 0),
                Tick::new(0, 1),
                Tick::new(1, 0),
                Tick::new(1, 1),
                Tick::new(1, 2),
            ]
        );
    }

    #[test]
    fn transient_elements_vanish_exactly_at_next_part() {
        let mut s = scene(4);
        s.add_part(
            vec![
                segment(ElementOptions::default().stay(false)),
                segment(ElementOptions::default()),
            ],
            1.0,
        )
        .unwrap();
        s.add_part(vec![segment(ElementOptions::default().start_after(0.5))], 1.0)
            .unwrap();

        let playback = s.playback().unwrap();
        let mut surface = RecordingSurface::new();
        let mut visible = Vec::new();
        for tick in &playback.ticker {
            s.dispatch(*tick, &mut surface).unwrap();
            visible.push(s.parts()[0].script()[0].is_visible());
            assert!(s.parts()[0].script()[1].is_visible());
        }

        assert_eq!(
            visible,
            vec![true, true, true, true, false, false, false, false]
        );
    }

    #[test]
    fn late_elements_stay_hidden_until_their_start() {
        let mut s = scene(4);
        s.add_part(vec![segment(ElementOptions::default().start_after(0.5))], 1.0)
            .unwrap();
        let playback = s.playback().unwrap();
        let mut surface = RecordingSurface::new();

        s.dispatch(playback.ticker[1], &mut surface).unwrap();
        assert_eq!(surface.attach_count(), 0);
        s.dispatch(playback.ticker[2], &mut surface).unwrap();
        assert_eq!(surface.attach_count(), 1);
    }

    #[test]
    fn render_records_every_frame() {
        let mut s = scene(10);
        s.add_part(
            vec![segment(ElementOptions::default().with_effect(Effect::Grow))],
            1.0,
        )
        .unwrap();
        s.add_part(
            vec![segment(ElementOptions::default().with_effect(Effect::FadeOut))],
            0.5,
        )
        .unwrap();

        let mut driver = SteppingDriver::new(RecordingSurface::new());
        s.render(&mut driver).unwrap();

        let surface = driver.into_surface();
        assert_eq!(surface.frames().len(), 15);
        assert_eq!(surface.frames()[14].primitives.len(), 2);
        let last = &surface.frames()[14].primitives[1].primitive;
        assert_eq!(last.style.opacity, 0.0);
    }

    #[test]
    fn cueing_errors_abort_before_rendering() {
        let mut s = scene(10);
        s.add_part(vec![segment(ElementOptions::default().start_after(5.0))], 1.0)
            .unwrap();
        let mut driver = SteppingDriver::new(RecordingSurface::new());
        assert!(s.render(&mut driver).is_err());
        assert_eq!(driver.frames_run(), 0);
    }

    #[test]
    fn loads_a_description() {
        let json = r#"{
            "config": {"fps": 10},
            "parts": [
                {"duration": 1, "actions": [
                    {"shape": "segment", "a": [0, 0], "b": [0, 2], "effect": "fadein", "color": "r"},
                    {"shape": "segment", "a": [0, 0], "b": [2, 0], "effect": "grow", "stay": false}
                ]},
                {"duration": 2, "actions": [
                    {"shape": "angle", "center": [0, 0], "seg1": [[0, 0], [2, 0]], "seg2": [[0, 0], [0, 2]],
                     "effect": "fadein", "style": {"facecolor": "green"}},
                    {"shape": "polygon", "vertices": [[1, 1], [3, 1], [2, 3]], "linewidth": 1.5,
                     "start_after": 0.5, "end_at": 1.5},
                    {"shape": "point", "coords": [4, 4], "marker": "s"},
                    {"shape": "vector", "point_a": [0, 0], "point_b": [4, 3], "linestyle": "--"}
                ]}
            ]
        }"#;

        let mut s = Scene::from_json(json).unwrap();
        assert_eq!(s.parts().len(), 2);
        assert_eq!(s.parts()[1].script().len(), 4);
        assert_eq!(s.parts()[0].script()[0].options().color, Color::RED);
        assert!(!s.parts()[0].script()[1].stay());

        let playback = s.playback().unwrap();
        assert_eq!(playback.frame_count(), 30);
        assert_eq!(playback.last_frame, Some(29));
        assert!((playback.interval_ms - 100.0).abs() < 1e-12);
        let polygon = s.parts()[1].script()[1].cue_window().unwrap();
        assert_eq!((polygon.start_frame_in_part, polygon.end_frame_in_part), (5, 14));
    }

    #[test]
    fn description_accepts_camel_case_options() {
        let json = r#"{"config": {"fps": 10}, "parts": [{"duration": 2, "actions": [
            {"shape": "segment", "a": [0, 0], "b": [1, 0], "startAfter": 0.5, "endAt": 1.5, "ax": 3}
        ]}]}"#;
        let mut s = Scene::from_json(json).unwrap();
        let element = &s.parts()[0].script()[0];
        assert_eq!(element.options().start_after, Some(0.5));
        assert_eq!(element.options().end_at, Some(1.5));
        assert_eq!(element.surface(), Some(SurfaceId(3)));

        s.cue_parts().unwrap();
        let window = s.parts()[0].script()[0].cue_window().unwrap();
        assert_eq!((window.start_frame_in_part, window.end_frame_in_part), (5, 14));
    }

    #[test]
    fn description_rejects_misspelled_keys() {
        let json = r#"{"parts": [{"duration": 1, "actions": [
            {"shape": "segment", "a": [0, 0], "b": [1, 0], "efect": "grow", "strt_after": 1.0}
        ]}]}"#;
        match Scene::from_json(json).unwrap_err() {
            GeoAnimError::Config(msg) => {
                assert!(msg.contains("efect"), "{msg}");
                assert!(msg.contains("strt_after"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let json = r#"{"parts": [{"duration": 1, "actions": [
            {"shape": "point", "coords": [0, 0], "markersize": 3, "color": "r"}
        ]}]}"#;
        assert!(Scene::from_json(json).is_ok());

        let json = r#"{"parts": [{"duration": 1, "length": 3, "actions": [
            {"shape": "point", "at": [0, 0]}
        ]}]}"#;
        assert!(matches!(Scene::from_json(json), Err(GeoAnimError::Json(_))));
    }

    #[test]
    fn unknown_effect_in_description_names_the_shape() {
        let json = r#"{"parts": [{"duration": 1, "actions": [
            {"shape": "point", "at": [0, 0], "effect": "sparkle"}
        ]}]}"#;
        match Scene::from_json(json).unwrap_err() {
            GeoAnimError::UnknownEffect { effect, shape } => {
                assert_eq!(effect, "sparkle");
                assert_eq!(shape, "point");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn description_rejects_angles_that_do_not_meet() {
        let json = r#"{"parts": [{"duration": 1, "actions": [
            {"shape": "angle", "seg1": [[0, 0], [1, 0]], "seg2": [[0, 1], [1, 1]]}
        ]}]}"#;
        assert!(matches!(
            Scene::from_json(json),
            Err(GeoAnimError::Geometry(_))
        ));
    }
}
