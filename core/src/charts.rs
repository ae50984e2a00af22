//! Chart artifacts and rasterization.
//!
//! A `ChartArtifact` is a vector description of one chart: categories,
//! series and colors, no pixels. The report embeds bitmaps only, so each
//! artifact goes through a `Rasterizer` first. The plotters/PNG
//! implementation needs the `report` feature; without it every
//! rasterization reports `OptionalDependencyUnavailable`.

use crate::{
    contamination_index::contaminant_ratios,
    error::{PurifierError, SimResult},
    projection::ProjectedSample,
    recommendation::FilterComparison,
    sample::WaterSample,
};
use serde::{Deserialize, Serialize};

pub const RED: [u8; 3] = [217, 83, 79];
pub const GREEN: [u8; 3] = [92, 184, 92];
pub const BLUE: [u8; 3] = [31, 119, 180];
pub const ORANGE: [u8; 3] = [255, 127, 14];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    FilterComparison,
    ContaminationRadar,
    BeforeAfter,
    TdsBeforeAfter,
}

impl ChartKind {
    pub fn asset_name(&self) -> &'static str {
        match self {
            Self::FilterComparison   => "filter_comparison.png",
            Self::ContaminationRadar => "contamination_radar.png",
            Self::BeforeAfter        => "before_after.png",
            Self::TdsBeforeAfter     => "tds_before_after.png",
        }
    }

    /// Bitmap size used when embedding the chart in a report.
    pub fn raster_size(&self) -> (u32, u32) {
        match self {
            Self::FilterComparison | Self::BeforeAfter => (1000, 500),
            Self::ContaminationRadar                   => (600, 600),
            Self::TdsBeforeAfter                       => (600, 400),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarSeries {
    pub label:  String,
    pub color:  [u8; 3],
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartShape {
    GroupedBars {
        categories: Vec<String>,
        value_axis: String,
        series:     Vec<BarSeries>,
    },
    Radar {
        axes:   Vec<String>,
        values: Vec<f64>,
        color:  [u8; 3],
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartArtifact {
    pub kind:  ChartKind,
    pub title: String,
    pub shape: ChartShape,
}

impl ChartArtifact {
    /// Base efficiency vs purification estimate for every catalog entry.
    pub fn filter_comparison(comparison: &FilterComparison) -> Self {
        let categories = comparison
            .evaluations
            .iter()
            .map(|e| e.filter.name().to_string())
            .collect();
        let base = comparison.evaluations.iter().map(|e| e.base_efficiency_pct).collect();
        let estimate = comparison
            .evaluations
            .iter()
            .map(|e| e.purification_estimate)
            .collect();
        Self {
            kind:  ChartKind::FilterComparison,
            title: "Filter comparison".into(),
            shape: ChartShape::GroupedBars {
                categories,
                value_axis: "Percent (%)".into(),
                series: vec![
                    BarSeries { label: "Base efficiency (%)".into(), color: BLUE, values: base },
                    BarSeries {
                        label:  "Estimated purification (%)".into(),
                        color:  ORANGE,
                        values: estimate,
                    },
                ],
            },
        }
    }

    /// The four index ratios on a radar.
    pub fn contamination_radar(sample: &WaterSample) -> Self {
        Self {
            kind:  ChartKind::ContaminationRadar,
            title: "Contamination profile".into(),
            shape: ChartShape::Radar {
                axes:   contaminant_labels(),
                values: contaminant_ratios(sample).to_vec(),
                color:  BLUE,
            },
        }
    }

    pub fn before_after(projected: &ProjectedSample) -> Self {
        Self {
            kind:  ChartKind::BeforeAfter,
            title: "Contaminant reduction after filtering".into(),
            shape: ChartShape::GroupedBars {
                categories: vec![
                    "Turbidity (NTU)".into(),
                    "Coliforms (NMP/100ml)".into(),
                    "Metals (ppm)".into(),
                    "TDS (mg/L)".into(),
                ],
                value_axis: "Concentration".into(),
                series: vec![
                    BarSeries {
                        label:  "Before".into(),
                        color:  RED,
                        values: projected.before.as_array().to_vec(),
                    },
                    BarSeries {
                        label:  "After".into(),
                        color:  GREEN,
                        values: projected.after.as_array().to_vec(),
                    },
                ],
            },
        }
    }

    pub fn tds_before_after(projected: &ProjectedSample) -> Self {
        Self {
            kind:  ChartKind::TdsBeforeAfter,
            title: "TDS change after filtering".into(),
            shape: ChartShape::GroupedBars {
                categories: vec!["TDS (mg/L)".into()],
                value_axis: "TDS (mg/L)".into(),
                series: vec![
                    BarSeries {
                        label:  "Before".into(),
                        color:  RED,
                        values: vec![projected.before.tds_mg_l],
                    },
                    BarSeries {
                        label:  "After".into(),
                        color:  GREEN,
                        values: vec![projected.after.tds_mg_l],
                    },
                ],
            },
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match &self.shape {
            ChartShape::GroupedBars { series, .. } => {
                Box::new(series.iter().flat_map(|s| s.values.iter().copied()))
            }
            ChartShape::Radar { values, .. } => Box::new(values.iter().copied()),
        }
    }

    /// Reject charts no backend can draw: empty shapes, mismatched series
    /// lengths, negative or non-finite values.
    pub fn validate(&self) -> SimResult<()> {
        let fail = |reason: String| PurifierError::ChartRasterization {
            chart: self.title.clone(),
            reason,
        };
        match &self.shape {
            ChartShape::GroupedBars { categories, series, .. } => {
                if categories.is_empty() || series.is_empty() {
                    return Err(fail("chart has no bars".into()));
                }
                if let Some(s) = series.iter().find(|s| s.values.len() != categories.len()) {
                    return Err(fail(format!(
                        "series '{}' has {} values for {} categories",
                        s.label,
                        s.values.len(),
                        categories.len()
                    )));
                }
            }
            ChartShape::Radar { axes, values, .. } => {
                if axes.len() < 3 || axes.len() != values.len() {
                    return Err(fail(format!(
                        "radar needs >= 3 axes with one value each, got {} axes / {} values",
                        axes.len(),
                        values.len()
                    )));
                }
            }
        }
        if let Some(v) = self.values().find(|v| !v.is_finite() || *v < 0.0) {
            return Err(fail(format!("value {v} cannot be plotted")));
        }
        Ok(())
    }

    /// Render the vector form as SVG text.
    pub fn to_svg(&self, size: (u32, u32)) -> SimResult<String> {
        self.validate()?;
        render::svg(self, size)
    }
}

fn contaminant_labels() -> Vec<String> {
    ["Turbidity", "Coliforms", "Metals", "TDS"].iter().map(|s| s.to_string()).collect()
}

/// A PNG bitmap ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width:  u32,
    pub height: u32,
    pub png:    Vec<u8>,
}

/// Converts a vector chart into an embeddable bitmap.
pub trait Rasterizer {
    fn rasterize(&self, chart: &ChartArtifact, size: (u32, u32)) -> SimResult<RasterImage>;
}

/// Rasterizer used when the `report` feature is compiled out.
pub struct UnavailableRasterizer;

impl Rasterizer for UnavailableRasterizer {
    fn rasterize(&self, _chart: &ChartArtifact, _size: (u32, u32)) -> SimResult<RasterImage> {
        Err(PurifierError::OptionalDependencyUnavailable { feature: "report" })
    }
}

#[cfg(feature = "report")]
pub use render::PlottersRasterizer;

/// The best rasterizer this build offers.
pub fn default_rasterizer() -> Box<dyn Rasterizer> {
    #[cfg(feature = "report")]
    {
        Box::new(render::PlottersRasterizer)
    }
    #[cfg(not(feature = "report"))]
    {
        log::warn!("charts: built without the 'report' feature; rasterization disabled");
        Box::new(UnavailableRasterizer)
    }
}

#[cfg(feature = "report")]
mod render {
    use super::{BarSeries, ChartArtifact, ChartShape, RasterImage, Rasterizer};
    use crate::error::{PurifierError, SimResult};
    use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
    use plotters::coord::Shift;
    use plotters::prelude::*;
    use plotters::style::register_font;
    use plotters::style::text_anchor::{HPos, Pos, VPos};
    use std::f64::consts::{FRAC_PI_2, TAU};
    use std::sync::OnceLock;

    /// Delegates to `WithKeyPoints` but opts into `DefaultFormatting` so
    /// `configure_mesh` type-checks; the x labels come from a custom formatter.
    struct KeyPointAxis(plotters::coord::combinators::WithKeyPoints<plotters::coord::types::RangedCoordf64>);

    impl Ranged for KeyPointAxis {
        type FormatOption = plotters::coord::ranged1d::DefaultFormatting;
        type ValueType = f64;

        fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
            self.0.map(value, limit)
        }

        fn key_points<Hint: plotters::coord::ranged1d::KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
            self.0.key_points(hint)
        }

        fn range(&self) -> std::ops::Range<f64> {
            self.0.range()
        }

        fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
            self.0.axis_pixel_range(limit)
        }
    }

    const MARGIN: i32 = 24;
    const FONT: &str = "sans-serif";
    const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

    static FONT_READY: OnceLock<Result<(), String>> = OnceLock::new();

    /// plotters' ab_glyph backend has no system font lookup; every family
    /// the charts use must be registered before the first text is drawn.
    fn ensure_font(chart: &ChartArtifact) -> SimResult<()> {
        FONT_READY
            .get_or_init(|| {
                for family in [FONT, "serif", "monospace"] {
                    register_font(family, FontStyle::Normal, FONT_BYTES)
                        .map_err(|_| "bundled font could not be parsed".to_string())?;
                }
                Ok(())
            })
            .clone()
            .map_err(|reason| failure(chart, reason))
    }

    pub struct PlottersRasterizer;

    impl Rasterizer for PlottersRasterizer {
        fn rasterize(&self, chart: &ChartArtifact, size: (u32, u32)) -> SimResult<RasterImage> {
            chart.validate()?;
            let (width, height) = size;
            if width == 0 || height == 0 {
                return Err(failure(chart, format!("bitmap size {width}x{height} is empty")));
            }
            ensure_font(chart)?;

            let mut buffer = vec![0u8; width as usize * height as usize * 3];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
                draw(&root, chart).map_err(|e| failure(chart, e.to_string()))?;
                root.present().map_err(|e| failure(chart, e.to_string()))?;
            }

            let mut png = Vec::new();
            PngEncoder::new(&mut png)
                .write_image(&buffer, width, height, ColorType::Rgb8)
                .map_err(|e| failure(chart, e.to_string()))?;
            log::debug!("charts: rasterized '{}' to {} PNG bytes", chart.title, png.len());
            Ok(RasterImage { width, height, png })
        }
    }

    pub(super) fn svg(chart: &ChartArtifact, size: (u32, u32)) -> SimResult<String> {
        ensure_font(chart)?;
        let mut out = String::new();
        {
            let root = SVGBackend::with_string(&mut out, size).into_drawing_area();
            draw(&root, chart).map_err(|e| failure(chart, e.to_string()))?;
            root.present().map_err(|e| failure(chart, e.to_string()))?;
        }
        Ok(out)
    }

    fn failure(chart: &ChartArtifact, reason: String) -> PurifierError {
        PurifierError::ChartRasterization { chart: chart.title.clone(), reason }
    }

    fn rgb(c: [u8; 3]) -> RGBColor {
        RGBColor(c[0], c[1], c[2])
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartArtifact,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        match &chart.shape {
            ChartShape::GroupedBars { categories, value_axis, series } => {
                draw_bars(root, &chart.title, categories, value_axis, series)
            }
            ChartShape::Radar { axes, values, color } => {
                draw_radar(root, &chart.title, axes, values, *color)
            }
        }
    }

    /// One group per category, one bar per series inside each group. The x
    /// range is `0..categories` with a key point at every group centre so
    /// the tick labels land under their bars.
    fn draw_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        categories: &[String],
        value_axis: &str,
        series: &[BarSeries],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let max = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        let top = if max > 0.0 { max * 1.15 } else { 1.0 };
        let centres: Vec<f64> = (0..categories.len()).map(|c| c as f64 + 0.5).collect();
        let category_label = |x: &f64| {
            categories.get(x.floor() as usize).cloned().unwrap_or_default()
        };

        let mut ctx = ChartBuilder::on(root)
            .margin(MARGIN)
            .caption(title, (FONT, 24))
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(
                KeyPointAxis((0.0..categories.len() as f64).with_key_points(centres)),
                0.0..top,
            )?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&category_label)
            .y_desc(value_axis)
            .label_style((FONT, 14))
            .axis_desc_style((FONT, 16))
            .draw()?;

        let width = 0.8 / series.len() as f64;
        for (s, bars) in series.iter().enumerate() {
            let color = rgb(bars.color);
            ctx.draw_series(bars.values.iter().enumerate().map(|(c, v)| {
                let x0 = c as f64 + 0.1 + width * s as f64;
                Rectangle::new([(x0, 0.0), (x0 + width, *v)], color.filled())
            }))?
            .label(bars.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, 14))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }

    /// Values are scaled against the largest ratio (at least 1.0) so a
    /// clean sample stays inside the outer ring.
    fn draw_radar<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        axes: &[String],
        values: &[f64],
        color: [u8; 3],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let mut ctx = ChartBuilder::on(root)
            .margin(MARGIN)
            .caption(title, (FONT, 24))
            .build_cartesian_2d(-1.35_f64..1.35_f64, -1.35_f64..1.35_f64)?;

        let n = axes.len();
        let scale = values.iter().copied().fold(1.0_f64, f64::max);
        // First spoke points up, the rest follow clockwise.
        let point = |i: usize, r: f64| {
            let angle = FRAC_PI_2 - TAU * i as f64 / n as f64;
            (r * angle.cos(), r * angle.sin())
        };

        let grid = BLACK.mix(0.3);
        for ring in [0.5, 1.0] {
            let mut outline: Vec<(f64, f64)> = (0..n).map(|i| point(i, ring)).collect();
            outline.push(outline[0]);
            ctx.draw_series(std::iter::once(PathElement::new(outline, grid.stroke_width(1))))?;
        }
        ctx.draw_series(
            (0..n).map(|i| PathElement::new(vec![(0.0, 0.0), point(i, 1.0)], grid.stroke_width(1))),
        )?;

        let label_style = TextStyle::from((FONT, 16).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));
        ctx.draw_series(
            axes.iter()
                .enumerate()
                .map(|(i, axis)| Text::new(axis.clone(), point(i, 1.18), label_style.clone())),
        )?;

        let shape: Vec<(f64, f64)> =
            values.iter().enumerate().map(|(i, v)| point(i, v / scale)).collect();
        ctx.draw_series(std::iter::once(Polygon::new(shape.clone(), rgb(color).mix(0.3).filled())))?;
        let mut closed = shape;
        closed.push(closed[0]);
        ctx.draw_series(std::iter::once(PathElement::new(closed, rgb(color).stroke_width(2))))?;
        Ok(())
    }
}

#[cfg(not(feature = "report"))]
mod render {
    use super::ChartArtifact;
    use crate::error::{PurifierError, SimResult};

    pub(super) fn svg(_chart: &ChartArtifact, _size: (u32, u32)) -> SimResult<String> {
        Err(PurifierError::OptionalDependencyUnavailable { feature: "report" })
    }
}
