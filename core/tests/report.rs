//! Report assembly: prerequisites, section order, pagination and
//! rasterization failures.

use purifier_core::{
    charts::{ChartArtifact, RasterImage, Rasterizer, UnavailableRasterizer},
    clock::RecordingPacer,
    config::SimConfig,
    error::{PurifierError, SimResult},
    report::{PageElement, ReportDocument, ReportSection},
    risk::TdsCompliance,
    sample::{Odor, WaterSample},
    session::SimSession,
};

struct BrokenRasterizer;

impl Rasterizer for BrokenRasterizer {
    fn rasterize(&self, chart: &ChartArtifact, _size: (u32, u32)) -> SimResult<RasterImage> {
        Err(PurifierError::ChartRasterization {
            chart:  chart.title.clone(),
            reason: "backend crashed".into(),
        })
    }
}

/// Returns a 1x1 placeholder so layout can be tested without plotters.
struct StubRasterizer;

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, _chart: &ChartArtifact, size: (u32, u32)) -> SimResult<RasterImage> {
        Ok(RasterImage { width: size.0, height: size.1, png: vec![0] })
    }
}

fn session_after_one_run(rasterizer: Box<dyn Rasterizer>) -> SimSession {
    let mut session = SimSession::new(SimConfig::default_test(), 42)
        .unwrap()
        .with_rasterizer(rasterizer);
    session
        .run(WaterSample::default(), &mut RecordingPacer::default(), &mut |_| {})
        .unwrap();
    session
}

fn texts(doc: &ReportDocument) -> Vec<String> {
    doc.pages
        .iter()
        .flat_map(|p| &p.elements)
        .filter_map(|e| match e {
            PageElement::Text { text, .. } | PageElement::Heading { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn report_before_any_run_is_missing_prerequisites() {
    let session = SimSession::new(SimConfig::default_test(), 42)
        .unwrap()
        .with_rasterizer(Box::new(StubRasterizer));
    let err = session.generate_report().unwrap_err();
    assert!(matches!(err, PurifierError::MissingPrerequisiteState { .. }), "got {err:?}");
    assert!(err.is_advisory());

    assert!(session.recommendation().is_err());
    assert!(session.tds_focus().is_err());
}

#[test]
fn comparison_without_a_recorded_run_is_still_incomplete() {
    let mut session = SimSession::new(SimConfig::default_test(), 42)
        .unwrap()
        .with_rasterizer(Box::new(StubRasterizer));
    session.compare_filters(WaterSample::default()).unwrap();
    assert!(session.recommendation().is_ok());
    let err = session.generate_report().unwrap_err();
    assert!(matches!(err, PurifierError::MissingPrerequisiteState { .. }));
}

#[test]
fn sections_appear_in_fixed_order_on_four_pages() {
    let session = session_after_one_run(Box::new(StubRasterizer));
    let doc = session.generate_report().unwrap();
    assert_eq!(doc.section_order(), ReportSection::ORDER.to_vec());
    assert_eq!(doc.page_count(), 4);

    let first_pages: Vec<usize> = doc.sections.iter().map(|s| s.first_page).collect();
    assert_eq!(first_pages, vec![1, 1, 2, 3, 3, 4]);
}

#[test]
fn report_embeds_three_charts_with_assets() {
    let session = session_after_one_run(Box::new(StubRasterizer));
    let doc = session.generate_report().unwrap();
    let images: Vec<&String> = doc
        .pages
        .iter()
        .flat_map(|p| &p.elements)
        .filter_map(|e| match e {
            PageElement::Image { asset, .. } => Some(asset),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 3);
    for asset in images {
        assert!(doc.assets.contains_key(asset), "No bitmap for {asset}");
    }
}

#[test]
fn table_lists_every_catalog_filter() {
    let session = session_after_one_run(Box::new(StubRasterizer));
    let doc = session.generate_report().unwrap();
    let rows = doc
        .pages
        .iter()
        .flat_map(|p| &p.elements)
        .filter(|e| matches!(e, PageElement::TableRow { .. }))
        .count();
    assert_eq!(rows, session.config().catalog.len());
}

#[test]
fn tds_section_carries_the_compliance_interpretation() {
    let session = session_after_one_run(Box::new(StubRasterizer));
    let doc = session.generate_report().unwrap();
    let all = texts(&doc);
    let expected = TdsCompliance::HighMineralization.interpretation();
    assert!(all.iter().any(|t| t == expected), "TDS interpretation missing");
    assert!(all.iter().any(|t| t.contains("Reverse osmosis")));
}

#[test]
fn report_is_idempotent() {
    let session = session_after_one_run(Box::new(StubRasterizer));
    let a = session.generate_report().unwrap();
    let b = session.generate_report().unwrap();
    assert_eq!(a, b);
}

#[test]
fn report_stays_on_the_recorded_run_after_a_later_comparison() {
    let mut session = session_after_one_run(Box::new(StubRasterizer));
    let before = session.generate_report().unwrap();

    let what_if = WaterSample::new(7.0, 10.0, 500, 0.4, 1400, Odor::No).unwrap();
    session.compare_filters(what_if).unwrap();
    assert_eq!(session.tds_focus().unwrap().tds_before, 1400.0);

    let after = session.generate_report().unwrap();
    assert_eq!(before, after);
    let all = texts(&after);
    assert!(all.iter().any(|t| t == "TDS (mg/L): 650"));
    assert!(all.iter().any(|t| t == "Initial TDS: 650.00 mg/L"));
    assert!(!all.iter().any(|t| t.contains("1400")), "comparison cache leaked into the report");
    assert_eq!(session.ledger().len(), 1);
}

#[test]
fn rasterization_failure_aborts_report_only() {
    let mut session = session_after_one_run(Box::new(BrokenRasterizer));
    let err = session.generate_report().unwrap_err();
    assert!(matches!(err, PurifierError::ChartRasterization { .. }), "got {err:?}");
    assert!(!err.is_advisory());

    assert_eq!(session.ledger().len(), 1);
    session
        .run(WaterSample::default(), &mut RecordingPacer::default(), &mut |_| {})
        .unwrap();
    assert_eq!(session.ledger().len(), 2);
}

#[test]
fn unavailable_rasterizer_is_advisory() {
    let session = session_after_one_run(Box::new(UnavailableRasterizer));
    let err = session.generate_report().unwrap_err();
    assert!(matches!(
        err,
        PurifierError::OptionalDependencyUnavailable { feature: "report" }
    ));
    assert!(err.is_advisory());
}

#[cfg(feature = "report")]
mod plotters_backend {
    use super::*;
    use purifier_core::charts::{ChartKind, PlottersRasterizer};

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn charts_rasterize_to_png_at_their_sizes() {
        let session = session_after_one_run(Box::new(PlottersRasterizer));
        let charts = &session.artifacts().unwrap().charts;
        assert_eq!(charts.len(), 4);
        for (kind, chart) in charts {
            let image = PlottersRasterizer.rasterize(chart, kind.raster_size()).unwrap();
            assert_eq!((image.width, image.height), kind.raster_size());
            assert_eq!(&image.png[..8], &PNG_SIGNATURE, "{kind:?} is not a PNG");
        }
        assert_eq!(ChartKind::ContaminationRadar.raster_size(), (600, 600));
    }

    #[test]
    fn full_report_renders_and_is_repeatable() {
        let session = session_after_one_run(Box::new(PlottersRasterizer));
        let a = session.generate_report().unwrap();
        let b = session.generate_report().unwrap();
        assert_eq!(a.assets.len(), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn charts_export_as_svg() {
        let session = session_after_one_run(Box::new(PlottersRasterizer));
        let chart = &session.artifacts().unwrap().charts[&ChartKind::TdsBeforeAfter];
        let svg = chart.to_svg(ChartKind::TdsBeforeAfter.raster_size()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn svg_charts_carry_titles_categories_and_legends() {
        let session = session_after_one_run(Box::new(PlottersRasterizer));
        let charts = &session.artifacts().unwrap().charts;

        let svg = |kind: ChartKind| charts[&kind].to_svg(kind.raster_size()).unwrap();

        let comparison = svg(ChartKind::FilterComparison);
        for label in ["Filter comparison", "Reverse osmosis", "Percent (%)", "Base efficiency (%)"] {
            assert!(comparison.contains(label), "filter comparison lacks '{label}'");
        }

        let before_after = svg(ChartKind::BeforeAfter);
        for label in ["Turbidity (NTU)", "Metals (ppm)", "Before", "After"] {
            assert!(before_after.contains(label), "before/after lacks '{label}'");
        }

        let radar = svg(ChartKind::ContaminationRadar);
        for axis in ["Contamination profile", "Turbidity", "Coliforms", "Metals", "TDS"] {
            assert!(radar.contains(axis), "radar lacks '{axis}'");
        }
    }
}
