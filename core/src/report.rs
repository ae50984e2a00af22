//! Report assembler: the fixed six-section document.
//!
//! SECTION ORDER (fixed, never reordered):
//!   1. Input data              ┐ page 1 (the table may spill over)
//!   2. Filter comparison table ┘
//!   3. General charts            own page
//!   4. Before/after chart      ┐ next page
//!   5. TDS deep-dive           ┘
//!   6. Final recommendation      last page
//!
//! Coordinates are PDF-style points with the origin at the bottom-left of
//! a letter page, so the cursor moves down by decreasing `y`.
//!
//! The assembler refuses to run until the evaluation table, the three
//! embedded charts and the TDS analysis exist. A chart that cannot be
//! rasterized aborts the report and nothing else.

use crate::{
    charts::{ChartArtifact, ChartKind, RasterImage, Rasterizer},
    error::{PurifierError, SimResult},
    ledger::HistoryRecord,
    projection::TdsFocus,
    recommendation::FilterComparison,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;
/// A table row may not start below this cursor.
pub const MIN_MARGIN: f64 = 120.0;
/// Cursor position for the first row on a continuation page.
pub const TOP_OFFSET: f64 = 80.0;
pub const TABLE_ROW_HEIGHT: f64 = 14.0;

pub const TITLE: &str = "Water Purification Report";

/// Place one table row. `current` is the cursor before the row.
///
/// Returns the cursor after the row, and whether a page break had to be
/// inserted first. The row itself sits at `cursor_after + row_height`.
pub fn next_cursor(current: f64, row_height: f64, page_height: f64) -> (f64, bool) {
    if current < MIN_MARGIN {
        (page_height - TOP_OFFSET - row_height, true)
    } else {
        (current - row_height, false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    InputData,
    FilterComparison,
    Charts,
    BeforeAfter,
    TdsFocus,
    FinalRecommendation,
}

impl ReportSection {
    pub const ORDER: [ReportSection; 6] = [
        Self::InputData,
        Self::FilterComparison,
        Self::Charts,
        Self::BeforeAfter,
        Self::TdsFocus,
        Self::FinalRecommendation,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            Self::InputData           => "1. Water data",
            Self::FilterComparison    => "2. Filter comparison",
            Self::Charts              => "3. Purification process charts",
            Self::BeforeAfter         => "4. Contaminant reduction before and after filtering",
            Self::TdsFocus            => "5. TDS analysis",
            Self::FinalRecommendation => "6. Recommended filter",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum PageElement {
    Heading {
        x:    f64,
        y:    f64,
        size: f64,
        text: String,
    },
    Text {
        x:    f64,
        y:    f64,
        size: f64,
        text: String,
    },
    /// Filled header band with column captions.
    TableHeader {
        x:      f64,
        y:      f64,
        width:  f64,
        height: f64,
        cells:  Vec<(f64, String)>,
    },
    TableRow {
        y:     f64,
        cells: Vec<(f64, String)>,
    },
    Image {
        x:      f64,
        y:      f64,
        width:  f64,
        height: f64,
        asset:  String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub number:   usize,
    pub elements: Vec<PageElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionPlacement {
    pub section:    ReportSection,
    pub first_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDocument {
    pub title:    String,
    pub pages:    Vec<Page>,
    pub sections: Vec<SectionPlacement>,
    /// PNG bitmaps keyed by the asset names the image elements reference.
    #[serde(skip)]
    pub assets:   BTreeMap<String, RasterImage>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn section_order(&self) -> Vec<ReportSection> {
        self.sections.iter().map(|s| s.section).collect()
    }
}

/// Everything the assembler reads. Missing pieces are reported together.
pub struct ReportInputs<'a> {
    pub latest:     Option<&'a HistoryRecord>,
    pub comparison: Option<&'a FilterComparison>,
    pub charts:     Option<&'a BTreeMap<ChartKind, ChartArtifact>>,
    pub tds:        Option<&'a TdsFocus>,
}

const EMBEDDED_CHARTS: [ChartKind; 3] = [
    ChartKind::FilterComparison,
    ChartKind::ContaminationRadar,
    ChartKind::BeforeAfter,
];

struct Prepared<'a> {
    latest:     &'a HistoryRecord,
    comparison: &'a FilterComparison,
    tds:        &'a TdsFocus,
    assets:     BTreeMap<String, RasterImage>,
}

pub fn assemble(inputs: ReportInputs<'_>, rasterizer: &dyn Rasterizer) -> SimResult<ReportDocument> {
    let mut missing = Vec::new();
    if inputs.latest.is_none() {
        missing.push("history record".to_string());
    }
    if inputs.comparison.is_none() {
        missing.push("filter evaluation table".to_string());
    }
    for kind in EMBEDDED_CHARTS {
        if inputs.charts.and_then(|c| c.get(&kind)).is_none() {
            missing.push(format!("{kind:?} chart"));
        }
    }
    if inputs.tds.is_none() {
        missing.push("TDS analysis".to_string());
    }

    let (Some(latest), Some(comparison), Some(charts), Some(tds)) =
        (inputs.latest, inputs.comparison, inputs.charts, inputs.tds)
    else {
        return Err(PurifierError::MissingPrerequisiteState { missing: missing.join(", ") });
    };
    if !missing.is_empty() {
        return Err(PurifierError::MissingPrerequisiteState { missing: missing.join(", ") });
    }

    let mut assets = BTreeMap::new();
    for kind in EMBEDDED_CHARTS {
        if let Some(chart) = charts.get(&kind) {
            let image = rasterizer.rasterize(chart, kind.raster_size())?;
            assets.insert(kind.asset_name().to_string(), image);
        }
    }

    let doc = layout(Prepared { latest, comparison, tds, assets });
    log::info!(
        "report: assembled {} pages for run {}",
        doc.page_count(),
        latest.run
    );
    Ok(doc)
}

struct Builder {
    pages:    Vec<Page>,
    sections: Vec<SectionPlacement>,
}

impl Builder {
    fn new() -> Self {
        Self { pages: vec![Page { number: 1, elements: Vec::new() }], sections: Vec::new() }
    }

    fn show_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page { number, elements: Vec::new() });
    }

    fn push(&mut self, element: PageElement) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn heading(&mut self, x: f64, y: f64, size: f64, text: &str) {
        self.push(PageElement::Heading { x, y, size, text: text.to_string() });
    }

    fn text(&mut self, x: f64, y: f64, size: f64, text: String) {
        self.push(PageElement::Text { x, y, size, text });
    }

    fn section(&mut self, section: ReportSection, x: f64, y: f64) {
        self.sections.push(SectionPlacement { section, first_page: self.pages.len() });
        self.heading(x, y, 12.0, section.heading());
    }

    fn image(&mut self, kind: ChartKind, x: f64, y: f64, width: f64, height: f64) {
        self.push(PageElement::Image {
            x,
            y,
            width,
            height,
            asset: kind.asset_name().to_string(),
        });
    }
}

fn layout(p: Prepared<'_>) -> ReportDocument {
    let h = PAGE_HEIGHT;
    let row = p.latest.to_row();
    let mut b = Builder::new();

    b.heading(50.0, h - 50.0, 18.0, TITLE);

    // 1. Input data
    let mut y = h - 90.0;
    b.section(ReportSection::InputData, 50.0, y);
    y -= 20.0;
    let lines = [
        format!("pH: {}", row.ph),
        format!("Turbidity (NTU): {}", row.turbidity_ntu),
        format!("Coliforms (NMP/100ml): {}", row.coliforms),
        format!("Metals (ppm): {}", row.metals_ppm),
        format!("TDS (mg/L): {}", row.tds_mg_l),
        format!("Unpleasant odor: {}", row.odor.label()),
        format!("Contamination level: {:.1} %", row.contamination_pct),
    ];
    for line in lines {
        b.text(60.0, y, 10.0, line);
        y -= 14.0;
    }

    // 2. Filter comparison table
    y -= 10.0;
    b.section(ReportSection::FilterComparison, 50.0, y);
    y -= 20.0;
    b.push(PageElement::TableHeader {
        x:      50.0,
        y:      y - 15.0,
        width:  500.0,
        height: 18.0,
        cells:  vec![
            (55.0, "Filter".into()),
            (220.0, "Base efficiency (%)".into()),
            (390.0, "Estimated purification (%)".into()),
        ],
    });
    y -= 25.0;
    for eval in &p.comparison.evaluations {
        let (after, page_break) = next_cursor(y, TABLE_ROW_HEIGHT, h);
        if page_break {
            b.show_page();
        }
        b.push(PageElement::TableRow {
            y:     after + TABLE_ROW_HEIGHT,
            cells: vec![
                (55.0, eval.filter.name().to_string()),
                (220.0, format!("{:.1}", eval.base_efficiency_pct)),
                (390.0, format!("{:.1}", eval.purification_estimate)),
            ],
        });
        y = after;
    }

    // 3. General charts
    b.show_page();
    b.section(ReportSection::Charts, 50.0, h - 50.0);
    b.image(ChartKind::FilterComparison, 50.0, h - 360.0, 500.0, 250.0);
    b.image(ChartKind::ContaminationRadar, 150.0, 80.0, 300.0, 220.0);

    // 4. Before/after
    b.show_page();
    b.section(ReportSection::BeforeAfter, 50.0, h - 50.0);
    b.image(ChartKind::BeforeAfter, 50.0, h - 380.0, 500.0, 260.0);

    // 5. TDS deep-dive
    let mut y = h - 420.0;
    b.section(ReportSection::TdsFocus, 50.0, y);
    y -= 20.0;
    let tds_lines = [
        format!("Initial TDS: {:.2} mg/L", p.tds.tds_before),
        format!("Estimated TDS after filtering: {:.2} mg/L", p.tds.tds_after),
        format!("Approximate TDS reduction: {:.1} %", p.tds.reduction_pct),
        String::new(),
        "Interpretation:".to_string(),
        p.tds.compliance.interpretation().to_string(),
    ];
    for line in tds_lines {
        b.text(60.0, y, 10.0, line);
        y -= 16.0;
    }

    // 6. Final recommendation
    b.show_page();
    b.section(ReportSection::FinalRecommendation, 50.0, h - 50.0);
    let mut y = h - 90.0;
    let summary = [
        format!("Filter recommended by the simulation: {}", row.recommended_filter),
        format!("Estimated overall purification: {:.1} %", row.purification_pct),
        format!("Estimated TDS after filtering: {:.2} mg/L", row.filtered_tds_mg_l),
    ];
    for line in summary {
        b.text(60.0, y, 11.0, line);
        y -= 20.0;
    }

    ReportDocument {
        title:    TITLE.to_string(),
        pages:    b.pages,
        sections: b.sections,
        assets:   p.assets,
    }
}
