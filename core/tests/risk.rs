//! Risk profile and qualitative bands.

use purifier_core::{
    projection::ProjectedSample,
    risk::{
        ColiformBand, MetalsBand, ParameterRisk, RiskAfterBand, RiskBeforeBand, RiskProfile,
        TdsBand, TdsCompliance, TurbidityBand,
    },
    sample::{ContaminantLevels, Odor, WaterSample},
};

fn worked_profile() -> (ProjectedSample, RiskProfile) {
    let sample = WaterSample::new(7.0, 10.0, 500, 0.4, 650, Odor::No).unwrap();
    let projected = ProjectedSample::project(sample.contaminants(), 0.97);
    let profile = RiskProfile::assess(&projected);
    (projected, profile)
}

#[test]
fn worked_scenario_risk_profile() {
    let (_, profile) = worked_profile();
    assert!((profile.before.turbidity - 20.0).abs() < 1e-9);
    assert!((profile.before.coliforms - 25.0).abs() < 1e-9);
    assert!((profile.before.metals - 20.0).abs() < 1e-9);
    assert!((profile.before.tds - 65.0).abs() < 1e-9);
    assert!((profile.aggregate_before - 32.5).abs() < 1e-9);
    assert!((profile.aggregate_after - 0.975).abs() < 1e-9);
    assert!((profile.aggregate_reduction_pct() - 97.0).abs() < 1e-6);
}

#[test]
fn worked_scenario_bands() {
    let (projected, profile) = worked_profile();
    let bands = profile.bands(&projected.before);
    assert_eq!(bands.turbidity, TurbidityBand::High);
    assert_eq!(bands.coliforms, ColiformBand::High);
    assert_eq!(bands.metals, MetalsBand::Elevated);
    assert_eq!(bands.tds, TdsBand::High);
    assert_eq!(bands.aggregate_before, RiskBeforeBand::Low);
    assert_eq!(bands.aggregate_after, RiskAfterBand::Low);
}

#[test]
fn per_parameter_risk_is_capped_at_100() {
    let levels = ContaminantLevels {
        turbidity_ntu: 50.0,
        coliforms:     2000.0,
        metals_ppm:    2.0,
        tds_mg_l:      1500.0,
    };
    let risk = ParameterRisk::from_levels(&levels);
    assert_eq!(risk.tds, 100.0, "TDS 1500 must cap at 100");
    assert_eq!(risk.aggregate(), 100.0);
}

#[test]
fn risk_after_never_exceeds_risk_before() {
    let sample = WaterSample::new(8.0, 45.0, 1800, 1.7, 1300, Odor::Yes).unwrap();
    for efficiency in [0.70, 0.80, 0.88, 0.92, 0.97] {
        let profile = RiskProfile::assess(&ProjectedSample::project(sample.contaminants(), efficiency));
        assert!(profile.aggregate_after <= profile.aggregate_before);
    }
}

#[test]
fn zero_aggregate_baseline_reports_zero_reduction() {
    let levels = ContaminantLevels { turbidity_ntu: 0.0, coliforms: 0.0, metals_ppm: 0.0, tds_mg_l: 0.0 };
    let profile = RiskProfile::assess(&ProjectedSample::project(levels, 0.9));
    assert_eq!(profile.aggregate_reduction_pct(), 0.0);
}

#[test]
fn turbidity_band_edges() {
    assert_eq!(TurbidityBand::classify(0.99), TurbidityBand::Excellent);
    assert_eq!(TurbidityBand::classify(1.0), TurbidityBand::Acceptable);
    assert_eq!(TurbidityBand::classify(5.0), TurbidityBand::Acceptable);
    assert_eq!(TurbidityBand::classify(5.01), TurbidityBand::High);
}

#[test]
fn metals_band_edges() {
    assert_eq!(MetalsBand::classify(0.0099), MetalsBand::WithinLimit);
    assert_eq!(MetalsBand::classify(0.01), MetalsBand::Moderate);
    assert_eq!(MetalsBand::classify(0.049), MetalsBand::Moderate);
    assert_eq!(MetalsBand::classify(0.05), MetalsBand::Elevated);
}

#[test]
fn tds_band_edges() {
    assert_eq!(TdsBand::classify(299.0), TdsBand::Excellent);
    assert_eq!(TdsBand::classify(300.0), TdsBand::Good);
    assert_eq!(TdsBand::classify(599.0), TdsBand::Good);
    assert_eq!(TdsBand::classify(600.0), TdsBand::High);
    assert_eq!(TdsBand::classify(899.0), TdsBand::High);
    assert_eq!(TdsBand::classify(900.0), TdsBand::Unsuitable);
}

#[test]
fn aggregate_before_band_edges() {
    assert_eq!(RiskBeforeBand::classify(39.9), RiskBeforeBand::Low);
    assert_eq!(RiskBeforeBand::classify(40.0), RiskBeforeBand::Moderate);
    assert_eq!(RiskBeforeBand::classify(69.9), RiskBeforeBand::Moderate);
    assert_eq!(RiskBeforeBand::classify(70.0), RiskBeforeBand::VeryHigh);
}

#[test]
fn every_aggregate_band_has_distinct_advice() {
    let before = [RiskBeforeBand::Low, RiskBeforeBand::Moderate, RiskBeforeBand::VeryHigh]
        .map(|b| b.advice());
    assert!(before.iter().all(|a| !a.is_empty()));
    assert!(before[0] != before[1] && before[1] != before[2] && before[0] != before[2]);
    assert!(before[2].contains("very high"));

    let (projected, profile) = worked_profile();
    let bands = profile.bands(&projected.before);
    assert_eq!(bands.aggregate_before.advice(), "Raw water risk is low.");
    assert_ne!(bands.aggregate_before.advice(), bands.aggregate_after.advice());
}

#[test]
fn tds_compliance_boundaries() {
    assert_eq!(TdsCompliance::classify(500.0), TdsCompliance::Acceptable);
    assert_eq!(TdsCompliance::classify(501.0), TdsCompliance::HighMineralization);
    assert_eq!(TdsCompliance::classify(900.0), TdsCompliance::HighMineralization);
    assert_eq!(TdsCompliance::classify(901.0), TdsCompliance::Unsuitable);
}
