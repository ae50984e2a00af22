//! History ledger, CSV export and the row-store mirror.

use purifier_core::{
    clock::RecordingPacer,
    config::{SimConfig, SyncConfig},
    error::PurifierError,
    event::PurificationEvent,
    ledger::{parse_csv, write_csv, LedgerRow, EXPORT_COLUMNS},
    sample::{Odor, WaterSample},
    session::{RunSummary, SimSession},
    store::SqliteRowSink,
    sync::{RowSink, SyncError, SyncOutcome},
};

struct TimingOutSink;

impl RowSink for TimingOutSink {
    fn name(&self) -> &str {
        "timing-out"
    }

    fn append_row(&mut self, _row: &LedgerRow) -> Result<(), SyncError> {
        Err(SyncError::Timeout)
    }
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run_once(session: &mut SimSession, sample: WaterSample) -> RunSummary {
    session.run(sample, &mut RecordingPacer::default(), &mut |_| {}).unwrap()
}

fn temp_db_path(tag: &str) -> String {
    std::env::temp_dir()
        .join(format!("purifier-{tag}-{}.db", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned()
}

#[test]
fn each_run_appends_exactly_one_record() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    assert!(session.ledger().is_empty());

    let samples = [
        WaterSample::default(),
        WaterSample::new(6.5, 2.0, 10, 0.01, 200, Odor::Yes).unwrap(),
        WaterSample::new(8.5, 45.0, 1800, 1.8, 1400, Odor::No).unwrap(),
    ];
    for (i, sample) in samples.iter().enumerate() {
        let summary = run_once(&mut session, *sample);
        assert_eq!(summary.run, i as u64 + 1);
        assert_eq!(session.ledger().len(), i + 1);
    }

    // Append-only: earlier records are untouched and ordered.
    let records = session.ledger().records();
    for (record, sample) in records.iter().zip(samples.iter()) {
        assert_eq!(&record.sample, sample);
    }
    assert_eq!(session.ledger().latest().map(|r| r.run), Some(3));
}

#[test]
fn history_event_reports_run_and_ledger_length() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    for expected in 1..=2u64 {
        let summary = run_once(&mut session, WaterSample::default());
        let recorded: Vec<&PurificationEvent> = summary
            .events
            .iter()
            .filter(|e| e.type_name() == "history_recorded")
            .collect();
        assert_eq!(
            recorded,
            vec![&PurificationEvent::HistoryRecorded { run: expected, ledger_len: expected as usize }]
        );
    }
}

#[test]
fn export_header_is_the_column_contract() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    run_once(&mut session, WaterSample::default());
    let csv = session.export_history_csv();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "pH,Turbidez_NTU,Coliformes_NMP_100ml,Metales_ppm,TDS_mgL,Olor,\
         Nivel_contaminacion_%,Filtro_recomendado,Purificacion_recomendada_%,TDS_filtrado_mgL"
    );
    assert_eq!(header.split(',').count(), EXPORT_COLUMNS.len());
}

#[test]
fn export_round_trips_through_parse() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    run_once(&mut session, WaterSample::default());
    run_once(&mut session, WaterSample::new(5.5, 0.3, 0, 0.0, 75, Odor::Yes).unwrap());

    let csv = session.export_history_csv();
    let parsed = parse_csv(&csv).unwrap();
    assert_eq!(parsed, session.ledger().rows());
    assert_eq!(write_csv(&parsed), csv);
}

#[test]
fn worked_scenario_row_values() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    run_once(&mut session, WaterSample::default());
    let row = &session.ledger().rows()[0];
    assert_eq!(row.recommended_filter, "Reverse osmosis");
    assert_eq!(row.purification_pct, 65.5);
    assert_eq!(row.filtered_tds_mg_l, 19.5);
    assert_eq!(row.tds_mg_l, 650);
    assert_eq!(row.odor, Odor::No);
}

#[test]
fn empty_ledger_exports_header_only() {
    let session = SimSession::new(SimConfig::default_test(), 1).unwrap();
    let csv = session.export_history_csv();
    assert_eq!(csv.lines().count(), 1);
    assert!(parse_csv(&csv).unwrap().is_empty());
}

#[test]
fn wrong_header_is_malformed() {
    let err = parse_csv("a,b,c\n1,2,3\n").unwrap_err();
    assert!(matches!(err, PurifierError::MalformedExport { line: 1, .. }), "got {err:?}");
}

#[test]
fn failed_sync_still_records_locally() {
    init_logs();
    let mut session = SimSession::new(SimConfig::default_test(), 42)
        .unwrap()
        .with_sink(Box::new(TimingOutSink));

    let summary = run_once(&mut session, WaterSample::default());
    assert!(summary.sync.is_failed());
    assert_eq!(session.ledger().len(), 1, "Local append must survive a failed sync");
    assert!(summary
        .events
        .iter()
        .any(|e| matches!(e, PurificationEvent::SyncFailed { sink, .. } if sink == "timing-out")));

    // The session keeps working after the failure.
    run_once(&mut session, WaterSample::default());
    assert_eq!(session.ledger().len(), 2);
}

#[test]
fn no_sink_means_sync_disabled() {
    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    let summary = run_once(&mut session, WaterSample::default());
    assert_eq!(summary.sync, SyncOutcome::Disabled);
}

#[test]
fn sqlite_sink_mirrors_rows() {
    let mut sink = SqliteRowSink::in_memory("history").unwrap();
    sink.migrate().unwrap();
    sink.verify_columns().unwrap();

    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    run_once(&mut session, WaterSample::default());
    let row = session.ledger().rows().remove(0);

    sink.append_row(&row).unwrap();
    sink.append_row(&row).unwrap();
    assert_eq!(sink.row_count().unwrap(), 2);
    assert_eq!(sink.rows().unwrap(), vec![row.clone(), row]);
}

#[test]
fn configured_row_store_receives_every_run() {
    let path = temp_db_path("mirror");
    let mut config = SimConfig::default_test();
    config.sync = Some(SyncConfig {
        db_path:         path.clone(),
        sheet:           "history".into(),
        busy_timeout_ms: 2_000,
    });

    let mut session = SimSession::new(config, 42).unwrap();
    for _ in 0..2 {
        let summary = run_once(&mut session, WaterSample::default());
        assert_eq!(summary.sync, SyncOutcome::Appended);
    }
    drop(session);

    let store = SqliteRowSink::open(&path, "history", std::time::Duration::from_millis(500)).unwrap();
    assert_eq!(store.row_count().unwrap(), 2);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unreachable_row_store_disables_sync() {
    init_logs();
    let mut config = SimConfig::default_test();
    config.sync = Some(SyncConfig {
        db_path:         "/nonexistent-purifier-dir/history.db".into(),
        sheet:           "history".into(),
        busy_timeout_ms: 100,
    });

    let mut session = SimSession::new(config, 42).unwrap();
    let summary = run_once(&mut session, WaterSample::default());
    assert_eq!(summary.sync, SyncOutcome::Disabled);
    assert_eq!(session.ledger().len(), 1);
}

#[test]
fn file_row_store_switches_to_wal_journal() {
    let path = temp_db_path("wal");
    let store = SqliteRowSink::open(&path, "history", std::time::Duration::from_millis(500)).unwrap();
    store.migrate().unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    let mode: String = raw.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "wal");

    drop((raw, store));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}

#[test]
fn unknown_odor_label_in_row_store_is_an_error() {
    let path = temp_db_path("odor");
    let mut store =
        SqliteRowSink::open(&path, "history", std::time::Duration::from_millis(500)).unwrap();
    store.migrate().unwrap();

    let mut session = SimSession::new(SimConfig::default_test(), 42).unwrap();
    run_once(&mut session, WaterSample::new(7.0, 10.0, 500, 0.4, 650, Odor::Yes).unwrap());
    store.append_row(&session.ledger().rows()[0]).unwrap();
    assert_eq!(store.rows().unwrap()[0].odor, Odor::Yes);

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute(r#"UPDATE history_row SET "Olor" = 'Maybe'"#, []).unwrap();

    let err = store.rows().unwrap_err();
    assert!(
        matches!(
            err,
            PurifierError::Database(rusqlite::Error::FromSqlConversionFailure(5, _, _))
        ),
        "got {err:?}"
    );

    drop((raw, store));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}
