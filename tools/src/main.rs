//! purifier-runner: headless runner for the water purification simulator.
//!
//! Usage:
//!   purifier-runner --tds 900 --metals 0.8 --speed instant --runs 3 --csv history.csv
//!   purifier-runner --seed 42 --report-dir out/ --sync-db rows.db
//!   purifier-runner --dataset 1200 --out dataset.csv
//!   purifier-runner --ipc-mode

use anyhow::Result;
use purifier_core::{
    clock::{RecordingPacer, SimSpeed, ThreadSleepPacer},
    command::{SampleInput, SessionCommand},
    config::{SimConfig, SyncConfig},
    dataset,
    event::PurificationEvent,
    report::ReportDocument,
    rng::{RngBank, RngSlot},
    sample::{Odor, WaterSample},
    session::{RunSummary, SimSession},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", wall_clock_seed());
    let runs = parse_arg(&args, "--runs", 1u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = str_arg(&args, "--data-dir");

    if let Some(count) = str_arg(&args, "--dataset").and_then(|n| n.parse::<usize>().ok()) {
        let out = str_arg(&args, "--out").unwrap_or("dataset_filters.csv");
        let mut rng = RngBank::new(seed).for_slot(RngSlot::Dataset);
        let samples = dataset::generate(count, &mut rng);
        std::fs::write(out, dataset::write_csv(&samples))?;
        println!("Dataset written: {out} ({count} samples, seed {seed})");
        return Ok(());
    }

    let mut config = match data_dir {
        Some(dir) => SimConfig::load(dir)?,
        None => SimConfig::default(),
    };
    if let Some(speed) = str_arg(&args, "--speed").and_then(SimSpeed::parse) {
        config.speed = speed;
    }
    if let Some(db) = str_arg(&args, "--sync-db") {
        config.sync = Some(SyncConfig {
            db_path:         db.to_string(),
            sheet:           str_arg(&args, "--sheet").unwrap_or("history").to_string(),
            busy_timeout_ms: 2_000,
        });
    }

    let mut session = SimSession::new(config, seed)?;

    if ipc_mode {
        return run_ipc_loop(&mut session);
    }

    let sample = sample_from_args(&args)?;
    println!("Water purification simulator: purifier-runner");
    println!("  session:  {}", session.session_id);
    println!("  seed:     {seed}");
    println!("  runs:     {runs}");
    println!("  speed:    {:?}", session.config().speed);
    println!();

    let analysis = session.analyze(&sample);
    println!("Contamination level: {:.1} %", analysis.index.value());
    println!("TDS {} mg/L: {}", sample.tds_mg_l(), analysis.tds_compliance.summary());
    println!();

    let mut last = None;
    for _ in 0..runs {
        let mut pacer = ThreadSleepPacer;
        let summary = session.run(sample, &mut pacer, &mut print_event)?;
        last = Some(summary);
    }
    if let Some(summary) = &last {
        print_summary(summary);
    }

    if let Ok(tds) = session.tds_focus() {
        println!();
        println!("=== TDS FOCUS ===");
        println!("  filter:         {}", tds.filter);
        println!("  TDS after:      {:.2} mg/L", tds.tds_after);
        println!("  reduction:      {:.1} %", tds.reduction_pct);
    }

    if let Some(path) = str_arg(&args, "--csv") {
        std::fs::write(path, session.export_history_csv())?;
        println!("History written: {path}");
    }
    if let Some(dir) = str_arg(&args, "--report-dir") {
        match session.generate_report() {
            Ok(doc) => {
                write_report(&doc, Path::new(dir))?;
                println!("Report written: {dir} ({} pages)", doc.page_count());
            }
            Err(e) if e.is_advisory() => println!("Report skipped: {e}"),
            Err(e) => println!("Report failed: {e}"),
        }
    }
    Ok(())
}

fn run_ipc_loop(session: &mut SimSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: SessionCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply(&mut stdout, serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        let response = match handle_command(session, cmd) {
            Ok(Some(value)) => value,
            Ok(None) => break,
            Err(e) => serde_json::json!({ "error": e.to_string(), "advisory": e.is_advisory() }),
        };
        reply(&mut stdout, response)?;
    }
    Ok(())
}

/// Returns None on Quit.
fn handle_command(
    session: &mut SimSession,
    cmd: SessionCommand,
) -> purifier_core::error::SimResult<Option<serde_json::Value>> {
    let value = match cmd {
        SessionCommand::Quit => return Ok(None),
        SessionCommand::Analyze { sample } => {
            let sample = sample.into_sample()?;
            serde_json::to_value(session.analyze(&sample))?
        }
        SessionCommand::CompareFilters { sample } => {
            let sample = sample.into_sample()?;
            serde_json::to_value(session.compare_filters(sample)?)?
        }
        SessionCommand::TdsFocus => serde_json::to_value(session.tds_focus()?)?,
        SessionCommand::Run { sample } => {
            let sample = sample.into_sample()?;
            // Progress is streamed in the reply's event list, so no real pauses.
            let mut pacer = RecordingPacer::default();
            serde_json::to_value(session.run(sample, &mut pacer, &mut |_| {})?)?
        }
        SessionCommand::ExportCsv => {
            serde_json::json!({ "csv": session.export_history_csv() })
        }
        SessionCommand::Report { out_dir } => {
            let doc = session.generate_report()?;
            write_report(&doc, Path::new(&out_dir))?;
            serde_json::json!({ "pages": doc.page_count(), "out_dir": out_dir })
        }
    };
    Ok(Some(value))
}

fn reply(stdout: &mut io::Stdout, value: serde_json::Value) -> Result<()> {
    writeln!(stdout, "{value}")?;
    stdout.flush()?;
    Ok(())
}

fn write_report(doc: &ReportDocument, dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(dir.join("report.json"), json)?;
    for (name, image) in &doc.assets {
        std::fs::write(dir.join(name), &image.png)?;
    }
    Ok(())
}

fn print_event(event: &PurificationEvent) {
    if let PurificationEvent::ProgressAdvanced { progress, .. } = event {
        log::debug!("progress {:.0}%", progress * 100.0);
    }
    for line in event_lines(event) {
        println!("{line}");
    }
}

/// Console narration for one event; progress ticks only go to the log.
fn event_lines(event: &PurificationEvent) -> Vec<String> {
    match event {
        PurificationEvent::StageStarted { stage, message } => {
            vec![format!("### {stage}"), message.clone()]
        }
        PurificationEvent::StageCompleted { efficiency, .. } => {
            vec![format!("  stage complete, efficiency {efficiency:.1}%")]
        }
        PurificationEvent::SequenceCompleted { .. } => vec!["Simulation complete.".to_string()],
        PurificationEvent::SyncFailed { sink, reason } => {
            vec![format!("  (row store '{sink}' not updated: {reason})")]
        }
        _ => Vec::new(),
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary_lines(summary) {
        println!("{line}");
    }
}

fn summary_lines(summary: &RunSummary) -> Vec<String> {
    vec![
        "=== RUN SUMMARY ===".to_string(),
        format!("  run:             {}", summary.run),
        format!("  index:           {:.1} %", summary.index.value()),
        format!("  recommended:     {}", summary.recommendation.filter.name()),
        format!("  purification:    {:.1} %", summary.recommendation.purification_estimate),
        format!("  risk before:     {:.1}", summary.risk.aggregate_before),
        format!("  risk after:      {:.1}", summary.risk.aggregate_after),
        format!("  risk reduction:  {:.1} %", summary.risk.aggregate_reduction_pct()),
        format!("  turbidity:       {}", summary.bands.turbidity.advice()),
        format!("  coliforms:       {}", summary.bands.coliforms.advice()),
        format!("  metals:          {}", summary.bands.metals.advice()),
        format!("  tds:             {}", summary.bands.tds.advice()),
        format!("  raw water:       {}", summary.bands.aggregate_before.advice()),
        format!("  outlook:         {}", summary.bands.aggregate_after.advice()),
    ]
}

fn sample_from_args(args: &[String]) -> Result<WaterSample> {
    let d = SampleInput::default();
    let odor = match str_arg(args, "--odor") {
        Some(label) => Odor::from_label(label)
            .ok_or_else(|| anyhow::anyhow!("--odor expects Yes or No, got '{label}'"))?,
        None => d.odor,
    };
    let input = SampleInput {
        ph:            parse_arg(args, "--ph", d.ph),
        turbidity_ntu: parse_arg(args, "--turbidity", d.turbidity_ntu),
        coliforms:     parse_arg(args, "--coliforms", d.coliforms),
        metals_ppm:    parse_arg(args, "--metals", d.metals_ppm),
        tds_mg_l:      parse_arg(args, "--tds", d.tds_mg_l),
        odor,
    };
    Ok(input.into_sample()?)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn wall_clock_seed() -> u64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64
}
