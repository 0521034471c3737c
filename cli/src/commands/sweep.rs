use std::cmp::Ordering;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use indicatif::ProgressStyle;
use tracing::{Instrument, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use sounder_common::config::PoolConfig;
use sounder_common::error::PoolError;
use sounder_common::network::target::Target;
use sounder_common::outcome::{Outcome, ProbeRecord};
use sounder_core::{CancelToken, Pool, Probe};

use crate::terminal::{colors, input::InputHandle, print};

/// What came back from one batch, complete or cut short.
pub struct SweepReport {
    pub records: Vec<ProbeRecord>,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn was_cancelled(&self) -> bool {
        self.skipped > 0
    }
}

/// Runs the pool on a blocking thread while the terminal shows progress.
///
/// Ctrl-C (signal or key) and `q` cancel the batch; the workers are still
/// joined and whatever finished is reported.
pub async fn run<P>(targets: Vec<Target>, pool_cfg: PoolConfig, probe: P) -> anyhow::Result<SweepReport>
where
    P: Probe + 'static,
{
    let total = targets.len();
    let span = info_span!("sweep", indicatif.pb_show = true);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.blue} {msg} [{bar:32.green/bright_black}] {pos}/{len} ({elapsed})",
    ) {
        span.pb_set_style(&style);
    }
    span.pb_set_length(total as u64);
    span.pb_set_message("Probing targets (press 'q' to stop)");

    let cancel = CancelToken::new();
    let progress_span = span.clone();
    let pool = Pool::new(pool_cfg)
        .with_cancel_token(cancel.clone())
        .with_progress(move |_done| progress_span.pb_inc(1));

    let start_time = Instant::now();
    let outcome = async {
        let _input = InputHandle::watch(cancel.clone());
        let mut batch = tokio::task::spawn_blocking(move || pool.run(targets, &probe));

        tokio::select! {
            joined = &mut batch => joined,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, waiting for in-flight probes");
                cancel.cancel();
                batch.await
            }
        }
    }
    .instrument(span)
    .await
    .context("probe batch panicked")?;
    let elapsed = start_time.elapsed();

    match outcome {
        Ok(records) => Ok(SweepReport {
            records,
            skipped: 0,
            elapsed,
        }),
        Err(PoolError::Cancelled { completed, skipped }) => Ok(SweepReport {
            records: completed,
            skipped,
            elapsed,
        }),
        Err(e @ PoolError::Config(_)) => Err(e).context("refusing to start the batch"),
    }
}

/// Orders IP literals numerically ahead of hostnames.
fn compare_targets(a: &Target, b: &Target) -> Ordering {
    match (a.ip(), b.ip()) {
        (Some(a_ip), Some(b_ip)) => a_ip.cmp(&b_ip),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn outcome_value(outcome: &Outcome) -> ColoredString {
    let text = outcome.to_string();
    if outcome.is_positive() {
        text.color(colors::POSITIVE).bold()
    } else {
        text.color(colors::NEGATIVE)
    }
}

pub fn render(report: &mut SweepReport, title: &str, positive_label: &str, quiet: u8) {
    if report.was_cancelled() {
        print::header(&format!("{title} (cancelled)"), quiet);
    } else {
        print::header(title, quiet);
    }

    report
        .records
        .sort_by(|a, b| compare_targets(&a.target, &b.target).then_with(|| a.outcome.cmp(&b.outcome)));

    if quiet < 2 {
        let key_width = report
            .records
            .iter()
            .map(|r| r.target.as_str().len())
            .max()
            .unwrap_or(0);
        for record in &report.records {
            print::aligned_line(record.target.as_str(), outcome_value(&record.outcome), key_width);
        }
    }

    print_summary(report, positive_label, quiet);
}

fn print_summary(report: &SweepReport, positive_label: &str, quiet: u8) {
    let positive = report.records.iter().filter(|r| r.outcome.is_positive()).count();
    let positive: ColoredString = format!("{positive} {positive_label}").bold().green();
    let probed: ColoredString = report.records.len().to_string().bold();
    let total_time: ColoredString = format!("{:.2}s", report.elapsed.as_secs_f64()).bold().yellow();

    let mut output = format!("{positive} of {probed} targets in {total_time}");
    if report.was_cancelled() {
        output.push_str(&format!(", {} skipped", report.skipped.to_string().bold().red()));
    }
    let output: String = output.color(colors::TEXT_DEFAULT).to_string();

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print(&output),
    }
}
