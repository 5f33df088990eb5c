//! Bootstrap metrics.
//!
//! Counts and times lake attaches and the migrations they run. These metrics
//! complement the `bootstrap` tracing span.

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Bootstrap attempts, labelled by outcome (`created`, `loaded`, or an error kind).
pub const BOOTSTRAP_TOTAL: &str = "lakehold_bootstrap_total";

/// Bootstrap duration histogram.
pub const BOOTSTRAP_DURATION: &str = "lakehold_bootstrap_duration_seconds";

/// Applied migration steps, labelled by `from` and `to`.
pub const MIGRATIONS_APPLIED: &str = "lakehold_migrations_applied_total";

/// Registers all bootstrap metric descriptions.
///
/// Call this once at application startup after initializing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(BOOTSTRAP_TOTAL, "Total lake bootstrap attempts by outcome");
    describe_histogram!(BOOTSTRAP_DURATION, "Duration of lake bootstraps in seconds");
    describe_counter!(MIGRATIONS_APPLIED, "Total metadata format migrations applied");
}

/// Records a finished bootstrap.
pub fn record_bootstrap(outcome: &'static str, duration_secs: f64) {
    counter!(BOOTSTRAP_TOTAL, "outcome" => outcome).increment(1);
    histogram!(BOOTSTRAP_DURATION, "outcome" => outcome).record(duration_secs);
}

/// Records one applied migration step.
pub fn record_migration(from: &'static str, to: &'static str) {
    counter!(MIGRATIONS_APPLIED, "from" => from, "to" => to).increment(1);
}
