//! KPI aggregation: group records by `(date_utc, endpoint_base)` and
//! summarize each group.
//!
//! This is a batch computation. Mean and exact p90 need every member of a
//! group, so no row is finalized before the whole batch has been consumed.
//! An incremental variant would have to swap the exact percentile for a
//! mergeable quantile sketch.

use crate::config::ReaderConfig;
use crate::error::KpiError;
use crate::reader::{MalformedLine, RecordCandidate, RecordReader};
use crate::record::{GroupKey, RawRecord, StatusClass, SummaryRow};
use crate::stats;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Quantile reported in `p90_elapsed_ms`.
const P90: f64 = 0.9;

/// Stateless aggregator over a complete batch.
pub struct KpiAggregator;

impl KpiAggregator {
    /// Aggregate validated records. Rows come out sorted by group key.
    ///
    /// An empty batch yields no rows.
    pub fn aggregate(records: &[RawRecord]) -> Vec<SummaryRow> {
        let mut groups: BTreeMap<GroupKey, Vec<&RawRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.group_key()).or_default().push(record);
        }

        debug!(records = records.len(), groups = groups.len(), "Grouped batch");

        groups
            .into_iter()
            .map(|(key, members)| summarize(key, &members))
            .collect()
    }

    /// Validate every candidate, then aggregate.
    ///
    /// The first record that fails validation fails the whole batch; no
    /// partial result is returned.
    pub fn aggregate_values<I>(candidates: I) -> Result<Vec<SummaryRow>, KpiError>
    where
        I: IntoIterator<Item = RecordCandidate>,
    {
        let records = candidates
            .into_iter()
            .map(|c| RawRecord::from_value(c.line_number, &c.value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::aggregate(&records))
    }
}

fn summarize(key: GroupKey, members: &[&RawRecord]) -> SummaryRow {
    let mut success_2xx = 0;
    let mut client_4xx = 0;
    let mut server_5xx = 0;
    let mut parse_errors = 0;
    let mut elapsed = Vec::with_capacity(members.len());

    for record in members {
        match record.status_class() {
            StatusClass::Success => success_2xx += 1,
            StatusClass::ClientError => client_4xx += 1,
            StatusClass::ServerError => server_5xx += 1,
            StatusClass::Other => {}
        }
        if record.is_parse_error() {
            parse_errors += 1;
        }
        elapsed.push(record.elapsed_ms);
    }

    // Groups only exist with at least one member, so both are Some.
    let avg = stats::mean(&elapsed).unwrap_or_default();
    let p90 = stats::percentile(&mut elapsed, P90).unwrap_or_default();

    SummaryRow {
        date_utc: key.date_utc,
        endpoint_base: key.endpoint_base,
        requests_total: members.len() as u64,
        success_2xx,
        client_4xx,
        server_5xx,
        parse_errors,
        avg_elapsed_ms: stats::round2_exact(avg),
        p90_elapsed_ms: stats::round2(p90),
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub rows: Vec<SummaryRow>,
    /// Records that parsed and were aggregated.
    pub records_read: usize,
    pub malformed_lines: Vec<MalformedLine>,
}

/// Read `path`, validate every record, and aggregate.
///
/// Malformed lines are skipped unless they exceed
/// `config.max_malformed_ratio`. Any schema error or mid-stream read error
/// fails the batch.
pub fn run_batch(path: &Path, config: &ReaderConfig) -> Result<BatchSummary, KpiError> {
    let mut reader = RecordReader::open(path)?;

    let records = reader
        .by_ref()
        .map(|c| RawRecord::from_value(c.line_number, &c.value))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(err) = reader.take_error() {
        return Err(err);
    }

    let malformed = reader.malformed().to_vec();
    let total = reader.lines_read();
    if let Some(max_ratio) = config.max_malformed_ratio
        && total > 0
        && malformed.len() as f64 / total as f64 > max_ratio
    {
        return Err(KpiError::TooManyMalformed {
            malformed: malformed.len(),
            total,
        });
    }

    let rows = KpiAggregator::aggregate(&records);
    info!(
        path = %path.display(),
        records = records.len(),
        malformed_lines = malformed.len(),
        rows = rows.len(),
        "Batch aggregated"
    );

    Ok(BatchSummary {
        rows,
        records_read: records.len(),
        malformed_lines: malformed,
    })
}
