use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::datasets::TaxonomyTool;
use crate::error::TaxError;
use crate::lineage::LineageFetcher;
use crate::resolver::{Resolver, RetryPolicy, Sleeper, ThreadSleeper};
use crate::table::Table;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: String,
    pub rows: usize,
    pub unique_taxids: usize,
    pub resolved: usize,
    pub exhausted: Vec<String>,
    pub rounds: u32,
    pub lookups: u32,
    pub tool_version: Option<String>,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<T: TaxonomyTool, P: Sleeper = ThreadSleeper> {
    resolver: Resolver<LineageFetcher<T>, P>,
}

impl<T: TaxonomyTool> App<T, ThreadSleeper> {
    pub fn new(tool: T, policy: RetryPolicy) -> Self {
        Self::with_sleeper(tool, policy, ThreadSleeper)
    }
}

impl<T: TaxonomyTool, P: Sleeper> App<T, P> {
    pub fn with_sleeper(tool: T, policy: RetryPolicy, sleeper: P) -> Self {
        Self {
            resolver: Resolver::with_sleeper(LineageFetcher::new(tool), policy, sleeper),
        }
    }

    /// Reads `input`, resolves the lineage of every distinct TaxID and writes
    /// the enriched table to `output`. Input problems abort before any lookup
    /// and nothing is written.
    pub fn run(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, TaxError> {
        let started = Instant::now();
        let table = Table::read_tsv(input.as_std_path())?;
        let taxids = table.unique_taxids()?;

        sink.event(ProgressEvent {
            message: format!("Processing {} unique TaxIDs...", taxids.len()),
            elapsed: None,
        });
        info!(
            input = %input,
            unique = taxids.len(),
            rows = table.rows.len(),
            "starting lineage lookup"
        );

        let resolution = self.resolver.resolve_all(&taxids, sink);
        let merged = table.merge_lineage(&resolution.records)?;
        merged.write_tsv(output.as_std_path())?;

        sink.event(ProgressEvent {
            message: format!("Taxonomy information successfully saved to {output}"),
            elapsed: Some(started.elapsed()),
        });

        Ok(RunSummary {
            input: input.to_string(),
            output: output.to_string(),
            rows: merged.rows.len(),
            unique_taxids: taxids.len(),
            resolved: resolution.resolved.len(),
            exhausted: resolution
                .exhausted
                .iter()
                .map(|taxid| taxid.to_string())
                .collect(),
            rounds: resolution.rounds,
            lookups: resolution.attempts,
            tool_version: self.resolver.source().tool().version(),
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
