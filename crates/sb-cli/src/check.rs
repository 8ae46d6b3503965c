//! `check`: CSV of URLs in, CSV of match and residual records out.

use std::io::{Read, Write};
use std::time::Duration;

use log::info;

use sb_core::coordinator::{BatchCoordinator, CoordinatorConfig, CoordinatorStats, FailurePolicy};
use sb_core::protocol::LookupService;

use crate::input::{open_input, UrlRows};
use crate::lookup::HttpLookupService;
use crate::output::{open_output, RecordWriter};

pub struct CheckOptions {
    pub input: String,
    pub output: String,
    pub api_key: String,
    pub server: String,
    pub batch_size: usize,
    pub skip_failed_batches: bool,
    pub has_header: bool,
    pub timeout_secs: u64,
    pub retries: usize,
}

pub fn run_check(opts: CheckOptions) -> Result<CoordinatorStats, String> {
    let service = HttpLookupService::new(
        &opts.server,
        &opts.api_key,
        Duration::from_secs(opts.timeout_secs),
        opts.retries,
    )?;
    let config = CoordinatorConfig {
        batch_size: opts.batch_size,
        failure_policy: if opts.skip_failed_batches {
            FailurePolicy::SkipBatch
        } else {
            FailurePolicy::Abort
        },
        ..Default::default()
    };

    let input = open_input(&opts.input)?;
    let output = open_output(&opts.output)?;
    let stats = check_urls(service, config, input, opts.has_header, output)?;

    info!(
        "{} URLs checked: {} prefixes in {} batches, {} matches, {} residual hashes",
        stats.submitted, stats.prefixes_sent, stats.batches_sent, stats.matches, stats.residuals
    );
    Ok(stats)
}

/// Drive a coordinator over a CSV source, writing every record as it appears.
pub fn check_urls<L, R, W>(
    service: L,
    config: CoordinatorConfig,
    input: R,
    has_header: bool,
    output: W,
) -> Result<CoordinatorStats, String>
where
    L: LookupService,
    R: Read,
    W: Write,
{
    let mut coordinator = BatchCoordinator::new(service, config);
    let mut writer = RecordWriter::new(output)?;

    for url in UrlRows::new(input, has_header) {
        let url = url?;
        let records = coordinator
            .submit(&url)
            .map_err(|e| format!("Lookup failed: {}", e))?;
        writer.write_all(&records)?;
    }

    let records = coordinator
        .finish()
        .map_err(|e| format!("Lookup failed: {}", e))?;
    writer.write_all(&records)?;
    writer.finish()?;

    Ok(coordinator.stats())
}
