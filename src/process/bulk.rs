// src/process/bulk.rs

use anyhow::{anyhow, Result};
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info, instrument, warn};

use super::month::{process_month, JobStatus, MonthJob, Stage};
use crate::config::Settings;
use crate::fetch::TripSource;
use crate::schema::Service;
use crate::storage::BlobStore;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Outcome of a single month job. `Err` means the job hit a fatal error
/// (parse/cast/encode failure or a panic).
#[derive(Debug)]
pub struct JobResult {
    pub month: u32,
    pub outcome: Result<JobStatus>,
}

/// Everything that happened for one (year, service) run, sorted by month.
#[derive(Debug)]
pub struct BulkReport {
    pub year: i32,
    pub service: Service,
    pub jobs: Vec<JobResult>,
}

impl BulkReport {
    pub fn uploaded(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.jobs.iter().filter_map(|j| match &j.outcome {
            Ok(JobStatus::Uploaded { object, .. }) => Some((j.month, object.as_str())),
            _ => None,
        })
    }

    pub fn abandoned(&self) -> impl Iterator<Item = (u32, Stage, &str)> + '_ {
        self.jobs.iter().filter_map(|j| match &j.outcome {
            Ok(JobStatus::Abandoned { stage, reason }) => Some((j.month, *stage, reason.as_str())),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (u32, &anyhow::Error)> + '_ {
        self.jobs
            .iter()
            .filter_map(|j| j.outcome.as_ref().err().map(|e| (j.month, e)))
    }

    pub fn total_rows(&self) -> usize {
        self.jobs
            .iter()
            .map(|j| match &j.outcome {
                Ok(JobStatus::Uploaded { rows, .. }) => *rows,
                _ => 0,
            })
            .sum()
    }

    /// True only when all twelve months were uploaded. A month missing from
    /// `jobs` counts against the run.
    pub fn is_success(&self) -> bool {
        self.uploaded().count() == MONTHS_PER_YEAR as usize
    }
}

/// Downloads a year of monthly CSVs for one service and lands them in the
/// object store as Parquet, `max_workers` months at a time.
pub struct WebToStore {
    source: Arc<dyn TripSource>,
    store: Arc<dyn BlobStore>,
    base_url: Arc<str>,
    max_workers: usize,
}

impl WebToStore {
    pub fn new(source: Arc<dyn TripSource>, store: Arc<dyn BlobStore>, settings: &Settings) -> Self {
        Self {
            source,
            store,
            base_url: Arc::from(settings.source_base_url.as_str()),
            max_workers: settings.max_workers.max(1),
        }
    }

    /// Submit all twelve months and wait for every one of them.
    ///
    /// An unknown `service` is rejected before anything is submitted.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, year: i32, service: &str) -> Result<BulkReport> {
        let service: Service = service.parse()?;
        let sem = Arc::new(Semaphore::new(self.max_workers));
        let mut jobs = JoinSet::new();

        for month in 1..=MONTHS_PER_YEAR {
            let job = MonthJob {
                service,
                year,
                month,
            };
            let source = Arc::clone(&self.source);
            let store = Arc::clone(&self.store);
            let base_url = Arc::clone(&self.base_url);
            let sem = Arc::clone(&sem);

            jobs.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => return (month, Err(anyhow!(err))),
                };
                let work = process_month(source.as_ref(), store.as_ref(), &base_url, job);
                let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(anyhow!("month job panicked: {}", panic_message(&*panic))),
                };
                (month, outcome)
            });
        }
        info!(%service, year, submitted = MONTHS_PER_YEAR, "month jobs submitted");

        let mut results = Vec::with_capacity(MONTHS_PER_YEAR as usize);
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((month, outcome)) => {
                    if let Err(err) = &outcome {
                        error!(%service, year, month, "month job failed: {:#}", err);
                    }
                    results.push(JobResult { month, outcome });
                }
                // Only reachable if the runtime shuts down under us; the month
                // is then missing from the report and `is_success` is false.
                Err(join_err) => warn!("month task did not complete: {}", join_err),
            }
        }
        results.sort_by_key(|r| r.month);

        let report = BulkReport {
            year,
            service,
            jobs: results,
        };
        info!(
            %service,
            year,
            uploaded = report.uploaded().count(),
            abandoned = report.abandoned().count(),
            failed = report.failed().count(),
            rows = report.total_rows(),
            "bulk run finished"
        );
        Ok(report)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
