use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{LineageRecord, TaxId};
use crate::lineage::LineageSource;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total lookup attempts allowed per TaxID.
    pub max_retries: u32,
    /// Constant pause between rounds.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_DELAY,
        }
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Pending(u32),
    Resolved(LineageRecord),
    Exhausted,
}

impl LookupState {
    /// Terminal lineage for this state; `None` while still pending.
    pub fn record(&self) -> Option<LineageRecord> {
        match self {
            LookupState::Pending(_) => None,
            LookupState::Resolved(record) => Some(record.clone()),
            LookupState::Exhausted => Some(LineageRecord::unknown()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub records: BTreeMap<TaxId, LineageRecord>,
    pub resolved: Vec<TaxId>,
    pub exhausted: Vec<TaxId>,
    pub rounds: u32,
    pub attempts: u32,
}

pub struct Resolver<S: LineageSource, P: Sleeper = ThreadSleeper> {
    source: S,
    sleeper: P,
    policy: RetryPolicy,
}

impl<S: LineageSource, P: Sleeper> Resolver<S, P> {
    pub fn with_sleeper(source: S, policy: RetryPolicy, sleeper: P) -> Self {
        Self {
            source,
            sleeper,
            policy,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves every TaxID to a lineage. Lookup failures never escape: a TaxID
    /// that fails `max_retries` times gets the all-unknown record.
    pub fn resolve_all<'a, I>(&self, taxids: I, sink: &dyn ProgressSink) -> Resolution
    where
        I: IntoIterator<Item = &'a TaxId>,
    {
        let unique: BTreeSet<TaxId> = taxids.into_iter().cloned().collect();
        let mut states: BTreeMap<TaxId, LookupState> = unique
            .into_iter()
            .map(|taxid| {
                let state = if self.policy.max_retries == 0 {
                    LookupState::Exhausted
                } else {
                    LookupState::Pending(0)
                };
                (taxid, state)
            })
            .collect();

        let mut rounds = 0u32;
        let mut attempts = 0u32;
        loop {
            let pending: Vec<(TaxId, u32)> = states
                .iter()
                .filter_map(|(taxid, state)| match state {
                    LookupState::Pending(n) => Some((taxid.clone(), *n)),
                    _ => None,
                })
                .collect();
            if pending.is_empty() {
                break;
            }

            rounds += 1;
            let started = Instant::now();
            for (taxid, failures) in pending {
                attempts += 1;
                let next = match self.source.fetch(&taxid) {
                    Ok(record) => LookupState::Resolved(record),
                    Err(err) => {
                        let failures = failures + 1;
                        warn!(
                            %taxid,
                            attempt = failures,
                            transient = err.is_transient(),
                            error = %err,
                            "lineage lookup failed"
                        );
                        if failures < self.policy.max_retries {
                            LookupState::Pending(failures)
                        } else {
                            warn!(%taxid, "retries exhausted; using unknown lineage");
                            LookupState::Exhausted
                        }
                    }
                };
                states.insert(taxid, next);
            }

            let remaining = states
                .values()
                .filter(|state| matches!(state, LookupState::Pending(_)))
                .count();
            if remaining > 0 {
                let message = format!(
                    "Retrying {remaining} failed TaxIDs after {} seconds...",
                    self.policy.delay.as_secs_f64()
                );
                info!(round = rounds, remaining, "{message}");
                sink.event(ProgressEvent {
                    message,
                    elapsed: Some(started.elapsed()),
                });
                self.sleeper.sleep(self.policy.delay);
            }
        }

        let mut resolution = Resolution {
            rounds,
            attempts,
            ..Resolution::default()
        };
        for (taxid, state) in states {
            match &state {
                LookupState::Resolved(_) => resolution.resolved.push(taxid.clone()),
                LookupState::Exhausted => resolution.exhausted.push(taxid.clone()),
                LookupState::Pending(_) => continue,
            }
            if let Some(record) = state.record() {
                resolution.records.insert(taxid, record);
            }
        }
        resolution
    }
}
