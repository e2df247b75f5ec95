//! Channel reachability probing
//!
//! Every channel gets one lightweight request with its own deadline. Any
//! response inside the deadline, whatever its status code, counts as
//! reachable; a timeout or transport failure counts as offline. Probes fan out
//! with a cap on how many are in flight and the caller awaits the complete
//! [`ProbeReport`], which doubles as the completion signal for statistics.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::errors::ProbeError;
use crate::models::ChannelStatus;
use crate::utils::url::UrlUtils;

/// A channel to probe, identified the same way the deduplicator does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub url: String,
    pub title: String,
}

/// Targets captured from one catalog generation
#[derive(Debug, Clone, Default)]
pub struct ProbeJob {
    pub generation: u64,
    pub targets: Vec<ProbeTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub url: String,
    pub title: String,
    pub status: ChannelStatus,
    /// Why the channel was classified offline
    pub error: Option<ProbeError>,
}

/// Outcomes for every target of a [`ProbeJob`], tagged with its generation
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub generation: u64,
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeReport {
    pub fn active_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == ChannelStatus::Active)
            .count()
    }
}

/// Single reachability check against a URL
///
/// Returning `Ok` means the endpoint answered. Deadlines are applied by the
/// caller, implementations need not enforce one.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}

/// `HEAD` request probe
pub struct HttpReachabilityProbe {
    client: Client,
}

impl HttpReachabilityProbe {
    /// Wrap a client; callers pass one built with no-cache default headers
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        match self.client.head(url).send().await {
            Ok(response) => {
                debug!(
                    "Probe of {} answered {}",
                    UrlUtils::obfuscate_credentials(url),
                    response.status()
                );
                Ok(())
            }
            Err(e) => Err(ProbeError::Failure {
                url: url.to_string(),
                message: UrlUtils::obfuscate_credentials(&e.to_string()),
            }),
        }
    }
}

/// Fans probes out over a job and classifies every target
#[derive(Clone)]
pub struct StatusProber {
    probe: Arc<dyn ReachabilityProbe>,
    timeout: Duration,
    max_concurrent: usize,
}

impl StatusProber {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, config: &ProbeConfig) -> Self {
        Self {
            probe,
            timeout: config.timeout,
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe every target and wait for all of them to settle
    pub async fn probe_all(&self, job: ProbeJob) -> ProbeReport {
        let total = job.targets.len();
        debug!(
            "Probing {} channels (generation {}, at most {} in flight)",
            total, job.generation, self.max_concurrent
        );

        let outcomes: Vec<ProbeOutcome> = futures::stream::iter(job.targets)
            .map(|target| self.probe_one(target))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let report = ProbeReport {
            generation: job.generation,
            outcomes,
        };
        info!(
            "Probed {} channels: {} active, {} offline",
            total,
            report.active_count(),
            total - report.active_count()
        );
        report
    }

    async fn probe_one(&self, target: ProbeTarget) -> ProbeOutcome {
        let result = match tokio::time::timeout(self.timeout, self.probe.probe(&target.url)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                url: target.url.clone(),
                timeout: self.timeout,
            }),
        };

        match result {
            Ok(()) => ProbeOutcome {
                url: target.url,
                title: target.title,
                status: ChannelStatus::Active,
                error: None,
            },
            Err(e) => {
                debug!(
                    "Channel '{}' offline: {}",
                    target.title,
                    UrlUtils::obfuscate_credentials(&e.to_string())
                );
                ProbeOutcome {
                    url: target.url,
                    title: target.title,
                    status: ChannelStatus::Offline,
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers per URL: Ok, failure, or never (hangs past any deadline)
    struct ScriptedProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReachabilityProbe for ScriptedProbe {
        async fn probe(&self, url: &str) -> Result<(), ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let result = if url.contains("hang") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            } else if url.contains("down") {
                Err(ProbeError::Failure {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                })
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn job(urls: &[&str]) -> ProbeJob {
        ProbeJob {
            generation: 7,
            targets: urls
                .iter()
                .enumerate()
                .map(|(i, url)| ProbeTarget {
                    url: url.to_string(),
                    title: format!("Channel {}", i + 1),
                })
                .collect(),
        }
    }

    fn config(timeout: Duration, max_concurrent: usize) -> ProbeConfig {
        ProbeConfig {
            timeout,
            max_concurrent,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_classification() {
        let prober = StatusProber::new(
            Arc::new(ScriptedProbe::new()),
            &config(Duration::from_secs(5), 8),
        );
        let report = prober
            .probe_all(job(&["http://up/1", "http://down/2", "http://hang/3"]))
            .await;

        assert_eq!(report.generation, 7);
        let by_url: HashMap<_, _> = report
            .outcomes
            .iter()
            .map(|o| (o.url.as_str(), o))
            .collect();
        assert_eq!(by_url["http://up/1"].status, ChannelStatus::Active);
        assert_eq!(by_url["http://down/2"].status, ChannelStatus::Offline);
        assert!(matches!(
            by_url["http://down/2"].error,
            Some(ProbeError::Failure { .. })
        ));
        assert_eq!(by_url["http://hang/3"].status, ChannelStatus::Offline);
        assert!(matches!(
            by_url["http://hang/3"].error,
            Some(ProbeError::Timeout { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_capped() {
        let probe = Arc::new(ScriptedProbe::new());
        let prober = StatusProber::new(probe.clone(), &config(Duration::from_secs(5), 3));
        let urls: Vec<String> = (0..20).map(|i| format!("http://up/{i}")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let report = prober.probe_all(job(&refs)).await;
        assert_eq!(report.outcomes.len(), 20);
        assert_eq!(report.active_count(), 20);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_does_not_hold_back_others() {
        let prober = StatusProber::new(
            Arc::new(ScriptedProbe::new()),
            &config(Duration::from_secs(5), 64),
        );
        let started = tokio::time::Instant::now();
        let report = prober
            .probe_all(job(&["http://hang/a", "http://hang/b", "http://up/c"]))
            .await;
        assert_eq!(report.outcomes.len(), 3);
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_empty_job() {
        let prober = StatusProber::new(Arc::new(ScriptedProbe::new()), &ProbeConfig::default());
        let report = prober.probe_all(ProbeJob::default()).await;
        assert!(report.outcomes.is_empty());
    }
}
