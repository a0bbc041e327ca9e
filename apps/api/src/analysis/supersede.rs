//! Last-request-wins supersession for analysis calls.
//!
//! Each session owns one `AnalysisSlot`. Issuing a request bumps a generation
//! counter held in a `watch` channel; every in-flight call watches that counter
//! and is dropped (its future cancelled) as soon as it moves past its ticket.
//! Only a call whose ticket is still current may publish its result.

use std::future::Future;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::analysis::models::ProvenancedResult;

/// Generation number handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Analysis request {generation} was superseded by a newer request")]
pub struct Superseded {
    pub generation: u64,
}

pub struct AnalysisSlot {
    generation: watch::Sender<u64>,
    latest: Mutex<Option<ProvenancedResult>>,
}

impl Default for AnalysisSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSlot {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation,
            latest: Mutex::new(None),
        }
    }

    /// Starts a new request. Any request issued earlier is now stale.
    pub fn issue(&self) -> Ticket {
        let mut issued = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            issued = *g;
        });
        Ticket(issued)
    }

    /// Makes every outstanding ticket stale without starting a new request.
    pub fn cancel(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        *self.generation.borrow() == ticket.0
    }

    /// Drives `analysis` unless the ticket is superseded first. A completed
    /// result is published only if the ticket is still current at that point.
    pub async fn run<F>(&self, ticket: Ticket, analysis: F) -> Result<ProvenancedResult, Superseded>
    where
        F: Future<Output = ProvenancedResult>,
    {
        let superseded = Superseded {
            generation: ticket.0,
        };
        let mut rx = self.generation.subscribe();
        let overtaken = async move {
            loop {
                if *rx.borrow_and_update() != ticket.0 {
                    return;
                }
                if rx.changed().await.is_err() {
                    // Sender lives as long as the slot, so this never resolves.
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            biased;
            _ = overtaken => {
                debug!("Analysis request {} cancelled mid-flight", ticket.0);
                Err(superseded)
            }
            result = analysis => {
                let mut latest = self.latest.lock().await;
                if !self.is_current(ticket) {
                    debug!("Analysis request {} finished after being superseded", ticket.0);
                    return Err(superseded);
                }
                *latest = Some(result.clone());
                Ok(result)
            }
        }
    }

    /// The most recently published result.
    pub async fn latest(&self) -> Option<ProvenancedResult> {
        self.latest.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::analysis::fallback::synthesize;
    use crate::analysis::models::FallbackReason;
    use crate::assessment::normalizer::normalize;

    fn result_for(skill: &str) -> ProvenancedResult {
        let profile = normalize(vec![(format!("{skill}::0"), 50.0)], None);
        ProvenancedResult::fallback(
            synthesize(&profile),
            FallbackReason::NoProviderConfigured,
            None,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_supersedes_first() {
        let slot = Arc::new(AnalysisSlot::new());

        let first_ticket = slot.issue();
        let first = tokio::spawn({
            let slot = Arc::clone(&slot);
            async move {
                slot.run(first_ticket, async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    result_for("Slow")
                })
                .await
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let second_ticket = slot.issue();
        let second = slot
            .run(second_ticket, async { result_for("Fast") })
            .await
            .unwrap();

        let first = first.await.unwrap();
        assert_eq!(first.unwrap_err().generation, first_ticket.generation());

        let published = slot.latest().await.unwrap();
        assert_eq!(published.analysis_id, second.analysis_id);
        assert_eq!(published.result.skills_analysis.strengths, vec!["Fast"]);
    }

    #[tokio::test]
    async fn test_stale_ticket_never_publishes() {
        let slot = AnalysisSlot::new();
        let stale = slot.issue();
        let _current = slot.issue();

        assert!(!slot.is_current(stale));
        assert!(slot.run(stale, async { result_for("Old") }).await.is_err());
        assert!(slot.latest().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_request() {
        let slot = Arc::new(AnalysisSlot::new());
        let ticket = slot.issue();
        let pending = tokio::spawn({
            let slot = Arc::clone(&slot);
            async move {
                slot.run(ticket, async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    result_for("Never")
                })
                .await
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        slot.cancel();

        assert!(pending.await.unwrap().is_err());
        assert!(slot.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_rerun_replaces_published_result() {
        let slot = AnalysisSlot::new();
        let t1 = slot.issue();
        slot.run(t1, async { result_for("One") }).await.unwrap();
        let t2 = slot.issue();
        slot.run(t2, async { result_for("Two") }).await.unwrap();

        let published = slot.latest().await.unwrap();
        assert_eq!(published.result.skills_analysis.strengths, vec!["Two"]);
    }
}
