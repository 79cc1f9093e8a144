use crate::matcher::filters::{rejection, SkipReason};
use crate::matcher::fulfillment::FulfillmentPolicy;
use crate::model::{MatchError, Product, Request, StorageError};
use crate::notifier::NotificationDispatcher;
use crate::storage::RequestStore;
use crate::utils::mask_email;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// Reload-and-reapply rounds after a version conflict on write-back.
const MAX_SAVE_RETRIES: usize = 3;

/// What happened to one candidate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skipped(SkipReason),
    /// Product already recorded on the request; nothing was sent or written.
    Duplicate,
    /// A dispatch was attempted and the match recorded. `delivered` is false
    /// when the dispatcher failed.
    Notified { delivered: bool, fulfilled: bool },
}

#[derive(Debug)]
pub struct Evaluation {
    pub request: Request,
    pub verdict: Verdict,
    /// Set when the write-back of a notified request failed.
    pub persist_error: Option<StorageError>,
}

impl Evaluation {
    pub fn notified(&self) -> bool {
        matches!(self.verdict, Verdict::Notified { .. })
    }

    pub fn persisted(&self) -> bool {
        self.notified() && self.persist_error.is_none()
    }
}

/// Per-candidate results for one product, in candidate order.
#[derive(Debug)]
pub struct MatchReport {
    pub product_id: String,
    pub evaluations: Vec<Evaluation>,
}

impl MatchReport {
    pub fn notified(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| e.notified())
    }

    /// Requests whose new state was stored.
    pub fn updated(&self) -> impl Iterator<Item = &Request> {
        self.evaluations
            .iter()
            .filter(|e| e.persisted())
            .map(|e| &e.request)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Request, &StorageError)> {
        self.evaluations
            .iter()
            .filter_map(|e| e.persist_error.as_ref().map(|err| (&e.request, err)))
    }

    pub fn fulfilled_count(&self) -> usize {
        self.evaluations
            .iter()
            .filter(|e| matches!(e.verdict, Verdict::Notified { fulfilled: true, .. }))
            .count()
    }
}

/// Evaluates a product against outstanding requests: filter, dedup, notify,
/// record, close when the fulfillment threshold is reached, persist.
pub struct MatchEngine {
    dispatcher: Arc<dyn NotificationDispatcher>,
    store: Arc<dyn RequestStore>,
    policy: FulfillmentPolicy,
}

impl MatchEngine {
    pub fn new(
        dispatcher: Arc<dyn NotificationDispatcher>,
        store: Arc<dyn RequestStore>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            dispatcher,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &FulfillmentPolicy {
        &self.policy
    }

    /// Runs every candidate concurrently. Each evaluation owns its request, so
    /// one failing dispatch or write never affects the others; concurrent
    /// writers of the same request are caught by the store's version check.
    pub async fn evaluate(
        &self,
        product: &Product,
        candidates: Vec<Request>,
    ) -> Result<MatchReport, MatchError> {
        let price = product.validate()?;
        info!(
            "🔍 Evaluating product {} ({:.2}) against {} candidate requests",
            product.id,
            price,
            candidates.len()
        );

        let tasks = candidates
            .into_iter()
            .map(|request| self.evaluate_one(product, price, request));
        let evaluations = join_all(tasks).await;

        let report = MatchReport {
            product_id: product.id.clone(),
            evaluations,
        };
        info!(
            "✅ Product {}: {} notified, {} fulfilled, {} write failures",
            product.id,
            report.notified().count(),
            report.fulfilled_count(),
            report.failures().count()
        );
        Ok(report)
    }

    async fn evaluate_one(&self, product: &Product, price: f64, mut request: Request) -> Evaluation {
        if request.is_closed() {
            return skipped(request, SkipReason::Closed);
        }
        if let Some(reason) = rejection(&request.parsed_tags, product, price) {
            return skipped(request, reason);
        }
        if request.has_matched(&product.id) {
            info!("Already notified request {} about {}", request.id, product.id);
            return Evaluation {
                request,
                verdict: Verdict::Duplicate,
                persist_error: None,
            };
        }

        // The attempt is recorded whether or not delivery worked.
        let delivered = match self.dispatcher.send(&request.user_email, product).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Notification for request {} to {} failed: {}",
                    request.id,
                    mask_email(&request.user_email),
                    e
                );
                false
            }
        };

        let now = Utc::now();
        request.record_match(&product.id, now);
        let mut fulfilled = self.policy.apply(&mut request, now);

        let mut attempt = 0;
        let persist_error = loop {
            match self.store.save(&request).await {
                Ok(version) => {
                    request.version = version;
                    break None;
                }
                Err(StorageError::VersionConflict { id, .. }) if attempt < MAX_SAVE_RETRIES => {
                    attempt += 1;
                    warn!(
                        "Request {} changed while notifying about {}, reloading (attempt {})",
                        id, product.id, attempt
                    );
                    // The message is already out; only the bookkeeping is redone.
                    match self.store.get(id).await {
                        Ok(Some(mut fresh)) => {
                            fresh.record_match(&product.id, now);
                            fulfilled = self.policy.apply(&mut fresh, now);
                            request = fresh;
                        }
                        Ok(None) => break Some(StorageError::NotFound(id)),
                        Err(e) => break Some(e),
                    }
                }
                Err(e) => break Some(e),
            }
        };
        match &persist_error {
            None if fulfilled => {
                info!("🎯 Request {} fulfilled by product {}", request.id, product.id)
            }
            None => {}
            Some(e) => warn!("Saving request {} failed: {}", request.id, e),
        }

        Evaluation {
            request,
            verdict: Verdict::Notified {
                delivered,
                fulfilled,
            },
            persist_error,
        }
    }
}

fn skipped(request: Request, reason: SkipReason) -> Evaluation {
    Evaluation {
        request,
        verdict: Verdict::Skipped(reason),
        persist_error: None,
    }
}
