use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::Request;

/// Which counter on a request measures progress towards fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressCounter {
    NotificationsSent,
    MatchedProducts,
}

/// Closes a request once its progress counter reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FulfillmentPolicy {
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default = "default_counter")]
    pub counter: ProgressCounter,
}

fn default_threshold() -> usize {
    3
}

fn default_counter() -> ProgressCounter {
    ProgressCounter::NotificationsSent
}

impl Default for FulfillmentPolicy {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            counter: default_counter(),
        }
    }
}

impl FulfillmentPolicy {
    pub fn new(threshold: usize, counter: ProgressCounter) -> Self {
        Self { threshold, counter }
    }

    pub fn progress(&self, request: &Request) -> usize {
        match self.counter {
            ProgressCounter::NotificationsSent => request.notifications_sent.len(),
            ProgressCounter::MatchedProducts => request.matched_products.len(),
        }
    }

    /// Marks the request fulfilled when the threshold is reached. Returns true
    /// only on the transition itself.
    pub fn apply(&self, request: &mut Request, now: DateTime<Utc>) -> bool {
        if request.is_closed() || self.progress(request) < self.threshold.max(1) {
            return false;
        }
        request.mark_fulfilled(now)
    }
}
