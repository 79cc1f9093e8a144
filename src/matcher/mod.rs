// Matcher module: compares new products against outstanding requests.

pub mod engine;
pub mod filters;
pub mod fulfillment;

pub use engine::{Evaluation, MatchEngine, MatchReport, Verdict};
pub use filters::{category_compatible, SkipReason};
pub use fulfillment::{FulfillmentPolicy, ProgressCounter};
