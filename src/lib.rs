//! Wish Sniper - turns free-text purchase requests into search criteria and
//! notifies users when a newly listed product matches what they asked for.

pub mod config;
pub mod matcher;
pub mod model;
pub mod normalizer;
pub mod notifier;
pub mod parser;
pub mod service;
pub mod storage;
pub mod utils;

pub use matcher::{FulfillmentPolicy, MatchEngine, MatchReport, ProgressCounter, Verdict};
pub use model::{ParsedQuery, Product, Request, RequestStatus};
pub use normalizer::normalize_price;
pub use parser::{Parser, ParserOptions, QueryParser, Vocabulary};
pub use service::WatchService;
