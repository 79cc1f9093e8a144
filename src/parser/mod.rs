// Parser module: turns free-text purchase requests into structured criteria.

pub mod query_parser;
pub mod vocabulary;

pub use query_parser::{Parser, ParserOptions, QueryParser};
pub use vocabulary::Vocabulary;
