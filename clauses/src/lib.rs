//! mailq clauses: search-clause compilation for a mail store.
//!
//! Turns individual search clauses into operations that an execution engine
//! runs against a full-text index or a relational metadata store.

pub mod config;
pub mod context;
pub mod date;
pub mod error;
pub mod numeric;
pub mod operation;
pub mod query;
pub mod range;
pub mod tokenizer;

pub use config::Config;
pub use context::{AccountZone, SearchContext, StaticContext};
pub use date::{DateParser, DateType};
pub use error::{Error, Result};
pub use operation::{CompiledOperation, FullTextOperation, FullTextTerm, Predicate, RelationalOperation};
pub use query::{builtin, builtin_names, Clause, Conjunction, Modifier, QueryNode, SubQuery};
pub use range::{Bound, CompareOp, Range};
pub use tokenizer::{Analyzer, StandardAnalyzer};
