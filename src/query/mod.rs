pub mod cache;
pub mod engine;
pub mod evaluator;
pub mod tri_state;

pub use cache::FilterCache;
pub use engine::{Pagination, QueryEngine, QueryResult, SearchRequest, SortOrder};
pub use evaluator::{evaluate, Evaluator};
pub use tri_state::TriState;
