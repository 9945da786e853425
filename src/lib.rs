pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod query;
pub mod resource;
pub mod schema;
pub mod utils;

// Re-export commonly used types for easier access
pub use backend::{InMemoryStore, PermissionOracle, ResourceStore, SuperuserPolicy};
pub use config::AppConfig;
pub use error::{AppError, AppResult, SyntaxError};
pub use models::{EvaluationContext, UserRecord};
pub use parser::{parse_filter, FilterNode};
pub use query::{QueryEngine, QueryResult, SearchRequest, TriState};
pub use resource::AttributeFilter;
