pub mod definitions;
pub mod resolver;

// Re-export commonly used items from definitions
pub use definitions::*;
pub use resolver::{
    resource_view, AttributeDescriptor, AttributeResolver, Resolution, ResolvedPath, Scope, Step,
};
