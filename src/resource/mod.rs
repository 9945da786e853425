pub mod attribute_filter;
pub mod projection;

pub use attribute_filter::AttributeFilter;
pub use projection::project_user;
