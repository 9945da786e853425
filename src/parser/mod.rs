pub mod ast;
pub mod filter_parser;
pub mod tokenizer;

pub use ast::{AttributePath, CompareOp, FilterNode, Literal, LogicalOp, PathSegment};
pub use filter_parser::{parse, parse_attribute_path, parse_filter};
pub use tokenizer::{tokenize, Token, TokenKind};
