use std::fmt;

/// Comparison operators of the SCIM filter grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
    Pr,
}

impl CompareOp {
    pub fn from_keyword(word: &str) -> Option<CompareOp> {
        let op = match word.to_ascii_lowercase().as_str() {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "co" => CompareOp::Co,
            "sw" => CompareOp::Sw,
            "ew" => CompareOp::Ew,
            "gt" => CompareOp::Gt,
            "ge" => CompareOp::Ge,
            "lt" => CompareOp::Lt,
            "le" => CompareOp::Le,
            "pr" => CompareOp::Pr,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Co => "co",
            CompareOp::Sw => "sw",
            CompareOp::Ew => "ew",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Pr => "pr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    fn precedence(&self) -> u8 {
        match self {
            LogicalOp::Or => 1,
            LogicalOp::And => 2,
        }
    }
}

/// Comparison value as written in the filter
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("\"")
            }
            // Floats print in plain positional form so the tokenizer reads them back
            Literal::Number(n) => match n.as_f64().filter(|_| n.is_f64()) {
                Some(float) => {
                    let text = float.to_string();
                    if text.contains('.') {
                        f.write_str(&text)
                    } else {
                        write!(f, "{}.0", text)
                    }
                }
                None => write!(f, "{}", n),
            },
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// One dotted segment of an attribute path, with the optional `[...]`
/// value filter that selects elements of a multi-valued attribute
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub name: String,
    pub filter: Option<Box<FilterNode>>,
}

impl PathSegment {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub segments: Vec<PathSegment>,
}

impl AttributePath {
    /// Build a filter-free path from dotted text, e.g. `name.formatted`
    pub fn from_dotted(path: &str) -> Self {
        Self {
            segments: path.split('.').map(PathSegment::named).collect(),
        }
    }

    /// Dotted form without sub-filters, e.g. `emails.value` for
    /// `emails[type eq "work"].value`
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn has_sub_filter(&self) -> bool {
        self.segments.iter().any(|s| s.filter.is_some())
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            if let Some(filter) = &segment.filter {
                write!(f, "[{}]", filter)?;
            }
        }
        Ok(())
    }
}

/// Parsed filter expression. Nodes are built bottom-up by the parser and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Comparison {
        path: AttributePath,
        op: CompareOp,
        value: Option<Literal>,
    },
    Logical {
        op: LogicalOp,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
    Negation(Box<FilterNode>),
}

impl FilterNode {
    pub fn comparison(path: &str, op: CompareOp, value: Option<Literal>) -> Self {
        FilterNode::Comparison {
            path: AttributePath::from_dotted(path),
            op,
            value,
        }
    }

    pub fn and(left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(operand: FilterNode) -> Self {
        FilterNode::Negation(Box::new(operand))
    }

    /// Write `node`, parenthesized when it would otherwise re-associate
    /// under a parent with precedence `min` (left operand) or bind looser
    /// than or equal to it (right operand).
    fn fmt_operand(node: &FilterNode, min: u8, right: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match node {
            FilterNode::Logical { op, .. }
                if op.precedence() < min || (right && op.precedence() == min) =>
            {
                write!(f, "({})", node)
            }
            _ => write!(f, "{}", node),
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison { path, op, value } => {
                write!(f, "{} {}", path, op.as_str())?;
                if let Some(value) = value {
                    write!(f, " {}", value)?;
                }
                Ok(())
            }
            FilterNode::Logical { op, left, right } => {
                let keyword = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                FilterNode::fmt_operand(left, op.precedence(), false, f)?;
                write!(f, " {} ", keyword)?;
                FilterNode::fmt_operand(right, op.precedence(), true, f)
            }
            FilterNode::Negation(operand) => match operand.as_ref() {
                FilterNode::Comparison { .. } => write!(f, "not {}", operand),
                _ => write!(f, "not ({})", operand),
            },
        }
    }
}
