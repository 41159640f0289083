use super::{Select, Value};

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
        }
    }
}

/// A boolean filter expression over the columns of one table.
///
/// Column names are unqualified; every subquery is uncorrelated and scoped
/// to its own table.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    BinaryOp(ExprBinaryOp),
    InList(ExprInList),
    InSubquery(ExprInSubquery),
    Between(ExprBetween),
    IsNull(ExprIsNull),
    Like(ExprLike),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBinaryOp {
    pub column: String,
    pub op: BinaryOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInList {
    pub column: String,
    pub list: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInSubquery {
    pub column: String,
    pub query: Box<Select>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBetween {
    pub column: String,
    pub low: Value,
    pub high: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprIsNull {
    pub column: String,
    pub negate: bool,
}

/// `column LIKE pattern`. The pattern already carries its `%` wildcards and
/// escapes `%`, `_` and `\` with a backslash.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLike {
    pub column: String,
    pub pattern: String,
    pub case_insensitive: bool,
}

impl Expr {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(column, BinaryOp::Eq, value)
    }

    pub fn binary_op(column: impl Into<String>, op: BinaryOp, value: impl Into<Value>) -> Expr {
        Expr::BinaryOp(ExprBinaryOp {
            column: column.into(),
            op,
            value: value.into(),
        })
    }

    pub fn in_list(column: impl Into<String>, list: Vec<Value>) -> Expr {
        Expr::InList(ExprInList {
            column: column.into(),
            list,
        })
    }

    pub fn in_subquery(column: impl Into<String>, query: Select) -> Expr {
        Expr::InSubquery(ExprInSubquery {
            column: column.into(),
            query: Box::new(query),
        })
    }

    pub fn is_null(column: impl Into<String>, negate: bool) -> Expr {
        Expr::IsNull(ExprIsNull {
            column: column.into(),
            negate,
        })
    }

    /// Builds a conjunction, flattening nested `And`s and unwrapping a single
    /// operand.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(inner) => flat.extend(inner),
                operand => flat.push(operand),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::And(vec![]))
        } else {
            Expr::And(flat)
        }
    }

    /// Builds a disjunction, flattening nested `Or`s.
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::Or(inner) => flat.extend(inner),
                operand => flat.push(operand),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::Or(vec![]))
        } else {
            Expr::Or(flat)
        }
    }

    pub fn not(expr: Expr) -> Expr {
        Expr::Not(Box::new(expr))
    }
}

/// Escapes `LIKE` metacharacters so `value` matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
