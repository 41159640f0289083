use super::Value;
use crate::{Error, Result};

/// Separator between path segments and the operator in a filter expression.
pub const SEPARATOR: &str = "__";

/// Comparison operator of a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Between,
    IsNull,
}

impl Op {
    pub fn from_name(name: &str) -> Option<Op> {
        Some(match name {
            "exact" => Op::Exact,
            "iexact" => Op::IExact,
            "contains" => Op::Contains,
            "icontains" => Op::IContains,
            "startswith" => Op::StartsWith,
            "istartswith" => Op::IStartsWith,
            "endswith" => Op::EndsWith,
            "iendswith" => Op::IEndsWith,
            "gt" => Op::Gt,
            "gte" => Op::Gte,
            "lt" => Op::Lt,
            "lte" => Op::Lte,
            "in" => Op::In,
            "between" => Op::Between,
            "isnull" => Op::IsNull,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::Exact => "exact",
            Op::IExact => "iexact",
            Op::Contains => "contains",
            Op::IContains => "icontains",
            Op::StartsWith => "startswith",
            Op::IStartsWith => "istartswith",
            Op::EndsWith => "endswith",
            Op::IEndsWith => "iendswith",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::In => "in",
            Op::Between => "between",
            Op::IsNull => "isnull",
        }
    }

    /// Returns `true` for the `LIKE`-based operators.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Op::IExact
                | Op::Contains
                | Op::IContains
                | Op::StartsWith
                | Op::IStartsWith
                | Op::EndsWith
                | Op::IEndsWith
        )
    }

    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Op::IExact | Op::IContains | Op::IStartsWith | Op::IEndsWith
        )
    }
}

/// Argument of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

impl Arg {
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Arg {
        Arg::List(items.into_iter().map(Into::into).collect())
    }

    pub fn range(low: impl Into<Value>, high: impl Into<Value>) -> Arg {
        Arg::Range(low.into(), high.into())
    }
}

impl<T: Into<Value>> From<T> for Arg {
    fn from(value: T) -> Arg {
        match value.into() {
            Value::List(items) => Arg::List(items),
            value => Arg::Value(value),
        }
    }
}

/// A parsed filter expression: the field path and the operator.
///
/// `profile__age__gte` parses to the path `["profile", "age"]` and
/// [`Op::Gte`]. A missing operator means [`Op::Exact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub path: Vec<String>,
    pub op: Op,
}

impl Lookup {
    pub fn parse(expr: &str) -> Result<Lookup> {
        let mut path: Vec<String> = expr.split(SEPARATOR).map(str::to_string).collect();

        if path.iter().any(|segment| segment.is_empty()) {
            return Err(Error::malformed_filter(expr, "empty path segment"));
        }

        let op = match path.last().and_then(|last| Op::from_name(last)) {
            Some(op) if path.len() > 1 => {
                path.pop();
                op
            }
            // A lone operator name is treated as a field name.
            _ => Op::Exact,
        };

        Ok(Lookup { path, op })
    }
}

/// One filter predicate: an unparsed expression and its argument.
///
/// The expression is parsed when the enclosing query is compiled so that a
/// malformed filter surfaces from the terminal call.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub expr: String,
    pub arg: Arg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Predicate(Predicate),
    Group(Condition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionItem {
    /// Joined to the preceding items with `OR` instead of `AND`.
    pub or: bool,
    pub negated: bool,
    pub node: ConditionNode,
}

/// A tree of filter predicates joined with `AND` / `OR` / `NOT`.
///
/// Items are folded left to right, so
/// `Condition::new().and("a", 1).or("b", 2).and("c", 3)` reads
/// `((a = 1 OR b = 2) AND c = 3)`. Use nested conditions for other
/// groupings.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Condition {
    pub items: Vec<ConditionItem>,
}

impl Condition {
    pub fn new() -> Condition {
        Condition::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn and(self, expr: impl Into<String>, arg: impl Into<Arg>) -> Condition {
        self.push_predicate(false, false, expr, arg)
    }

    pub fn and_not(self, expr: impl Into<String>, arg: impl Into<Arg>) -> Condition {
        self.push_predicate(false, true, expr, arg)
    }

    pub fn or(self, expr: impl Into<String>, arg: impl Into<Arg>) -> Condition {
        self.push_predicate(true, false, expr, arg)
    }

    pub fn or_not(self, expr: impl Into<String>, arg: impl Into<Arg>) -> Condition {
        self.push_predicate(true, true, expr, arg)
    }

    pub fn and_cond(self, cond: Condition) -> Condition {
        self.push_group(false, false, cond)
    }

    pub fn and_not_cond(self, cond: Condition) -> Condition {
        self.push_group(false, true, cond)
    }

    pub fn or_cond(self, cond: Condition) -> Condition {
        self.push_group(true, false, cond)
    }

    pub fn or_not_cond(self, cond: Condition) -> Condition {
        self.push_group(true, true, cond)
    }

    fn push_predicate(
        mut self,
        or: bool,
        negated: bool,
        expr: impl Into<String>,
        arg: impl Into<Arg>,
    ) -> Condition {
        self.items.push(ConditionItem {
            or,
            negated,
            node: ConditionNode::Predicate(Predicate {
                expr: expr.into(),
                arg: arg.into(),
            }),
        });
        self
    }

    fn push_group(mut self, or: bool, negated: bool, cond: Condition) -> Condition {
        // Empty groups carry no constraint.
        if !cond.is_empty() {
            self.items.push(ConditionItem {
                or,
                negated,
                node: ConditionNode::Group(cond),
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_field() {
        let lookup = Lookup::parse("name").unwrap();
        assert_eq!(lookup.path, vec!["name"]);
        assert_eq!(lookup.op, Op::Exact);
    }

    #[test]
    fn parse_relation_path_with_operator() {
        let lookup = Lookup::parse("profile__age__gte").unwrap();
        assert_eq!(lookup.path, vec!["profile", "age"]);
        assert_eq!(lookup.op, Op::Gte);
    }

    #[test]
    fn parse_field_named_like_operator() {
        let lookup = Lookup::parse("in").unwrap();
        assert_eq!(lookup.path, vec!["in"]);
        assert_eq!(lookup.op, Op::Exact);
    }

    #[test]
    fn parse_rejects_empty_segment() {
        for expr in ["", "name__", "__name", "a____b"] {
            let err = Lookup::parse(expr).unwrap_err();
            assert!(err.is_malformed_filter(), "{expr}: {err}");
        }
    }

    #[test]
    fn list_values_become_list_args() {
        assert_eq!(
            Arg::from(Value::list([1, 2])),
            Arg::List(vec![Value::I64(1), Value::I64(2)])
        );
        assert_eq!(Arg::from("x"), Arg::Value(Value::from("x")));
    }

    #[test]
    fn empty_groups_are_dropped() {
        let cond = Condition::new().and("a", 1).or_cond(Condition::new());
        assert_eq!(cond.items.len(), 1);
    }
}
