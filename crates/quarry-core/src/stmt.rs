mod condition;
pub use condition::{
    Arg, Condition, ConditionItem, ConditionNode, Lookup, Op, Predicate, SEPARATOR,
};

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{
    escape_like, BinaryOp, Expr, ExprBetween, ExprBinaryOp, ExprInList, ExprInSubquery,
    ExprIsNull, ExprLike,
};

mod insert;
pub use insert::{Insert, OnConflict};

mod select;
pub use select::{OrderBy, Projection, Select};

mod statement;
pub use statement::Statement;

mod ty;
pub use ty::Type;

mod update;
pub use update::{Assignment, Update};

mod value;
pub use value::{FromValue, Value};
