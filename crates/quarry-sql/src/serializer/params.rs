use super::{Formatter, ToSql};

use quarry_core::stmt;

pub trait Params {
    fn push(&mut self, param: &stmt::Value) -> Placeholder;
}

/// Position of a bound parameter, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl Params for Vec<stmt::Value> {
    fn push(&mut self, value: &stmt::Value) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: super::Params>(self, f: &mut Formatter<'_, P>) {
        f.serializer.placeholder(self.0, f.dst);
    }
}

impl super::Serializer {
    pub(super) fn placeholder(&self, position: usize, dst: &mut String) {
        use quarry_core::driver::Dialect;
        use std::fmt::Write;

        let _ = match self.dialect() {
            Dialect::Mysql => write!(dst, "?"),
            Dialect::Postgresql => write!(dst, "${position}"),
            Dialect::Sqlite => write!(dst, "?{position}"),
        };
    }
}
