use crate::{Model, Record};

use quarry_core::Result;

use std::fmt;

/// The reverse side of a one-to-one relation.
pub struct HasOne<T> {
    value: Option<Box<T>>,
}

impl<T: Model> HasOne<T> {
    pub fn load(&mut self, rows: Vec<Record>) -> Result<()> {
        self.value = match rows.into_iter().next() {
            Some(record) => Some(Box::new(T::load(record)?)),
            None => None,
        };
        Ok(())
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_deref()
    }
}

impl<T> Default for HasOne<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: fmt::Debug> fmt::Debug for HasOne<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_ref() {
            Some(t) => t.fmt(fmt),
            None => write!(fmt, "<not loaded>"),
        }
    }
}
