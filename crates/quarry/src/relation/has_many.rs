use crate::{Model, Record};

use quarry_core::Result;

use std::fmt;

/// The many side of a reverse foreign key or many-to-many relation.
pub struct HasMany<T> {
    values: Option<Vec<T>>,
}

impl<T: Model> HasMany<T> {
    pub fn load(&mut self, rows: Vec<Record>) -> Result<()> {
        let values = rows.into_iter().map(T::load).collect::<Result<_>>()?;
        self.values = Some(values);
        Ok(())
    }

    /// Loaded rows, `None` until the relation is loaded.
    pub fn get(&self) -> Option<&[T]> {
        self.values.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.values.is_some()
    }
}

impl<T> Default for HasMany<T> {
    fn default() -> Self {
        Self { values: None }
    }
}

impl<T: fmt::Debug> fmt::Debug for HasMany<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values.as_ref() {
            Some(values) => fmt.debug_list().entries(values).finish(),
            None => write!(fmt, "<not loaded>"),
        }
    }
}
