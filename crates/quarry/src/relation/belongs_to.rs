use crate::{Model, Record};

use quarry_core::{stmt::Value, Result};

use std::fmt;

/// The owning side of a foreign key or one-to-one relation.
///
/// Always holds the key stored in the column; the related model is present
/// once it was preloaded or loaded with `load_related`.
pub struct BelongsTo<T> {
    key: Value,
    value: Option<Box<T>>,
}

impl<T: Model> BelongsTo<T> {
    pub fn new(key: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Replaces the key, dropping a loaded model that no longer matches.
    pub fn set_key(&mut self, key: Value) {
        if key != self.key {
            self.value = None;
        }
        self.key = key;
    }

    /// Fills the relation from loaded rows. No rows leaves it unloaded.
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

    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for BelongsTo<T> {
    fn default() -> Self {
        Self {
            key: Value::Null,
            value: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_ref() {
            Some(t) => t.fmt(fmt),
            None => write!(fmt, "<not loaded; key={}>", self.key),
        }
    }
}
