use std::collections::HashMap;

use super::Store;
use crate::error::ImportResult;

/// Per-stage name -> row id cache for one table.
///
/// Misses are remembered too; a cache must not outlive the stage that
/// created it, since later stages add rows.
pub struct NameCache {
    table: &'static str,
    ids: HashMap<String, Option<i64>>,
}

impl NameCache {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            ids: HashMap::new(),
        }
    }

    pub fn id(&mut self, store: &Store, name: &str) -> ImportResult<Option<i64>> {
        if let Some(id) = self.ids.get(name) {
            return Ok(*id);
        }
        let id = store.find_id_by_name(self.table, name)?;
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
