use serde_json::Value;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::TYPES;
use crate::source::payload::{decode, TypeDetail};
use crate::store::{RowValues, Store};

pub struct TypeUpserter;

impl EntityUpserter for TypeUpserter {
    fn stage(&self) -> Stage {
        Stage::Type
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: TypeDetail = decode(detail, "type")?;
        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str());
        store.upsert(&TYPES, &row)?;
        Ok(detail.name)
    }
}
