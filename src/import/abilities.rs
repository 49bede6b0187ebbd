use serde_json::Value;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::ABILITIES;
use crate::source::first_english;
use crate::source::payload::{decode, AbilityDetail};
use crate::store::{RowValues, Store};

pub struct AbilityUpserter;

impl EntityUpserter for AbilityUpserter {
    fn stage(&self) -> Stage {
        Stage::Ability
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: AbilityDetail = decode(detail, "ability")?;
        let effect = first_english(&detail.effect_entries);

        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str())
            .with("effect", effect.and_then(|e| e.effect.as_deref()))
            .with("short_effect", effect.and_then(|e| e.short_effect.as_deref()))
            .with("is_main_series", detail.is_main_series.unwrap_or(true));
        store.upsert(&ABILITIES, &row)?;
        Ok(detail.name)
    }
}
