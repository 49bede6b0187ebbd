use serde_json::Value;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::MOVES;
use crate::source::first_english;
use crate::source::payload::{decode, name_of, MoveDetail};
use crate::store::{NameCache, RowValues, Store};

pub struct MoveUpserter {
    types: NameCache,
}

impl MoveUpserter {
    pub fn new() -> Self {
        Self {
            types: NameCache::new("types"),
        }
    }
}

impl Default for MoveUpserter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityUpserter for MoveUpserter {
    fn stage(&self) -> Stage {
        Stage::Move
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: MoveDetail = decode(detail, "move")?;

        let type_id = match name_of(&detail.move_type) {
            Some(name) => self.types.id(store, name)?,
            None => None,
        };
        let effect = first_english(&detail.effect_entries);
        let flavor = first_english(&detail.flavor_text_entries);
        let meta = detail.meta.clone().unwrap_or_default();

        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str())
            .with("power", detail.power)
            .with("pp", detail.pp)
            .with("accuracy", detail.accuracy)
            .with("priority", detail.priority)
            .with("type_id", type_id)
            .with("damage_class", name_of(&detail.damage_class))
            .with("effect_chance", detail.effect_chance)
            .with("contest_type", name_of(&detail.contest_type))
            .with("generation", name_of(&detail.generation))
            .with("effect", effect.and_then(|e| e.effect.as_deref()))
            .with("short_effect", effect.and_then(|e| e.short_effect.as_deref()))
            .with("flavor_text", flavor.and_then(|f| f.flavor_text.as_deref()))
            .with("target", name_of(&detail.target))
            .with("ailment", name_of(&meta.ailment))
            .with("meta_category", name_of(&meta.category))
            .with("min_hits", meta.min_hits)
            .with("max_hits", meta.max_hits)
            .with("min_turns", meta.min_turns)
            .with("max_turns", meta.max_turns)
            .with("drain", meta.drain)
            .with("healing", meta.healing)
            .with("crit_rate", meta.crit_rate)
            .with("ailment_chance", meta.ailment_chance)
            .with("flinch_chance", meta.flinch_chance)
            .with("stat_chance", meta.stat_chance);

        store.upsert(&MOVES, &row)?;
        Ok(detail.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::TYPES;
    use serde_json::json;

    fn thunderbolt() -> Value {
        json!({
            "id": 85,
            "name": "thunderbolt",
            "power": 90,
            "pp": 15,
            "accuracy": 100,
            "priority": 0,
            "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"},
            "damage_class": {"name": "special", "url": ""},
            "effect_chance": 10,
            "meta": {"ailment": {"name": "paralysis", "url": ""}, "ailment_chance": 10, "crit_rate": 0},
            "flavor_text_entries": [
                {"flavor_text": "A strong electric blast.", "language": {"name": "en", "url": ""}}
            ]
        })
    }

    #[test]
    fn test_links_type_by_name() {
        let store = Store::open_in_memory().unwrap();
        let electric = store
            .upsert(&TYPES, &RowValues::new().with("api_id", 13_i64).with("name", "electric"))
            .unwrap();

        MoveUpserter::new().upsert(&store, thunderbolt()).unwrap();

        let (type_id, ailment, flavor, hits): (Option<i64>, Option<String>, Option<String>, Option<i64>) = store
            .connection()
            .query_row(
                "SELECT type_id, ailment, flavor_text, min_hits FROM moves WHERE api_id = 85",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(type_id, Some(electric));
        assert_eq!(ailment.as_deref(), Some("paralysis"));
        assert_eq!(flavor.as_deref(), Some("A strong electric blast."));
        assert_eq!(hits, None);
    }

    #[test]
    fn test_unknown_type_leaves_null() {
        let store = Store::open_in_memory().unwrap();
        MoveUpserter::new().upsert(&store, thunderbolt()).unwrap();

        let type_id: Option<i64> = store
            .connection()
            .query_row("SELECT type_id FROM moves WHERE api_id = 85", [], |r| r.get(0))
            .unwrap();
        assert_eq!(type_id, None);
    }
}
