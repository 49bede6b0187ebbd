use serde_json::Value;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::ITEMS;
use crate::source::first_english;
use crate::source::payload::{decode, name_of, ItemDetail};
use crate::store::{RowValues, Store};

pub struct ItemUpserter;

impl EntityUpserter for ItemUpserter {
    fn stage(&self) -> Stage {
        Stage::Item
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: ItemDetail = decode(detail, "item")?;
        let effect = first_english(&detail.effect_entries);
        let flavor = first_english(&detail.flavor_text_entries);
        let sprite = detail.sprites.as_ref().and_then(|s| s.default.as_deref());

        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str())
            .with("cost", detail.cost)
            .with("fling_power", detail.fling_power)
            .with("fling_effect", name_of(&detail.fling_effect))
            .with("category", name_of(&detail.category))
            .with("effect", effect.and_then(|e| e.effect.as_deref()))
            .with("short_effect", effect.and_then(|e| e.short_effect.as_deref()))
            .with("flavor_text", flavor.and_then(|f| f.body()))
            .with("sprite", sprite);

        store.upsert(&ITEMS, &row)?;
        Ok(detail.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_fields() {
        let store = Store::open_in_memory().unwrap();
        ItemUpserter
            .upsert(
                &store,
                json!({
                    "id": 1,
                    "name": "master-ball",
                    "cost": 0,
                    "fling_power": null,
                    "category": {"name": "standard-balls", "url": ""},
                    "sprites": {"default": "https://example.test/master-ball.png"},
                    "flavor_text_entries": [
                        {"text": "Une Ball", "language": {"name": "fr", "url": ""}},
                        {"text": "The best Ball.", "language": {"name": "en", "url": ""}}
                    ]
                }),
            )
            .unwrap();

        let (category, flavor, sprite, fling): (String, String, String, Option<i64>) = store
            .connection()
            .query_row(
                "SELECT category, flavor_text, sprite, fling_power FROM items WHERE api_id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(category, "standard-balls");
        assert_eq!(flavor, "The best Ball.");
        assert_eq!(sprite, "https://example.test/master-ball.png");
        assert_eq!(fling, None);
    }
}
