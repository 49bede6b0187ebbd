use serde_json::Value;
use std::collections::HashSet;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::{
    ABILITY_POKEMON, MOVE_POKEMON, POKEMON, POKEMON_GAME_INDICES, POKEMON_ITEM, POKEMON_STATS,
    POKEMON_TYPE,
};
use crate::source::payload::{decode, name_of, PokemonDetail};
use crate::store::{NameCache, RowValues, Store};

/// Pokemon rows with their stats, pivots and game indices.
///
/// Related rows are found by name. A name that is not in the database
/// yet drops that one association instead of failing the Pokemon.
pub struct PokemonUpserter {
    species: NameCache,
    types: NameCache,
    abilities: NameCache,
    moves: NameCache,
    items: NameCache,
}

impl PokemonUpserter {
    pub fn new() -> Self {
        Self {
            species: NameCache::new("pokemon_species"),
            types: NameCache::new("types"),
            abilities: NameCache::new("abilities"),
            moves: NameCache::new("moves"),
            items: NameCache::new("items"),
        }
    }

    fn write(&mut self, store: &Store, detail: &PokemonDetail) -> ImportResult<()> {
        let species_id = match name_of(&detail.species) {
            Some(name) => self.species.id(store, name)?,
            None => None,
        };
        let sprites = detail.sprites.clone().unwrap_or_default();
        let cries = detail.cries.clone().unwrap_or_default();

        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str())
            .with("height", detail.height)
            .with("weight", detail.weight)
            .with("base_experience", detail.base_experience)
            .with("is_default", detail.is_default.unwrap_or(true))
            .with("species_id", species_id)
            .with("sprite_front_default", sprites.front_default)
            .with("sprite_front_shiny", sprites.front_shiny)
            .with("sprite_back_default", sprites.back_default)
            .with("sprite_back_shiny", sprites.back_shiny)
            .with("cry_latest", cries.latest)
            .with("cry_legacy", cries.legacy);
        let pokemon_id = store.upsert(&POKEMON, &row)?;

        for stat in &detail.stats {
            let row = RowValues::new()
                .with("pokemon_id", pokemon_id)
                .with("stat_name", stat.stat.name.as_str())
                .with("base_stat", stat.base_stat)
                .with("effort", stat.effort);
            store.upsert(&POKEMON_STATS, &row)?;
        }

        let mut types = Vec::with_capacity(detail.types.len());
        for entry in &detail.types {
            if let Some(type_id) = self.types.id(store, &entry.type_ref.name)? {
                types.push(
                    RowValues::new()
                        .with("pokemon_id", pokemon_id)
                        .with("type_id", type_id)
                        .with("slot", entry.slot),
                );
            }
        }
        store.sync_pivot(&POKEMON_TYPE, "pokemon_id", pokemon_id, &types)?;

        let mut abilities = Vec::with_capacity(detail.abilities.len());
        for entry in &detail.abilities {
            let Some(name) = name_of(&entry.ability) else {
                continue;
            };
            if let Some(ability_id) = self.abilities.id(store, name)? {
                abilities.push(
                    RowValues::new()
                        .with("pokemon_id", pokemon_id)
                        .with("ability_id", ability_id)
                        .with("is_hidden", entry.is_hidden)
                        .with("slot", entry.slot),
                );
            }
        }
        store.sync_pivot(&ABILITY_POKEMON, "pokemon_id", pokemon_id, &abilities)?;

        // First version group wins; a move listed twice keeps its first entry
        let mut seen = HashSet::new();
        let mut moves = Vec::with_capacity(detail.moves.len());
        for entry in &detail.moves {
            let Some(move_id) = self.moves.id(store, &entry.move_ref.name)? else {
                continue;
            };
            if !seen.insert(move_id) {
                continue;
            }
            let first = entry.version_group_details.first();
            moves.push(
                RowValues::new()
                    .with("pokemon_id", pokemon_id)
                    .with("move_id", move_id)
                    .with(
                        "learn_method",
                        first.and_then(|f| name_of(&f.move_learn_method)),
                    )
                    .with("level_learned_at", first.and_then(|f| f.level_learned_at)),
            );
        }
        store.sync_pivot(&MOVE_POKEMON, "pokemon_id", pokemon_id, &moves)?;

        let mut items = Vec::with_capacity(detail.held_items.len());
        for entry in &detail.held_items {
            let Some(first) = entry.version_details.first() else {
                continue;
            };
            if let Some(item_id) = self.items.id(store, &entry.item.name)? {
                items.push(
                    RowValues::new()
                        .with("pokemon_id", pokemon_id)
                        .with("item_id", item_id)
                        .with("rarity", first.rarity)
                        .with("version", name_of(&first.version)),
                );
            }
        }
        store.sync_pivot(&POKEMON_ITEM, "pokemon_id", pokemon_id, &items)?;

        store.delete_where(&POKEMON_GAME_INDICES, "pokemon_id", pokemon_id)?;
        for index in &detail.game_indices {
            let row = RowValues::new()
                .with("pokemon_id", pokemon_id)
                .with("game_index", index.game_index)
                .with("version", index.version.name.as_str());
            store.insert(&POKEMON_GAME_INDICES, &row)?;
        }

        Ok(())
    }
}

impl Default for PokemonUpserter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityUpserter for PokemonUpserter {
    fn stage(&self) -> Stage {
        Stage::Pokemon
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: PokemonDetail = decode(detail, "pokemon")?;
        store.transaction(|store| self.write(store, &detail))?;
        Ok(detail.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ABILITIES, ITEMS, MOVES, POKEMON_SPECIES, TYPES};
    use serde_json::json;

    fn named(store: &Store, schema: &crate::schema::TableSchema, api_id: i64, name: &str) -> i64 {
        store
            .upsert(schema, &RowValues::new().with("api_id", api_id).with("name", name))
            .unwrap()
    }

    fn bulbasaur(moves: Value) -> Value {
        json!({
            "id": 1,
            "name": "bulbasaur",
            "height": 7,
            "weight": 69,
            "base_experience": 64,
            "is_default": true,
            "species": {"name": "bulbasaur", "url": ""},
            "sprites": {"front_default": "https://example.test/1.png"},
            "cries": {"latest": "https://example.test/1.ogg"},
            "stats": [
                {"base_stat": 45, "effort": 0, "stat": {"name": "hp", "url": ""}},
                {"base_stat": 49, "effort": 0, "stat": {"name": "attack", "url": ""}}
            ],
            "types": [
                {"slot": 1, "type": {"name": "grass", "url": ""}},
                {"slot": 2, "type": {"name": "poison", "url": ""}}
            ],
            "abilities": [
                {"is_hidden": false, "slot": 1, "ability": {"name": "overgrow", "url": ""}},
                {"is_hidden": true, "slot": 3, "ability": {"name": "chlorophyll", "url": ""}}
            ],
            "moves": moves,
            "held_items": [
                {"item": {"name": "oran-berry", "url": ""}, "version_details": [
                    {"rarity": 5, "version": {"name": "emerald", "url": ""}},
                    {"rarity": 50, "version": {"name": "ruby", "url": ""}}
                ]}
            ],
            "game_indices": [
                {"game_index": 153, "version": {"name": "red", "url": ""}},
                {"game_index": 1, "version": {"name": "gold", "url": ""}}
            ]
        })
    }

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        named(&store, &TYPES, 12, "grass");
        named(&store, &TYPES, 4, "poison");
        named(&store, &ABILITIES, 65, "overgrow");
        named(&store, &ABILITIES, 34, "chlorophyll");
        named(&store, &MOVES, 33, "tackle");
        named(&store, &ITEMS, 132, "oran-berry");
        named(&store, &POKEMON_SPECIES, 1, "bulbasaur");
        store
    }

    #[test]
    fn test_full_record() {
        let store = seeded();
        let moves = json!([{"move": {"name": "tackle", "url": ""}, "version_group_details": [
            {"move_learn_method": {"name": "level-up", "url": ""}, "level_learned_at": 1}
        ]}]);
        PokemonUpserter::new().upsert(&store, bulbasaur(moves)).unwrap();

        assert_eq!(store.count("pokemon").unwrap(), 1);
        assert_eq!(store.count("pokemon_stats").unwrap(), 2);
        assert_eq!(store.count("pokemon_type").unwrap(), 2);
        assert_eq!(store.count("ability_pokemon").unwrap(), 2);
        assert_eq!(store.count("move_pokemon").unwrap(), 1);
        assert_eq!(store.count("pokemon_game_indices").unwrap(), 2);

        let (rarity, version): (i64, String) = store
            .connection()
            .query_row("SELECT rarity, version FROM pokemon_item", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!((rarity, version.as_str()), (5, "emerald"));

        let hidden: i64 = store
            .connection()
            .query_row(
                "SELECT slot FROM ability_pokemon WHERE is_hidden = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hidden, 3);
    }

    #[test]
    fn test_move_keeps_first_version_group() {
        let store = seeded();
        let moves = json!([
            {"move": {"name": "tackle", "url": ""}, "version_group_details": [
                {"move_learn_method": {"name": "level-up", "url": ""}, "level_learned_at": 1},
                {"move_learn_method": {"name": "machine", "url": ""}, "level_learned_at": 0}
            ]},
            {"move": {"name": "tackle", "url": ""}, "version_group_details": [
                {"move_learn_method": {"name": "tutor", "url": ""}, "level_learned_at": 9}
            ]}
        ]);
        PokemonUpserter::new().upsert(&store, bulbasaur(moves)).unwrap();

        let (method, level): (String, i64) = store
            .connection()
            .query_row(
                "SELECT learn_method, level_learned_at FROM move_pokemon",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(method, "level-up");
        assert_eq!(level, 1);
    }

    #[test]
    fn test_move_without_version_groups_is_kept() {
        let store = seeded();
        let moves = json!([
            {"move": {"name": "tackle", "url": ""}, "version_group_details": []},
            {"move": {"name": "tackle", "url": ""}, "version_group_details": [
                {"move_learn_method": {"name": "tutor", "url": ""}, "level_learned_at": 9}
            ]}
        ]);
        PokemonUpserter::new().upsert(&store, bulbasaur(moves)).unwrap();

        assert_eq!(store.count("move_pokemon").unwrap(), 1);
        let (method, level): (Option<String>, Option<i64>) = store
            .connection()
            .query_row(
                "SELECT learn_method, level_learned_at FROM move_pokemon",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(method, None);
        assert_eq!(level, None);
    }

    #[test]
    fn test_reimport_replaces_associations() {
        let store = seeded();
        PokemonUpserter::new()
            .upsert(&store, bulbasaur(json!([])))
            .unwrap();

        let mut slimmer = bulbasaur(json!([]));
        slimmer["types"] = json!([{"slot": 1, "type": {"name": "grass", "url": ""}}]);
        slimmer["game_indices"] = json!([{"game_index": 153, "version": {"name": "red", "url": ""}}]);
        PokemonUpserter::new().upsert(&store, slimmer).unwrap();

        assert_eq!(store.count("pokemon").unwrap(), 1);
        assert_eq!(store.count("pokemon_type").unwrap(), 1);
        assert_eq!(store.count("pokemon_game_indices").unwrap(), 1);
        assert_eq!(store.count("pokemon_stats").unwrap(), 2);
    }

    #[test]
    fn test_unknown_references_are_dropped() {
        let store = Store::open_in_memory().unwrap();
        let moves = json!([{"move": {"name": "tackle", "url": ""}, "version_group_details": [
            {"move_learn_method": {"name": "level-up", "url": ""}, "level_learned_at": 1}
        ]}]);
        PokemonUpserter::new().upsert(&store, bulbasaur(moves)).unwrap();

        let species: Option<i64> = store
            .connection()
            .query_row("SELECT species_id FROM pokemon", [], |r| r.get(0))
            .unwrap();
        assert_eq!(species, None);
        for pivot in ["pokemon_type", "ability_pokemon", "move_pokemon", "pokemon_item"] {
            assert_eq!(store.count(pivot).unwrap(), 0, "{}", pivot);
        }
        assert_eq!(store.count("pokemon_stats").unwrap(), 2);
    }
}
