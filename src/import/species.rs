use serde_json::Value;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::POKEMON_SPECIES;
use crate::source::payload::{decode, name_of, SpeciesDetail};
use crate::store::{RowValues, Store};

/// Species rows. `evolution_chain_id` is left alone here; the
/// evolution chain stage links it.
pub struct SpeciesUpserter;

impl EntityUpserter for SpeciesUpserter {
    fn stage(&self) -> Stage {
        Stage::Species
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: SpeciesDetail = decode(detail, "species")?;

        let row = RowValues::new()
            .with("api_id", detail.id)
            .with("name", detail.name.as_str())
            .with("base_happiness", detail.base_happiness)
            .with("capture_rate", detail.capture_rate)
            .with("color", name_of(&detail.color))
            .with("gender_rate", detail.gender_rate)
            .with("hatch_counter", detail.hatch_counter)
            .with("is_baby", detail.is_baby.unwrap_or(false))
            .with("is_legendary", detail.is_legendary.unwrap_or(false))
            .with("is_mythical", detail.is_mythical.unwrap_or(false))
            .with("habitat", name_of(&detail.habitat))
            .with("shape", name_of(&detail.shape))
            .with("generation", name_of(&detail.generation));

        store.upsert(&POKEMON_SPECIES, &row)?;
        Ok(detail.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::EVOLUTION_CHAINS;
    use serde_json::json;

    #[test]
    fn test_flags_default_and_link_survives_reimport() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .upsert(
                &POKEMON_SPECIES,
                &RowValues::new().with("api_id", 150_i64).with("name", "mewtwo"),
            )
            .unwrap();
        let chain = store
            .upsert(&EVOLUTION_CHAINS, &RowValues::new().with("api_id", 77_i64))
            .unwrap();
        store
            .set_column(&POKEMON_SPECIES, id, "evolution_chain_id", chain)
            .unwrap();

        SpeciesUpserter
            .upsert(
                &store,
                json!({"id": 150, "name": "mewtwo", "is_legendary": true, "habitat": {"name": "rare", "url": ""}}),
            )
            .unwrap();

        let (legendary, baby, habitat, linked): (bool, bool, String, Option<i64>) = store
            .connection()
            .query_row(
                "SELECT is_legendary, is_baby, habitat, evolution_chain_id FROM pokemon_species WHERE api_id = 150",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert!(legendary);
        assert!(!baby);
        assert_eq!(habitat, "rare");
        assert_eq!(linked, Some(chain));
    }
}
