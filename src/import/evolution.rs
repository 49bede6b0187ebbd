use serde_json::Value;
use tracing::debug;

use super::{EntityUpserter, Stage};
use crate::error::ImportResult;
use crate::schema::tables::{EVOLUTIONS, EVOLUTION_CHAINS, POKEMON_SPECIES};
use crate::source::payload::{decode, name_of, ChainLink, EvolutionChainDetail, EvolutionDetail};
use crate::store::{NameCache, RowValues, Store};

/// Evolution chain rows plus the edges of their species tree
pub struct EvolutionChainUpserter {
    species: NameCache,
}

impl EvolutionChainUpserter {
    pub fn new() -> Self {
        Self {
            species: NameCache::new("pokemon_species"),
        }
    }
}

impl Default for EvolutionChainUpserter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityUpserter for EvolutionChainUpserter {
    fn stage(&self) -> Stage {
        Stage::EvolutionChain
    }

    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String> {
        let detail: EvolutionChainDetail = decode(detail, "evolution chain")?;
        let species = &mut self.species;

        store.transaction(|store| {
            let row = RowValues::new()
                .with("api_id", detail.id)
                .with("baby_trigger_item", name_of(&detail.baby_trigger_item));
            let chain_id = store.upsert(&EVOLUTION_CHAINS, &row)?;

            EvolutionChainResolver::new(store, species).resolve(chain_id, &detail.chain, None)
        })?;

        Ok(format!("#{} ({})", detail.id, detail.chain.species.name))
    }
}

/// Depth-first walk of one evolution tree.
///
/// Species that were never imported are skipped together with their
/// whole subtree.
pub struct EvolutionChainResolver<'a> {
    store: &'a Store,
    species: &'a mut NameCache,
}

impl<'a> EvolutionChainResolver<'a> {
    pub fn new(store: &'a Store, species: &'a mut NameCache) -> Self {
        Self { store, species }
    }

    pub fn resolve(
        &mut self,
        chain_id: i64,
        node: &ChainLink,
        parent_species_id: Option<i64>,
    ) -> ImportResult<()> {
        let Some(species_id) = self.species.id(self.store, &node.species.name)? else {
            debug!(species = %node.species.name, "species not imported, skipping subtree");
            return Ok(());
        };

        self.store
            .set_column(&POKEMON_SPECIES, species_id, "evolution_chain_id", chain_id)?;

        if let (Some(parent), Some(first)) = (parent_species_id, node.evolution_details.first()) {
            let row = edge_row(chain_id, parent, species_id, first);
            self.store.upsert(&EVOLUTIONS, &row)?;
        }

        for child in &node.evolves_to {
            self.resolve(chain_id, child, Some(species_id))?;
        }
        Ok(())
    }
}

fn edge_row(chain_id: i64, from: i64, to: i64, detail: &EvolutionDetail) -> RowValues {
    let time_of_day = detail.time_of_day.as_deref().filter(|t| !t.is_empty());

    RowValues::new()
        .with("evolution_chain_id", chain_id)
        .with("species_id", from)
        .with("evolves_to_species_id", to)
        .with("trigger", name_of(&detail.trigger))
        .with("min_level", detail.min_level)
        .with("item", name_of(&detail.item))
        .with("held_item", name_of(&detail.held_item))
        .with("gender", detail.gender)
        .with("min_happiness", detail.min_happiness)
        .with("min_beauty", detail.min_beauty)
        .with("min_affection", detail.min_affection)
        .with("location", name_of(&detail.location))
        .with("time_of_day", time_of_day)
        .with("known_move", name_of(&detail.known_move))
        .with("known_move_type", name_of(&detail.known_move_type))
        .with("party_species", name_of(&detail.party_species))
        .with("party_type", name_of(&detail.party_type))
        .with("relative_physical_stats", detail.relative_physical_stats)
        .with("needs_overworld_rain", detail.needs_overworld_rain.unwrap_or(false))
        .with("trade_species", name_of(&detail.trade_species))
        .with("turn_upside_down", detail.turn_upside_down.unwrap_or(false))
}
