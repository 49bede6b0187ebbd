//! Typed views of PokeAPI documents.
//!
//! Only the fields the importers read are declared. Anything optional in the
//! source is an `Option` (or a defaulted `Vec`) so a missing field becomes
//! NULL rather than a decode failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::text::Localized;
use crate::error::{ImportError, ImportResult};

/// Decode a raw detail document, reporting failures as `Format` errors
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> ImportResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ImportError::format(format!("invalid {} document: {}", what, e)))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Name of an optional nested resource
pub fn name_of(resource: &Option<NamedResource>) -> Option<&str> {
    resource.as_ref().map(|r| r.name.as_str())
}

/// One page of a list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcePage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EffectEntry {
    pub effect: Option<String>,
    pub short_effect: Option<String>,
    pub language: NamedResource,
}

impl Localized for EffectEntry {
    fn language(&self) -> &str {
        &self.language.name
    }
}

/// Moves use `flavor_text`, items use `text`
#[derive(Debug, Clone, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: Option<String>,
    pub text: Option<String>,
    pub language: NamedResource,
}

impl FlavorTextEntry {
    pub fn body(&self) -> Option<&str> {
        self.flavor_text.as_deref().or(self.text.as_deref())
    }
}

impl Localized for FlavorTextEntry {
    fn language(&self) -> &str {
        &self.language.name
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDetail {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilityDetail {
    pub id: i64,
    pub name: String,
    pub is_main_series: Option<bool>,
    #[serde(default)]
    pub effect_entries: Vec<EffectEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveMeta {
    pub ailment: Option<NamedResource>,
    pub category: Option<NamedResource>,
    pub min_hits: Option<i64>,
    pub max_hits: Option<i64>,
    pub min_turns: Option<i64>,
    pub max_turns: Option<i64>,
    pub drain: Option<i64>,
    pub healing: Option<i64>,
    pub crit_rate: Option<i64>,
    pub ailment_chance: Option<i64>,
    pub flinch_chance: Option<i64>,
    pub stat_chance: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveDetail {
    pub id: i64,
    pub name: String,
    pub power: Option<i64>,
    pub pp: Option<i64>,
    pub accuracy: Option<i64>,
    pub priority: Option<i64>,
    #[serde(rename = "type")]
    pub move_type: Option<NamedResource>,
    pub damage_class: Option<NamedResource>,
    pub effect_chance: Option<i64>,
    pub contest_type: Option<NamedResource>,
    pub generation: Option<NamedResource>,
    pub target: Option<NamedResource>,
    pub meta: Option<MoveMeta>,
    #[serde(default)]
    pub effect_entries: Vec<EffectEntry>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSprites {
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDetail {
    pub id: i64,
    pub name: String,
    pub cost: Option<i64>,
    pub fling_power: Option<i64>,
    pub fling_effect: Option<NamedResource>,
    pub category: Option<NamedResource>,
    pub sprites: Option<ItemSprites>,
    #[serde(default)]
    pub effect_entries: Vec<EffectEntry>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesDetail {
    pub id: i64,
    pub name: String,
    pub base_happiness: Option<i64>,
    pub capture_rate: Option<i64>,
    pub color: Option<NamedResource>,
    pub gender_rate: Option<i64>,
    pub hatch_counter: Option<i64>,
    pub is_baby: Option<bool>,
    pub is_legendary: Option<bool>,
    pub is_mythical: Option<bool>,
    pub habitat: Option<NamedResource>,
    pub shape: Option<NamedResource>,
    pub generation: Option<NamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvolutionChainDetail {
    pub id: i64,
    pub baby_trigger_item: Option<NamedResource>,
    pub chain: ChainLink,
}

/// One node of an evolution tree
#[derive(Debug, Clone, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    /// Alternative triggers from the parent node; only the first is stored
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvolutionDetail {
    pub trigger: Option<NamedResource>,
    pub min_level: Option<i64>,
    pub item: Option<NamedResource>,
    pub held_item: Option<NamedResource>,
    pub gender: Option<i64>,
    pub min_happiness: Option<i64>,
    pub min_beauty: Option<i64>,
    pub min_affection: Option<i64>,
    pub location: Option<NamedResource>,
    pub time_of_day: Option<String>,
    pub known_move: Option<NamedResource>,
    pub known_move_type: Option<NamedResource>,
    pub party_species: Option<NamedResource>,
    pub party_type: Option<NamedResource>,
    pub relative_physical_stats: Option<i64>,
    pub needs_overworld_rain: Option<bool>,
    pub trade_species: Option<NamedResource>,
    pub turn_upside_down: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonSprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonCries {
    pub latest: Option<String>,
    pub legacy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonStat {
    pub base_stat: i64,
    pub effort: i64,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonType {
    pub slot: i64,
    #[serde(rename = "type")]
    pub type_ref: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonAbility {
    #[serde(default)]
    pub is_hidden: bool,
    pub slot: i64,
    pub ability: Option<NamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionGroupDetail {
    pub move_learn_method: Option<NamedResource>,
    pub level_learned_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonMove {
    #[serde(rename = "move")]
    pub move_ref: NamedResource,
    #[serde(default)]
    pub version_group_details: Vec<VersionGroupDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeldItemVersion {
    pub rarity: Option<i64>,
    pub version: Option<NamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonHeldItem {
    pub item: NamedResource,
    #[serde(default)]
    pub version_details: Vec<HeldItemVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameIndex {
    pub game_index: i64,
    pub version: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonDetail {
    pub id: i64,
    pub name: String,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub base_experience: Option<i64>,
    pub is_default: Option<bool>,
    pub species: Option<NamedResource>,
    pub sprites: Option<PokemonSprites>,
    pub cries: Option<PokemonCries>,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
    #[serde(default)]
    pub moves: Vec<PokemonMove>,
    #[serde(default)]
    pub held_items: Vec<PokemonHeldItem>,
    #[serde(default)]
    pub game_indices: Vec<GameIndex>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_optional_fields_decode_as_none() {
        let detail: MoveDetail = decode(json!({"id": 1, "name": "pound"}), "move").unwrap();
        assert_eq!(detail.power, None);
        assert!(detail.meta.is_none());
        assert!(detail.effect_entries.is_empty());
    }

    #[test]
    fn test_nested_chain_decodes() {
        let chain: EvolutionChainDetail = decode(
            json!({
                "id": 1,
                "baby_trigger_item": null,
                "chain": {
                    "species": {"name": "bulbasaur", "url": ""},
                    "evolution_details": [],
                    "evolves_to": [{
                        "species": {"name": "ivysaur", "url": ""},
                        "evolution_details": [{"min_level": 16, "trigger": {"name": "level-up", "url": ""}}],
                        "evolves_to": []
                    }]
                }
            }),
            "evolution chain",
        )
        .unwrap();

        assert_eq!(chain.chain.evolves_to.len(), 1);
        assert_eq!(chain.chain.evolves_to[0].evolution_details[0].min_level, Some(16));
    }

    #[test]
    fn test_missing_required_field_is_format_error() {
        let err = decode::<TypeDetail>(json!({"name": "fire"}), "type").unwrap_err();
        assert!(matches!(err, ImportError::Format(_)));
    }
}
