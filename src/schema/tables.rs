//! Table schema definitions for the Pokemon reference database

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static TYPES: TableSchema = TableSchema {
    name: "types",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["api_id"]), Index::on(&["name"])],
    timestamps: true,
};

pub static ABILITIES: TableSchema = TableSchema {
    name: "abilities",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("effect", ColumnType::Text),
        Column::new("short_effect", ColumnType::Text),
        Column::flag("is_main_series", true),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["api_id"]), Index::on(&["name"])],
    timestamps: true,
};

pub static ITEMS: TableSchema = TableSchema {
    name: "items",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("cost", ColumnType::Integer),
        Column::new("fling_power", ColumnType::Integer),
        Column::new("fling_effect", ColumnType::Text),
        Column::new("category", ColumnType::Text),
        Column::new("effect", ColumnType::Text),
        Column::new("short_effect", ColumnType::Text),
        Column::new("flavor_text", ColumnType::Text),
        Column::new("sprite", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[
        Index::unique(&["api_id"]),
        Index::on(&["name"]),
        Index::on(&["category"]),
    ],
    timestamps: true,
};

pub static EVOLUTION_CHAINS: TableSchema = TableSchema {
    name: "evolution_chains",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::new("baby_trigger_item", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["api_id"])],
    timestamps: true,
};

/// Operational metadata, one row per import attempt
pub static IMPORT_PROGRESS: TableSchema = TableSchema {
    name: "import_progress",
    columns: &[
        Column::required("import_id", ColumnType::Text),
        Column::required("status", ColumnType::Text).default("'running'"),
        Column::new("current_step", ColumnType::Text),
        Column::required("current_step_index", ColumnType::Integer).default("0"),
        Column::required("total_steps", ColumnType::Integer).default("7"),
        Column::required("current_step_processed", ColumnType::Integer).default("0"),
        Column::new("current_step_total", ColumnType::Integer),
        Column::new("step_details", ColumnType::Json),
        Column::new("last_detail_message", ColumnType::Text),
        Column::new("error_message", ColumnType::Text),
        Column::new("started_at", ColumnType::Timestamp),
        Column::new("completed_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["import_id"]), Index::on(&["status"])],
    timestamps: true,
};

// =============================================================================
// Tables with FK dependencies
// =============================================================================

pub static MOVES: TableSchema = TableSchema {
    name: "moves",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("power", ColumnType::Integer),
        Column::new("pp", ColumnType::Integer),
        Column::new("accuracy", ColumnType::Integer),
        Column::new("priority", ColumnType::Integer),
        Column::new("type_id", ColumnType::Integer),
        Column::new("damage_class", ColumnType::Text),
        Column::new("effect_chance", ColumnType::Integer),
        Column::new("contest_type", ColumnType::Text),
        Column::new("generation", ColumnType::Text),
        Column::new("effect", ColumnType::Text),
        Column::new("short_effect", ColumnType::Text),
        Column::new("flavor_text", ColumnType::Text),
        Column::new("target", ColumnType::Text),
        Column::new("ailment", ColumnType::Text),
        Column::new("meta_category", ColumnType::Text),
        Column::new("min_hits", ColumnType::Integer),
        Column::new("max_hits", ColumnType::Integer),
        Column::new("min_turns", ColumnType::Integer),
        Column::new("max_turns", ColumnType::Integer),
        Column::new("drain", ColumnType::Integer),
        Column::new("healing", ColumnType::Integer),
        Column::new("crit_rate", ColumnType::Integer),
        Column::new("ailment_chance", ColumnType::Integer),
        Column::new("flinch_chance", ColumnType::Integer),
        Column::new("stat_chance", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::set_null("type_id", "types")],
    indexes: &[
        Index::unique(&["api_id"]),
        Index::on(&["name"]),
        Index::on(&["damage_class"]),
        Index::on(&["generation"]),
    ],
    timestamps: true,
};

pub static POKEMON_SPECIES: TableSchema = TableSchema {
    name: "pokemon_species",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("base_happiness", ColumnType::Integer),
        Column::new("capture_rate", ColumnType::Integer),
        Column::new("color", ColumnType::Text),
        Column::new("gender_rate", ColumnType::Integer),
        Column::new("hatch_counter", ColumnType::Integer),
        Column::flag("is_baby", false),
        Column::flag("is_legendary", false),
        Column::flag("is_mythical", false),
        Column::new("habitat", ColumnType::Text),
        Column::new("shape", ColumnType::Text),
        Column::new("generation", ColumnType::Text),
        Column::new("evolution_chain_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::set_null("evolution_chain_id", "evolution_chains")],
    indexes: &[
        Index::unique(&["api_id"]),
        Index::on(&["name"]),
        Index::on(&["is_legendary"]),
        Index::on(&["is_mythical"]),
    ],
    timestamps: true,
};

pub static EVOLUTIONS: TableSchema = TableSchema {
    name: "evolutions",
    columns: &[
        Column::required("evolution_chain_id", ColumnType::Integer),
        Column::required("species_id", ColumnType::Integer),
        Column::new("evolves_to_species_id", ColumnType::Integer),
        Column::new("trigger", ColumnType::Text),
        Column::new("min_level", ColumnType::Integer),
        Column::new("item", ColumnType::Text),
        Column::new("held_item", ColumnType::Text),
        Column::new("gender", ColumnType::Integer),
        Column::new("min_happiness", ColumnType::Integer),
        Column::new("min_beauty", ColumnType::Integer),
        Column::new("min_affection", ColumnType::Integer),
        Column::new("location", ColumnType::Text),
        Column::new("time_of_day", ColumnType::Text),
        Column::new("known_move", ColumnType::Text),
        Column::new("known_move_type", ColumnType::Text),
        Column::new("party_species", ColumnType::Text),
        Column::new("party_type", ColumnType::Text),
        Column::new("relative_physical_stats", ColumnType::Integer),
        Column::flag("needs_overworld_rain", false),
        Column::new("trade_species", ColumnType::Text),
        Column::flag("turn_upside_down", false),
    ],
    foreign_keys: &[
        ForeignKey::cascade("evolution_chain_id", "evolution_chains"),
        ForeignKey::cascade("species_id", "pokemon_species"),
        ForeignKey::cascade("evolves_to_species_id", "pokemon_species"),
    ],
    indexes: &[
        Index::unique(&["evolution_chain_id", "species_id", "evolves_to_species_id"]),
        Index::on(&["species_id", "evolves_to_species_id"]),
    ],
    timestamps: true,
};

pub static POKEMON: TableSchema = TableSchema {
    name: "pokemon",
    columns: &[
        Column::required("api_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("height", ColumnType::Integer),
        Column::new("weight", ColumnType::Integer),
        Column::new("base_experience", ColumnType::Integer),
        Column::flag("is_default", true),
        Column::new("species_id", ColumnType::Integer),
        Column::new("sprite_front_default", ColumnType::Text),
        Column::new("sprite_front_shiny", ColumnType::Text),
        Column::new("sprite_back_default", ColumnType::Text),
        Column::new("sprite_back_shiny", ColumnType::Text),
        Column::new("cry_latest", ColumnType::Text),
        Column::new("cry_legacy", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::set_null("species_id", "pokemon_species")],
    indexes: &[Index::unique(&["api_id"]), Index::on(&["name"])],
    timestamps: true,
};

// =============================================================================
// Per-Pokemon child and pivot tables
// =============================================================================

pub static POKEMON_STATS: TableSchema = TableSchema {
    name: "pokemon_stats",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("stat_name", ColumnType::Text),
        Column::required("base_stat", ColumnType::Integer),
        Column::required("effort", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::cascade("pokemon_id", "pokemon")],
    indexes: &[
        Index::unique(&["pokemon_id", "stat_name"]),
        Index::on(&["pokemon_id", "stat_name", "base_stat"]),
    ],
    timestamps: true,
};

pub static POKEMON_TYPE: TableSchema = TableSchema {
    name: "pokemon_type",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("type_id", ColumnType::Integer),
        Column::required("slot", ColumnType::Integer).default("1"),
    ],
    foreign_keys: &[
        ForeignKey::cascade("pokemon_id", "pokemon"),
        ForeignKey::cascade("type_id", "types"),
    ],
    indexes: &[Index::unique(&["pokemon_id", "type_id"])],
    timestamps: true,
};

pub static ABILITY_POKEMON: TableSchema = TableSchema {
    name: "ability_pokemon",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("ability_id", ColumnType::Integer),
        Column::flag("is_hidden", false),
        Column::required("slot", ColumnType::Integer).default("1"),
    ],
    foreign_keys: &[
        ForeignKey::cascade("pokemon_id", "pokemon"),
        ForeignKey::cascade("ability_id", "abilities"),
    ],
    indexes: &[
        Index::unique(&["pokemon_id", "ability_id"]),
        Index::on(&["ability_id"]),
    ],
    timestamps: true,
};

pub static MOVE_POKEMON: TableSchema = TableSchema {
    name: "move_pokemon",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("move_id", ColumnType::Integer),
        Column::new("learn_method", ColumnType::Text),
        Column::new("level_learned_at", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::cascade("pokemon_id", "pokemon"),
        ForeignKey::cascade("move_id", "moves"),
    ],
    indexes: &[
        Index::unique(&["pokemon_id", "move_id"]),
        Index::on(&["move_id"]),
    ],
    timestamps: true,
};

pub static POKEMON_ITEM: TableSchema = TableSchema {
    name: "pokemon_item",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("item_id", ColumnType::Integer),
        Column::new("rarity", ColumnType::Integer),
        Column::new("version", ColumnType::Text),
    ],
    foreign_keys: &[
        ForeignKey::cascade("pokemon_id", "pokemon"),
        ForeignKey::cascade("item_id", "items"),
    ],
    indexes: &[Index::unique(&["pokemon_id", "item_id"])],
    timestamps: true,
};

pub static POKEMON_GAME_INDICES: TableSchema = TableSchema {
    name: "pokemon_game_indices",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("game_index", ColumnType::Integer),
        Column::required("version", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::cascade("pokemon_id", "pokemon")],
    indexes: &[Index::on(&["pokemon_id", "version"])],
    timestamps: true,
};

// =============================================================================
// All Tables
// =============================================================================

/// All tables. Creation order comes from `DependencyResolver::all_tables_ordered`,
/// which keeps this order wherever the foreign keys allow it.
pub static ALL_TABLES: &[&TableSchema] = &[
    &TYPES,
    &ABILITIES,
    &ITEMS,
    &EVOLUTION_CHAINS,
    &IMPORT_PROGRESS,
    &MOVES,
    &POKEMON_SPECIES,
    &EVOLUTIONS,
    &POKEMON,
    &POKEMON_STATS,
    &POKEMON_TYPE,
    &ABILITY_POKEMON,
    &MOVE_POKEMON,
    &POKEMON_ITEM,
    &POKEMON_GAME_INDICES,
];

/// Get a table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}
