use std::fmt;
use std::str::FromStr;

use crate::error::ImportError;

/// The seven import stages, in the order they must run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Type,
    Ability,
    Move,
    Item,
    Species,
    EvolutionChain,
    Pokemon,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Type,
        Stage::Ability,
        Stage::Move,
        Stage::Item,
        Stage::Species,
        Stage::EvolutionChain,
        Stage::Pokemon,
    ];

    /// Step label stored in the progress record
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Type => "Types",
            Stage::Ability => "Abilities",
            Stage::Move => "Moves",
            Stage::Item => "Items",
            Stage::Species => "Pokemon Species",
            Stage::EvolutionChain => "Evolution Chains",
            Stage::Pokemon => "Pokemon Data",
        }
    }

    /// List endpoint of the source
    pub fn resource(&self) -> &'static str {
        match self {
            Stage::Type => "type",
            Stage::Ability => "ability",
            Stage::Move => "move",
            Stage::Item => "item",
            Stage::Species => "pokemon-species",
            Stage::EvolutionChain => "evolution-chain",
            Stage::Pokemon => "pokemon",
        }
    }

    /// Singular noun used in per-item detail messages
    pub fn noun(&self) -> &'static str {
        match self {
            Stage::Type => "type",
            Stage::Ability => "ability",
            Stage::Move => "move",
            Stage::Item => "item",
            Stage::Species => "species",
            Stage::EvolutionChain => "evolution chain",
            Stage::Pokemon => "pokemon",
        }
    }

    /// Name accepted on the command line
    pub fn cli_name(&self) -> &'static str {
        match self {
            Stage::Species => "species",
            other => other.resource(),
        }
    }

    /// Stages whose rows this stage looks up by name
    pub fn dependencies(&self) -> &'static [Stage] {
        match self {
            Stage::Type | Stage::Ability | Stage::Item | Stage::Species => &[],
            Stage::Move => &[Stage::Type],
            Stage::EvolutionChain => &[Stage::Species],
            Stage::Pokemon => &[
                Stage::Type,
                Stage::Ability,
                Stage::Move,
                Stage::Item,
                Stage::Species,
            ],
        }
    }

    /// Only the two largest stages take the `max` cap
    pub fn honours_max(&self) -> bool {
        matches!(self, Stage::Species | Stage::Pokemon)
    }

    pub fn index(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or_default()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.cli_name() == wanted || stage.resource() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Stage::ALL.iter().map(|s| s.cli_name()).collect();
                ImportError::InvalidConfig(format!(
                    "unknown stage '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}
