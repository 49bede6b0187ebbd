//! Import stages.
//!
//! Every stage pages through one list endpoint, fetches each record's
//! detail document and hands it to that stage's [`EntityUpserter`]. The
//! paging, progress tracking and per-item failure policy live in
//! [`import_all`] and are shared by all seven stages.

mod abilities;
mod evolution;
mod items;
mod moves;
mod orchestrator;
mod pokemon;
mod species;
mod stage;
mod types;

pub use abilities::AbilityUpserter;
pub use evolution::{EvolutionChainResolver, EvolutionChainUpserter};
pub use items::ItemUpserter;
pub use moves::MoveUpserter;
pub use orchestrator::{ImportOrchestrator, ImportSummary, RunState};
pub use pokemon::PokemonUpserter;
pub use species::SpeciesUpserter;
pub use stage::Stage;
pub use types::TypeUpserter;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ImportError, ImportResult};
use crate::progress::ImportProgressTracker;
use crate::source::{extract_id_from_url, Source};
use crate::store::Store;
use crate::ui::Ui;

/// Paging settings for one stage run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    pub page_size: u32,
    /// Stop after this many processed items
    pub max_items: Option<u64>,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_items: None,
        }
    }
}

/// Per-stage result counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageOutcome {
    pub imported: u64,
    pub failed: u64,
}

impl StageOutcome {
    pub fn processed(&self) -> u64 {
        self.imported + self.failed
    }
}

/// Turns one source detail document into stored rows
pub trait EntityUpserter {
    fn stage(&self) -> Stage;

    /// Write the record and return its display name
    fn upsert(&mut self, store: &Store, detail: Value) -> ImportResult<String>;
}

/// A fresh upserter (with empty lookup caches) for `stage`
pub fn upserter_for(stage: Stage) -> Box<dyn EntityUpserter> {
    match stage {
        Stage::Type => Box::new(TypeUpserter),
        Stage::Ability => Box::new(AbilityUpserter),
        Stage::Move => Box::new(MoveUpserter::new()),
        Stage::Item => Box::new(ItemUpserter),
        Stage::Species => Box::new(SpeciesUpserter),
        Stage::EvolutionChain => Box::new(EvolutionChainUpserter::new()),
        Stage::Pokemon => Box::new(PokemonUpserter::new()),
    }
}

/// Everything a stage run reads from or reports to
pub struct StageContext<'a, 's, S: Source + ?Sized, U: Ui> {
    pub source: &'a S,
    pub store: &'s Store,
    pub tracker: &'a mut ImportProgressTracker<'s>,
    pub ui: &'a mut U,
}

/// Run one stage to the end of its listing (or `max_items`).
///
/// A failing count probe or page request aborts the stage with
/// `StageAbort`. A failure while handling a single record is logged,
/// counted on the tracker, and the next record is processed.
pub fn import_all<S: Source + ?Sized, U: Ui>(
    upserter: &mut dyn EntityUpserter,
    ctx: &mut StageContext<'_, '_, S, U>,
    options: &StageOptions,
) -> ImportResult<StageOutcome> {
    let stage = upserter.stage();
    let resource = stage.resource();
    let abort = |e: ImportError| ImportError::StageAbort {
        stage: stage.label().to_string(),
        message: e.to_string(),
    };

    let count = ctx.source.fetch_page(resource, 1, 0).map_err(abort)?.count;
    let total = options.max_items.map_or(count, |max| count.min(max));
    ctx.tracker.set_step_total(total)?;
    info!(stage = stage.label(), count, total, "importing");

    let mut outcome = StageOutcome::default();
    let mut offset: u64 = 0;

    'pages: loop {
        let page = ctx
            .source
            .fetch_page(resource, options.page_size, offset)
            .map_err(abort)?;
        if page.results.is_empty() {
            break;
        }
        offset += page.results.len() as u64;

        for entry in page.results {
            let result = extract_id_from_url(&entry.url)
                .and_then(|id| ctx.source.fetch_detail(resource, id))
                .and_then(|detail| upserter.upsert(ctx.store, detail));

            match result {
                Ok(name) => {
                    outcome.imported += 1;
                    let detail = format!("Importing {}: {}", stage.noun(), name);
                    ctx.tracker.success(detail.as_str())?;
                    ctx.ui.set_info(detail);
                }
                Err(e) => {
                    outcome.failed += 1;
                    let message = format!("{} {}: {}", stage.noun(), entry.name, e);
                    warn!(stage = stage.label(), "{}", message);
                    ctx.tracker.error(message.as_str())?;
                    ctx.ui.log(format!("Error: {}", message));
                }
            }
            ctx.ui.set_progress(outcome.processed(), total, stage.label());

            if options.max_items.is_some_and(|max| outcome.processed() >= max) {
                break 'pages;
            }
        }
    }

    info!(
        stage = stage.label(),
        imported = outcome.imported,
        failed = outcome.failed,
        "stage finished"
    );
    Ok(outcome)
}
