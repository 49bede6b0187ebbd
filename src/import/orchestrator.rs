use tracing::{info, warn};

use super::{import_all, upserter_for, Stage, StageContext, StageOptions, StageOutcome};
use crate::error::{ImportError, ImportResult};
use crate::progress::ImportProgressTracker;
use crate::source::Source;
use crate::store::Store;
use crate::ui::{Phase, Ui};

/// Where a run is in its stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(usize),
    Completed,
    Failed,
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub import_id: String,
    /// Outcome of every stage that ran in this process, in order
    pub outcomes: Vec<(Stage, StageOutcome)>,
}

impl ImportSummary {
    pub fn imported(&self) -> u64 {
        self.outcomes.iter().map(|(_, o)| o.imported).sum()
    }

    pub fn failed(&self) -> u64 {
        self.outcomes.iter().map(|(_, o)| o.failed).sum()
    }
}

/// Runs stages strictly in order, stopping at the first stage error.
///
/// The only persisted cursor is the tracker's step index: a re-attached
/// run restarts the recorded step from the beginning.
pub struct ImportOrchestrator {
    stages: Vec<Stage>,
    options: StageOptions,
    threads: usize,
    state: RunState,
}

impl ImportOrchestrator {
    /// All seven stages
    pub fn new(options: StageOptions) -> Self {
        Self::with_stages(Stage::ALL.to_vec(), options)
    }

    /// A one-step run of a single stage
    pub fn single(stage: Stage, options: StageOptions) -> Self {
        Self::with_stages(vec![stage], options)
    }

    fn with_stages(stages: Vec<Stage>, options: StageOptions) -> Self {
        Self {
            stages,
            options,
            threads: 1,
            state: RunState::Pending,
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run<S: Source + ?Sized, U: Ui>(
        &mut self,
        source: &S,
        store: &Store,
        import_id: Option<&str>,
        ui: &mut U,
    ) -> ImportResult<ImportSummary> {
        if self.threads > 1 {
            warn!(
                threads = self.threads,
                "records are fetched sequentially; the threads setting has no effect"
            );
        }

        ui.set_phase(Phase::Preparing);
        let mut tracker = ImportProgressTracker::start(store, import_id, self.stages.len())?;
        let import_id = tracker.import_id().to_string();
        let resume_from = tracker.resume_index();
        if let Some(recorded) = tracker.run().current_step.as_deref() {
            let expected = self.stages.get(resume_from).map(Stage::label);
            if expected != Some(recorded) {
                return Err(ImportError::InvalidConfig(format!(
                    "import {} is at step '{}', which this run does not have at position {}",
                    import_id,
                    recorded,
                    resume_from + 1
                )));
            }
        }
        if resume_from > 0 {
            ui.log(format!("Resuming import {} at step {}", import_id, resume_from + 1));
        }
        info!(
            %import_id,
            stages = self.stages.len(),
            page_size = self.options.page_size,
            max_items = ?self.options.max_items,
            threads = self.threads,
            "import starting"
        );

        let mut outcomes = Vec::with_capacity(self.stages.len());
        let total_steps = self.stages.len();

        for (index, stage) in self.stages.iter().copied().enumerate().skip(resume_from) {
            self.state = RunState::Running(index);
            ui.set_phase(Phase::Importing {
                step: index,
                total_steps,
                label: stage.label().to_string(),
            });
            ui.log(format!("Starting {}", stage.label()));

            let options = StageOptions {
                max_items: self.options.max_items.filter(|_| stage.honours_max()),
                ..self.options
            };

            let result = tracker.start_step(stage.label(), index).and_then(|()| {
                let mut upserter = upserter_for(stage);
                let mut ctx = StageContext {
                    source,
                    store,
                    tracker: &mut tracker,
                    ui: &mut *ui,
                };
                import_all(upserter.as_mut(), &mut ctx, &options)
            });

            let outcome = match result.and_then(|o| tracker.complete_step().map(|()| o)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = match &e {
                        ImportError::StageAbort { .. } => e.to_string(),
                        other => format!("Failed to import {}: {}", stage.label(), other),
                    };
                    self.state = RunState::Failed;
                    ui.set_phase(Phase::Failed);
                    ui.log(message.as_str());
                    if let Err(persist) = tracker.fail_import(message.as_str()) {
                        warn!(%import_id, "could not record failure: {}", persist);
                    }
                    return Err(ImportError::StageAbort {
                        stage: stage.label().to_string(),
                        message: stage_message(&e),
                    });
                }
            };

            ui.log(format!(
                "{}: {} imported, {} failed",
                stage.label(),
                outcome.imported,
                outcome.failed
            ));
            outcomes.push((stage, outcome));
        }

        tracker.complete_import()?;
        self.state = RunState::Completed;
        ui.set_phase(Phase::Complete);

        Ok(ImportSummary {
            import_id,
            outcomes,
        })
    }
}

fn stage_message(error: &ImportError) -> String {
    match error {
        ImportError::StageAbort { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RunStatus;
    use crate::source::MemorySource;
    use crate::ui::RecordingUi;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_record("type", 1, json!({"id": 1, "name": "normal"}))
            .with_record("ability", 1, json!({"id": 1, "name": "stench"}))
            .with_record("move", 1, json!({"id": 1, "name": "pound", "type": {"name": "normal", "url": ""}}))
            .with_record("item", 1, json!({"id": 1, "name": "master-ball"}))
            .with_record("pokemon-species", 1, json!({"id": 1, "name": "bulbasaur"}))
            .with_record("pokemon-species", 2, json!({"id": 2, "name": "ivysaur"}))
            .with_record("evolution-chain", 1, json!({
                "id": 1,
                "chain": {
                    "species": {"name": "bulbasaur", "url": ""},
                    "evolves_to": [{
                        "species": {"name": "ivysaur", "url": ""},
                        "evolution_details": [{"min_level": 16, "trigger": {"name": "level-up", "url": ""}}],
                        "evolves_to": []
                    }]
                }
            }))
            .with_record("pokemon", 1, json!({"id": 1, "name": "bulbasaur", "species": {"name": "bulbasaur", "url": ""}}))
    }

    #[test]
    fn test_runs_all_stages_in_order() {
        let source = source();
        let store = Store::open_in_memory().unwrap();
        let mut ui = RecordingUi::default();
        let mut orchestrator = ImportOrchestrator::new(StageOptions::default());

        let summary = orchestrator.run(&source, &store, Some("full"), &mut ui).unwrap();

        assert_eq!(orchestrator.state(), RunState::Completed);
        let stages: Vec<_> = summary.outcomes.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(summary.failed(), 0);
        assert_eq!(store.count("evolutions").unwrap(), 1);
        assert_eq!(ui.phases.last(), Some(&Phase::Complete));

        let run = store.load_import_run("full").unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.current_step_index, 6);
        assert!(run.step_details.iter().all(|s| s.completed));
    }

    #[test]
    fn test_stage_error_fails_run_and_skips_rest() {
        let source = source().fail_listing("item");
        let store = Store::open_in_memory().unwrap();
        let mut ui = RecordingUi::default();
        let mut orchestrator = ImportOrchestrator::new(StageOptions::default());

        let err = orchestrator.run(&source, &store, Some("broken"), &mut ui).unwrap_err();

        assert!(matches!(err, ImportError::StageAbort { ref stage, .. } if stage == "Items"));
        assert_eq!(orchestrator.state(), RunState::Failed);
        assert_eq!(store.count("pokemon_species").unwrap(), 0);
        assert!(!source.requests().iter().any(|r| r.starts_with("/pokemon")));

        let run = store.load_import_run("broken").unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Failed to import Items"));
    }

    #[test]
    fn test_resumes_from_recorded_step() {
        let source = source();
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("again"), 7).unwrap();
            tracker.start_step("Pokemon Species", 4).unwrap();
        }

        let mut ui = RecordingUi::default();
        let summary = ImportOrchestrator::new(StageOptions::default())
            .run(&source, &store, Some("again"), &mut ui)
            .unwrap();

        let stages: Vec<_> = summary.outcomes.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec![Stage::Species, Stage::EvolutionChain, Stage::Pokemon]);
        assert_eq!(store.count("types").unwrap(), 0);
        assert_eq!(store.count("pokemon").unwrap(), 1);
    }

    #[test]
    fn test_single_stage_cannot_take_over_full_import() {
        let source = source();
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("full"), 7).unwrap();
            tracker.start_step("Pokemon Species", 4).unwrap();
        }

        let err = ImportOrchestrator::single(Stage::Pokemon, StageOptions::default())
            .run(&source, &store, Some("full"), &mut RecordingUi::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(_)));

        let run = store.load_import_run("full").unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.current_step_index, 4);
        assert_eq!(store.count("pokemon").unwrap(), 0);
    }

    #[test]
    fn test_full_import_cannot_take_over_single_stage() {
        let source = source();
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("one"), 1).unwrap();
            tracker.start_step("Pokemon Data", 0).unwrap();
        }

        let err = ImportOrchestrator::new(StageOptions::default())
            .run(&source, &store, Some("one"), &mut RecordingUi::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(_)));
        assert_eq!(store.count("types").unwrap(), 0);
    }

    #[test]
    fn test_resume_rejects_different_stage() {
        let source = source();
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("moves"), 1).unwrap();
            tracker.start_step("Moves", 0).unwrap();
        }

        let err = ImportOrchestrator::single(Stage::Item, StageOptions::default())
            .run(&source, &store, Some("moves"), &mut RecordingUi::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(_)));
        assert_eq!(store.count("items").unwrap(), 0);
    }

    #[test]
    fn test_max_applies_only_to_large_stages() {
        let source = source()
            .with_record("type", 2, json!({"id": 2, "name": "fire"}))
            .with_record("pokemon", 2, json!({"id": 2, "name": "ivysaur"}));
        let store = Store::open_in_memory().unwrap();
        let options = StageOptions {
            page_size: 10,
            max_items: Some(1),
        };

        ImportOrchestrator::new(options)
            .run(&source, &store, None, &mut RecordingUi::default())
            .unwrap();

        assert_eq!(store.count("types").unwrap(), 2);
        assert_eq!(store.count("pokemon_species").unwrap(), 1);
        assert_eq!(store.count("pokemon").unwrap(), 1);
    }
}
