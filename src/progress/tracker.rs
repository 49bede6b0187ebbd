use tracing::{debug, info, warn};

use super::{ImportRun, RunStatus, StepDetail};
use crate::error::{ImportError, ImportResult};
use crate::store::{now_rfc3339, Store};

/// Writes the state of one import run to its `import_progress` row.
///
/// Every mutation is persisted immediately so a concurrent poller always
/// sees the latest counters. Only the orchestrator's call chain holds a
/// tracker, so there is exactly one writer per run. Once the run is
/// completed or failed every mutation is rejected with `RunTerminal`.
pub struct ImportProgressTracker<'a> {
    store: &'a Store,
    run: ImportRun,
}

impl<'a> ImportProgressTracker<'a> {
    /// Create a new run, or re-attach to a running one with the given id.
    pub fn start(
        store: &'a Store,
        import_id: Option<&str>,
        total_steps: usize,
    ) -> ImportResult<Self> {
        if let Some(id) = import_id {
            if let Some(run) = store.load_import_run(id)? {
                if run.status.is_terminal() {
                    return Err(ImportError::RunTerminal(id.to_string()));
                }
                if run.total_steps != total_steps {
                    return Err(ImportError::InvalidConfig(format!(
                        "import {} has {} steps, cannot resume it with {}",
                        id, run.total_steps, total_steps
                    )));
                }
                info!(
                    import_id = id,
                    step_index = run.current_step_index,
                    "re-attached to running import"
                );
                return Ok(Self { store, run });
            }
        }

        let import_id = import_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let run = ImportRun::new(import_id, total_steps, now_rfc3339());
        store.save_import_run(&run)?;
        info!(import_id = %run.import_id, total_steps, "started import");

        Ok(Self { store, run })
    }

    pub fn import_id(&self) -> &str {
        &self.run.import_id
    }

    pub fn run(&self) -> &ImportRun {
        &self.run
    }

    /// Step index a re-attached run should continue from
    pub fn resume_index(&self) -> usize {
        self.run.current_step_index
    }

    /// Begin step `index`. Indexes may repeat (a resumed step restarts) but
    /// never go backwards.
    pub fn start_step(&mut self, label: &str, index: usize) -> ImportResult<()> {
        self.ensure_running()?;
        if index < self.run.current_step_index {
            return Err(ImportError::InvalidConfig(format!(
                "step {} ({}) is before current step {}",
                index, label, self.run.current_step_index
            )));
        }

        self.run.current_step = Some(label.to_string());
        self.run.current_step_index = index;
        self.run.current_step_processed = 0;
        self.run.current_step_total = None;
        self.run.last_detail_message = Some(format!("Starting {}", label));

        let detail = StepDetail {
            label: label.to_string(),
            index,
            ..Default::default()
        };
        match self.run.step_details.iter_mut().find(|s| s.label == label) {
            Some(existing) => *existing = detail,
            None => self.run.step_details.push(detail),
        }

        self.save()
    }

    /// Record the known item count of the current step
    pub fn set_step_total(&mut self, total: u64) -> ImportResult<()> {
        self.ensure_running()?;
        self.run.current_step_total = Some(total);
        if let Some(step) = self.current_detail_mut() {
            step.total = Some(total);
        }
        self.save()
    }

    /// Count one processed item and publish `detail` for pollers
    pub fn advance(&mut self, detail: impl Into<String>) -> ImportResult<()> {
        self.ensure_running()?;
        let detail = detail.into();
        debug!(processed = self.run.current_step_processed + 1, "{}", detail);

        self.run.current_step_processed += 1;
        let processed = self.run.current_step_processed;
        if let Some(step) = self.current_detail_mut() {
            step.processed = processed;
        }
        self.run.last_detail_message = Some(detail);
        self.save()
    }

    /// Item imported
    pub fn success(&mut self, detail: impl Into<String>) -> ImportResult<()> {
        self.ensure_running()?;
        if let Some(step) = self.current_detail_mut() {
            step.imported += 1;
        }
        self.advance(detail)
    }

    /// Item failed; still counts as processed
    pub fn error(&mut self, message: impl Into<String>) -> ImportResult<()> {
        self.ensure_running()?;
        let message = message.into();
        if let Some(step) = self.current_detail_mut() {
            step.failed += 1;
            step.last_error = Some(message.clone());
        }
        self.advance(format!("Error: {}", message))
    }

    pub fn complete_step(&mut self) -> ImportResult<()> {
        self.ensure_running()?;
        let label = self.run.current_step.clone().unwrap_or_default();
        if let Some(step) = self.current_detail_mut() {
            step.completed = true;
        }
        self.run.last_detail_message = Some(format!("{} completed", label));
        self.save()
    }

    pub fn complete_import(&mut self) -> ImportResult<()> {
        self.ensure_running()?;
        self.run.status = RunStatus::Completed;
        self.run.completed_at = Some(now_rfc3339());
        info!(import_id = %self.run.import_id, "import completed");
        self.save()
    }

    pub fn fail_import(&mut self, message: impl Into<String>) -> ImportResult<()> {
        self.ensure_running()?;
        let message = message.into();
        warn!(import_id = %self.run.import_id, "import failed: {}", message);
        self.run.status = RunStatus::Failed;
        self.run.error_message = Some(message);
        self.run.completed_at = Some(now_rfc3339());
        self.save()
    }

    fn ensure_running(&self) -> ImportResult<()> {
        if self.run.status.is_terminal() {
            return Err(ImportError::RunTerminal(self.run.import_id.clone()));
        }
        Ok(())
    }

    fn current_detail_mut(&mut self) -> Option<&mut StepDetail> {
        let label = self.run.current_step.as_deref()?;
        self.run.step_details.iter_mut().find(|s| s.label == label)
    }

    fn save(&self) -> ImportResult<()> {
        self.store.save_import_run(&self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_successes_and_errors_as_processed() {
        let store = Store::open_in_memory().unwrap();
        let mut tracker = ImportProgressTracker::start(&store, None, 7).unwrap();
        tracker.start_step("Moves", 2).unwrap();
        tracker.set_step_total(3).unwrap();
        tracker.success("Importing move: pound").unwrap();
        tracker.error("bad payload").unwrap();
        tracker.success("Importing move: thunderbolt").unwrap();

        let run = store.load_import_run(tracker.import_id()).unwrap().unwrap();
        assert_eq!(run.current_step.as_deref(), Some("Moves"));
        assert_eq!(run.current_step_index, 2);
        assert_eq!(run.current_step_processed, 3);
        assert_eq!(run.current_step_total, Some(3));
        assert_eq!(
            run.last_detail_message.as_deref(),
            Some("Importing move: thunderbolt")
        );

        let step = run.step("Moves").unwrap();
        assert_eq!((step.imported, step.failed), (2, 1));
        assert_eq!(step.last_error.as_deref(), Some("bad payload"));
    }

    #[test]
    fn test_new_step_resets_processed() {
        let store = Store::open_in_memory().unwrap();
        let mut tracker = ImportProgressTracker::start(&store, None, 7).unwrap();
        tracker.start_step("Types", 0).unwrap();
        tracker.success("Importing type: normal").unwrap();
        tracker.complete_step().unwrap();
        tracker.start_step("Abilities", 1).unwrap();

        assert_eq!(tracker.run().current_step_processed, 0);
        assert!(tracker.run().step("Types").unwrap().completed);
        assert!(tracker.start_step("Types", 0).is_err());
    }

    #[test]
    fn test_failure_is_terminal() {
        let store = Store::open_in_memory().unwrap();
        let mut tracker = ImportProgressTracker::start(&store, Some("run-x"), 7).unwrap();
        tracker.start_step("Types", 0).unwrap();
        tracker.fail_import("Failed to import Types").unwrap();

        assert!(matches!(
            tracker.advance("late"),
            Err(ImportError::RunTerminal(_))
        ));
        assert!(tracker.complete_import().is_err());

        let run = store.load_import_run("run-x").unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("Failed to import Types"));
        assert!(run.completed_at.is_some());

        // A finished run cannot be re-attached
        assert!(matches!(
            ImportProgressTracker::start(&store, Some("run-x"), 7),
            Err(ImportError::RunTerminal(_))
        ));
    }

    #[test]
    fn test_reattaches_to_running_import() {
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("resume-me"), 7).unwrap();
            tracker.start_step("Moves", 2).unwrap();
        }

        let tracker = ImportProgressTracker::start(&store, Some("resume-me"), 7).unwrap();
        assert_eq!(tracker.resume_index(), 2);
        assert_eq!(store.count("import_progress").unwrap(), 1);
    }

    #[test]
    fn test_reattach_requires_same_step_count() {
        let store = Store::open_in_memory().unwrap();
        {
            let mut tracker = ImportProgressTracker::start(&store, Some("seven"), 7).unwrap();
            tracker.start_step("Pokemon Species", 4).unwrap();
        }

        assert!(matches!(
            ImportProgressTracker::start(&store, Some("seven"), 1),
            Err(ImportError::InvalidConfig(_))
        ));
        let run = store.load_import_run("seven").unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.current_step_index, 4);
    }
}
