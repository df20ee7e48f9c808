//! Workflow controller: the ordered pipeline with user checkpoints.
//!
//! Owns the run's Idea, Theme and Specification for its whole duration
//! and sequences the steps `IDEA → THEME → SPEC → REVIEW → SCAFFOLD →
//! SYNTH → DONE`. Cancellation is cooperative and only observed at step
//! boundaries; an in-flight generation call always completes or fails on
//! its own first. Each checkpoint is persisted before the run moves on,
//! so a crash never loses the last accepted artifact (resumption across
//! restarts is not implemented).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::gateway::{Gateway, GatewayError, GatewayResult, DEFAULT_TEMPERATURE};
use crate::idea::{self, Idea};
use crate::scaffold::{self, ScaffoldError, ScaffoldPlan};
use crate::spec::{self, Specification};
use crate::storage::{
    ArtifactStore, FOLDER_STRUCTURE_FILE, IDEA_FILE, SPEC_FILE, SPEC_FINAL_FILE,
    SPEC_FINAL_MD_FILE, SPEC_MD_FILE, THEME_FILE,
};
use crate::synth::{self, SynthReport};
use crate::themes::{self, Theme, ThemeSelection};

/// Workflow states. `Aborted` is terminal and reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idea,
    Theme,
    Spec,
    Review,
    Scaffold,
    Synth,
    Done,
    Aborted,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The user cancelled, or console input ended.
    #[error("run cancelled by user")]
    Cancelled,
    /// Scaffold planning or materialization failed; fatal to the run.
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),
    /// A checkpoint could not be persisted.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct RunOutcome {
    pub app_dir: PathBuf,
    pub report: SynthReport,
}

/// Refuse amendment of a frozen document before any gateway call is made.
pub(crate) async fn amend_specification(
    gateway: &Gateway,
    current: &Specification,
    change_request: &str,
    max_tokens: u32,
) -> GatewayResult<Specification> {
    if current.frozen {
        return Err(GatewayError::InvalidRequest(
            "specification is frozen and can no longer be amended".to_string(),
        ));
    }
    spec::amend(gateway, current, change_request, max_tokens).await
}

pub struct Workflow<C: Console> {
    gateway: Gateway,
    console: C,
    store: ArtifactStore,
    max_tokens: u32,
    state: Step,
}

impl<C: Console> Workflow<C> {
    pub fn new(gateway: Gateway, console: C, store: ArtifactStore, max_tokens: u32) -> Self {
        Self {
            gateway,
            console,
            store,
            max_tokens,
            state: Step::Idea,
        }
    }

    pub fn state(&self) -> Step {
        self.state
    }

    pub async fn run(&mut self) -> Result<RunOutcome, WorkflowError> {
        match self.execute().await {
            Ok(outcome) => {
                self.state = Step::Done;
                Ok(outcome)
            }
            Err(err) => {
                self.state = Step::Aborted;
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<RunOutcome, WorkflowError> {
        let idea = self.step_idea().await?;
        let selection = self.step_theme().await?;
        let spec = self.step_spec(&idea, &selection.theme).await?;
        let final_spec = self.step_review(spec).await?;
        let (plan, app_dir) = self.step_scaffold(&idea, &final_spec, &selection.theme)?;
        let report = self
            .step_synth(&plan, &final_spec, &selection.theme, &app_dir)
            .await?;
        Ok(RunOutcome { app_dir, report })
    }

    // Step 1: generate an app idea until the user accepts one.
    async fn step_idea(&mut self) -> Result<Idea, WorkflowError> {
        self.enter(Step::Idea);
        loop {
            let context = self.ask(
                "What kind of app are you interested in? (press Enter to let the model decide)",
                "",
            )?;

            let idea = loop {
                match idea::generate(&self.gateway, &context, self.max_tokens).await {
                    Ok(idea) => break idea,
                    Err(err) => self.gateway_failed("Idea generation", &err)?,
                }
            };

            self.console.say(&format_idea(&idea));

            if self.confirm("Do you want to proceed with this idea?", true)? {
                self.store.save_json(IDEA_FILE, &idea)?;
                info!("Idea accepted: {}", idea.name);
                return Ok(idea);
            }
            if !self.confirm("Generate a new idea?", true)? {
                return Err(WorkflowError::Cancelled);
            }
        }
    }

    // Step 2: design inspiration plus theme selection from the catalog.
    async fn step_theme(&mut self) -> Result<ThemeSelection, WorkflowError> {
        self.enter(Step::Theme);

        let inspiration = loop {
            match self
                .gateway
                .generate(
                    themes::inspiration_prompt(),
                    self.max_tokens,
                    DEFAULT_TEMPERATURE,
                )
                .await
            {
                Ok(text) => break text,
                Err(err) => self.gateway_failed("Design inspiration", &err)?,
            }
        };
        self.console.say(&inspiration);

        let catalog = themes::all();
        for (index, theme) in catalog.iter().enumerate() {
            self.console.say(&format!(
                "{}. {} — {}\n   {}",
                index + 1,
                theme.name,
                theme.description,
                theme.characteristics.join(", "),
            ));
        }

        let theme = loop {
            let index = self.select("Select a theme", catalog.len(), 0)?;
            match themes::by_index(index) {
                Ok(theme) => break theme,
                Err(err) => self.console.say(&format!("{}", err)),
            }
        };
        self.console.say(&format!("✓ Selected: {}", theme.name));

        let selection = ThemeSelection {
            theme,
            inspiration,
            selected_at: chrono::Utc::now(),
        };
        self.store.save_json(THEME_FILE, &selection)?;
        Ok(selection)
    }

    // Step 3: generate the specification document.
    async fn step_spec(
        &mut self,
        idea: &Idea,
        theme: &Theme,
    ) -> Result<Specification, WorkflowError> {
        self.enter(Step::Spec);

        let document = loop {
            match spec::create(&self.gateway, idea, theme, self.max_tokens).await {
                Ok(document) => break document,
                Err(err) => self.gateway_failed("Specification generation", &err)?,
            }
        };

        if document.is_degraded() {
            warn!("Specification could not be decomposed; keeping raw text only");
        }
        self.persist_specification(&document)?;
        self.console.say(&document.to_markdown());
        Ok(document)
    }

    // Step 4: review loop. Acceptance freezes the document.
    async fn step_review(
        &mut self,
        mut current: Specification,
    ) -> Result<Specification, WorkflowError> {
        self.enter(Step::Review);

        loop {
            if !self.confirm("Would you like to make changes to the specification?", false)? {
                break;
            }

            self.console.say(
                "1. Request AI changes\n2. Reload specification.json after manual editing\n3. Keep current specification",
            );
            match self.select("Enter your choice", 3, 2)? {
                0 => {
                    let request = self.ask("What changes would you like to make?", "")?;
                    if request.trim().is_empty() {
                        self.console.say("No change request given.");
                        continue;
                    }

                    let amended = loop {
                        match amend_specification(
                            &self.gateway,
                            &current,
                            &request,
                            self.max_tokens,
                        )
                        .await
                        {
                            Ok(document) => break document,
                            Err(err) => self.gateway_failed("Specification update", &err)?,
                        }
                    };

                    // Replacement only: a result that lost its structure is
                    // discarded and the previous document retained.
                    if amended.is_degraded() && !current.is_degraded() {
                        warn!("Amendment response did not parse; previous specification retained");
                        self.console.say(
                            "✗ The updated specification could not be parsed; keeping the previous version.",
                        );
                    } else {
                        current = amended;
                        self.persist_specification(&current)?;
                        self.console.say(&current.to_markdown());
                    }
                }
                1 => {
                    self.console.say(&format!(
                        "Edit {} and save it.",
                        self.store.path_of(SPEC_FILE).display()
                    ));
                    self.ask("Press Enter when you're done editing", "")?;
                    match self.store.load_specification(SPEC_FILE) {
                        Ok(document) => {
                            current = document;
                            self.console.say("✓ Reloaded edited specification.");
                        }
                        Err(err) => self.console.say(&format!(
                            "✗ Could not reload specification ({}); keeping the previous version.",
                            err
                        )),
                    }
                }
                _ => break,
            }
        }

        let final_spec = current.freeze();
        self.store.save_json(SPEC_FINAL_FILE, &final_spec)?;
        self.store
            .save_text(SPEC_FINAL_MD_FILE, &final_spec.to_markdown())?;
        info!("Specification frozen");
        Ok(final_spec)
    }

    // Step 5: deterministic scaffold plan, persisted, then materialized.
    fn step_scaffold(
        &mut self,
        idea: &Idea,
        final_spec: &Specification,
        theme: &Theme,
    ) -> Result<(ScaffoldPlan, PathBuf), WorkflowError> {
        self.enter(Step::Scaffold);

        let app_name = self.ask("App directory name", &idea.name)?;
        let plan = scaffold::build(&app_name, final_spec)?;
        self.store.save_json(FOLDER_STRUCTURE_FILE, &plan)?;
        self.console.say(&plan.render_tree());

        let app_dir = scaffold::materialize(&plan, self.store.output_dir(), theme)?;
        self.console
            .say(&format!("✓ Folder structure created at: {}", app_dir.display()));
        Ok((plan, app_dir))
    }

    // Step 6: per-unit code synthesis; failures degrade, never abort.
    async fn step_synth(
        &mut self,
        plan: &ScaffoldPlan,
        final_spec: &Specification,
        theme: &Theme,
        app_dir: &Path,
    ) -> Result<SynthReport, WorkflowError> {
        self.enter(Step::Synth);

        let report = synth::synthesize(&self.gateway, plan, final_spec, theme).await;
        for file in &report.files {
            let path = app_dir.join(&file.path);
            fs::write(&path, &file.content).map_err(ScaffoldError::Io)?;
        }

        if report.is_clean() {
            self.console.say("✓ All application files generated.");
        } else {
            for failure in &report.failures {
                self.console.say(&format!(
                    "⚠ {} fell back to a stub: {}",
                    failure.path, failure.reason
                ));
            }
        }
        Ok(report)
    }

    fn enter(&mut self, step: Step) {
        debug!("Workflow state: {:?} -> {:?}", self.state, step);
        self.state = step;
    }

    fn persist_specification(&self, document: &Specification) -> Result<(), WorkflowError> {
        self.store.save_json(SPEC_FILE, document)?;
        self.store.save_text(SPEC_MD_FILE, &document.to_markdown())?;
        Ok(())
    }

    /// Surface a gateway failure at a checkpoint: the user retries the
    /// step or aborts the run. Never silently swallowed.
    fn gateway_failed(&mut self, step: &str, err: &GatewayError) -> Result<(), WorkflowError> {
        warn!("{} failed: {}", step, err);
        self.console.say(&format!("✗ {} failed: {}", step, err));
        if self.confirm("Retry this step?", true)? {
            Ok(())
        } else {
            Err(WorkflowError::Cancelled)
        }
    }

    // Console wrappers: input ending (EOF, closed terminal) cancels the
    // run cooperatively instead of surfacing an I/O error.

    fn ask(&mut self, prompt: &str, default: &str) -> Result<String, WorkflowError> {
        self.console.ask(prompt, default).map_err(|err| {
            info!("Console input ended ({}); cancelling run", err);
            WorkflowError::Cancelled
        })
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, WorkflowError> {
        self.console.confirm(prompt, default).map_err(|err| {
            info!("Console input ended ({}); cancelling run", err);
            WorkflowError::Cancelled
        })
    }

    fn select(&mut self, prompt: &str, count: usize, default: usize) -> Result<usize, WorkflowError> {
        self.console.select(prompt, count, default).map_err(|err| {
            info!("Console input ended ({}); cancelling run", err);
            WorkflowError::Cancelled
        })
    }
}

fn format_idea(idea: &Idea) -> String {
    let mut out = format!(
        "App Name: {}\nDescription: {}\nTarget Users: {}\nKey Features:\n",
        idea.name, idea.description, idea.target_users
    );
    for feature in &idea.key_features {
        out.push_str("  • ");
        out.push_str(feature);
        out.push('\n');
    }
    if let Some(problem) = &idea.problem_solved {
        out.push_str("Problem Solved: ");
        out.push_str(problem);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::ScriptedConsole;
    use crate::gateway::testing::StubModel;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    const IDEA_JSON: &str = r#"{
        "name": "TaskFlow",
        "description": "A lightweight task manager",
        "target_users": "Busy professionals",
        "features": ["Task List", "Reminders"],
        "problem_solved": "Scattered todo lists"
    }"#;

    const SPEC_JSON: &str = r#"{
        "overview": "TaskFlow keeps tasks in one place",
        "technical_requirements": "Flutter 3",
        "features": ["Task List", "Reminders"],
        "screens": ["Task List", "Settings"],
        "data_models": ["Task"],
        "api_requirements": "None",
        "design_guidelines": "Minimalist",
        "testing_requirements": "Widget tests"
    }"#;

    const VALID_DART: &str = "class Generated {\n  final int value = 1;\n}";

    fn scripted_model() -> (StubModel, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        StubModel::new(|_, prompt| {
            if prompt.contains("mobile app idea") {
                Ok(IDEA_JSON.to_string())
            } else if prompt.contains("design inspiration") {
                Ok("Keep it clean and airy.".to_string())
            } else if prompt.contains("Create a detailed specification document") {
                Ok(SPEC_JSON.to_string())
            } else if prompt.contains("Update the following specification") {
                Ok("I cannot help with that.".to_string())
            } else {
                Ok(VALID_DART.to_string())
            }
        })
    }

    fn workflow_with(
        console: ScriptedConsole,
        store: ArtifactStore,
    ) -> (Workflow<ScriptedConsole>, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let (model, calls) = scripted_model();
        let gateway = Gateway::new(Box::new(model));
        (Workflow::new(gateway, console, store, 4000), calls)
    }

    #[tokio::test]
    async fn test_full_run_writes_every_checkpoint() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("output")).unwrap();
        // Every prompt resolves to its default: idea accepted, first
        // theme, no review changes, app name from the idea.
        let (mut workflow, _) = workflow_with(ScriptedConsole::new(), store);

        let outcome = workflow.run().await.unwrap();

        assert_eq!(workflow.state(), Step::Done);
        assert!(outcome.report.is_clean());

        let output = tmp.path().join("output");
        for name in [
            IDEA_FILE,
            THEME_FILE,
            SPEC_FILE,
            SPEC_MD_FILE,
            SPEC_FINAL_FILE,
            SPEC_FINAL_MD_FILE,
            FOLDER_STRUCTURE_FILE,
        ] {
            assert!(output.join(name).is_file(), "missing {}", name);
        }

        // App tree generated under output/<slug>, screens included.
        assert_eq!(outcome.app_dir, output.join("taskflow"));
        assert!(outcome.app_dir.join("lib/screens/task_list_screen.dart").is_file());
        assert!(outcome.app_dir.join("lib/models/task.dart").is_file());
        let generated =
            std::fs::read_to_string(outcome.app_dir.join("lib/screens/settings_screen.dart"))
                .unwrap();
        assert_eq!(generated, VALID_DART);

        // The frozen checkpoint is marked final.
        let final_spec = ArtifactStore::new(output)
            .unwrap()
            .load_specification(SPEC_FINAL_FILE)
            .unwrap();
        assert!(final_spec.frozen);
    }

    #[tokio::test]
    async fn test_declining_idea_twice_cancels() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("output")).unwrap();
        let console = ScriptedConsole::new()
            .confirm_with(false) // do not proceed with this idea
            .confirm_with(false); // do not generate a new one
        let (mut workflow, _) = workflow_with(console, store);

        let err = workflow.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Cancelled));
        assert_eq!(workflow.state(), Step::Aborted);
        assert!(!tmp.path().join("output").join(IDEA_FILE).exists());
    }

    #[tokio::test]
    async fn test_degraded_amendment_retains_previous() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("output")).unwrap();
        let console = ScriptedConsole::new()
            .answer("") // idea context
            .answer("add offline support") // change request
            .confirm_with(true) // proceed with idea
            .confirm_with(true) // make changes
            .confirm_with(false) // done reviewing
            .select_with(0) // theme
            .select_with(0); // review choice: AI changes
        let (mut workflow, _) = workflow_with(console, store);

        let outcome = workflow.run().await.unwrap();
        assert!(workflow.console.saw("keeping the previous version"));
        assert!(outcome.report.is_clean());

        // The stub amendment response was prose; the original document
        // survived and was frozen.
        let final_spec = ArtifactStore::new(tmp.path().join("output"))
            .unwrap()
            .load_specification(SPEC_FINAL_FILE)
            .unwrap();
        assert_eq!(final_spec.overview, "TaskFlow keeps tasks in one place");
        assert!(final_spec.frozen);
    }

    #[tokio::test]
    async fn test_amend_frozen_specification_is_rejected_without_gateway_call() {
        // Scenario D: no network side effect is observable.
        let (model, calls) = scripted_model();
        let gateway = Gateway::new(Box::new(model));
        let frozen = Specification {
            overview: "final".to_string(),
            raw_text: "raw".to_string(),
            ..Default::default()
        }
        .freeze();

        let err = amend_specification(&gateway, &frozen, "change it", 4000)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_offers_retry_then_abort() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("output")).unwrap();
        let (model, calls) = StubModel::new(|_, _| Err(crate::gateway::testing::network_down()));
        let gateway = Gateway::new(Box::new(model));
        let console = ScriptedConsole::new()
            .confirm_with(true) // retry once
            .confirm_with(false); // then abort
        let mut workflow = Workflow::new(gateway, console, store, 4000);

        let err = workflow.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(workflow.console.saw("Idea generation failed"));
    }

    #[tokio::test]
    async fn test_duplicate_screens_abort_scaffold() {
        // Scenario A through the controller: the duplicate-target error is
        // fatal once review has finished.
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("output")).unwrap();
        let (model, _) = StubModel::new(|_, prompt| {
            if prompt.contains("mobile app idea") {
                Ok(IDEA_JSON.to_string())
            } else if prompt.contains("design inspiration") {
                Ok("inspiration".to_string())
            } else if prompt.contains("Create a detailed specification document") {
                Ok(r#"{"overview": "x", "screens": ["Task List", "Task List"]}"#.to_string())
            } else {
                Ok(VALID_DART.to_string())
            }
        });
        let gateway = Gateway::new(Box::new(model));
        let mut workflow = Workflow::new(gateway, ScriptedConsole::new(), store, 4000);

        let err = workflow.run().await.unwrap_err();
        match err {
            WorkflowError::Scaffold(ScaffoldError::DuplicateTarget { duplicates }) => {
                assert_eq!(duplicates, vec!["lib/screens/task_list_screen.dart"]);
            }
            other => panic!("expected DuplicateTarget, got {:?}", other),
        }
        assert_eq!(workflow.state(), Step::Aborted);
    }
}
