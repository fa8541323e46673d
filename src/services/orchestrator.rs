//! Generation Orchestrator
//!
//! A run is a finite-state machine over seven stages:
//!
//! ```text
//! IdentifyTarget -> ResolveLanguage -> ProbeConflicts -> AssembleContinuation
//!     -> Generate -> Write -> Notify
//! ```
//!
//! Each transition consumes the previous stage's data and yields the next
//! state, a cancellation, or an error. Nothing is retried; every error ends
//! the run. All user gates (language, conflicts, continuation) come before the
//! remote call and before any write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::context::{capture_editor_context, resolve_workspace_root};
use super::detector::ContextDetector;
use super::extractor::SymbolExtractor;
use super::framework::{TestFramework, resolve_framework};
use super::interaction::{Interaction, Notice, PickOption};
use super::writer::{FileWriter, WriteOutcome, derive_path, story_paths};
use crate::error::{TestGenieError, TestGenieResult};
use crate::infra::lock::RunLock;
use crate::infra::remote::{GenerationService, IssueTracker};
use crate::models::generation::{
    ConflictChoice, ContinuationContext, EditorContext, FileConflict, GenerationRequest,
    GenerationResult, StoryRef,
};
use crate::models::language::{Language, LanguageConfig, get_config};
use crate::models::story::{StoryId, format_requirements};
use crate::models::symbol::Symbol;

/// What a run generates for
#[derive(Debug, Clone)]
pub enum RunTarget {
    /// Tests for a saved source file
    Source {
        file: PathBuf,
        root: Option<PathBuf>,
        language: Option<String>,
    },
    /// Tests and production code for an issue-tracker story
    Story {
        id: Option<StoryId>,
        root: Option<PathBuf>,
        language: Option<String>,
        continuation: ContinuationMode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationMode {
    /// Ask at the continuation gate
    Ask,
    New,
    Continues(StoryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    IdentifyTarget,
    ResolveLanguage,
    ProbeConflicts,
    AssembleContinuation,
    Generate,
    Write,
    Notify,
}

impl Stage {
    /// Monotonic progress fraction on entry
    pub fn progress(&self) -> f32 {
        match self {
            Self::IdentifyTarget => 0.05,
            Self::ResolveLanguage => 0.2,
            Self::ProbeConflicts => 0.35,
            Self::AssembleContinuation => 0.45,
            Self::Generate => 0.6,
            Self::Write => 0.9,
            Self::Notify => 1.0,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::IdentifyTarget => "Identifying target",
            Self::ResolveLanguage => "Resolving language",
            Self::ProbeConflicts => "Checking existing files",
            Self::AssembleContinuation => "Assembling continuation context",
            Self::Generate => "Generating code",
            Self::Write => "Writing files",
            Self::Notify => "Done",
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub language: Language,
    pub test_framework: String,
    pub project_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<StoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continued_from: Option<StoryId>,
    #[serde(flatten)]
    pub result: GenerationResult,
    pub written: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<PathBuf>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunReport),
    Cancelled { stage: Stage },
}

enum WorkItem {
    Source(EditorContext),
    Story(StoryId),
}

struct Identified {
    root: PathBuf,
    item: WorkItem,
    language: Option<String>,
    mode: ContinuationMode,
}

struct Plan {
    root: PathBuf,
    item: WorkItem,
    config: &'static LanguageConfig,
    framework: TestFramework,
    symbols: Vec<Symbol>,
}

struct Outputs {
    test: PathBuf,
    production: Option<PathBuf>,
}

struct Resolved {
    plan: Plan,
    mode: ContinuationMode,
}

struct Probed {
    plan: Plan,
    mode: ContinuationMode,
    outputs: Outputs,
    decisions: Vec<FileConflict>,
}

struct Assembled {
    plan: Plan,
    outputs: Outputs,
    decisions: Vec<FileConflict>,
    continuation: Option<ContinuationContext>,
}

struct Generated {
    plan: Plan,
    decisions: Vec<FileConflict>,
    continuation: Option<ContinuationContext>,
    result: GenerationResult,
}

enum State {
    IdentifyTarget(RunTarget),
    ResolveLanguage(Identified),
    ProbeConflicts(Resolved),
    AssembleContinuation(Probed),
    Generate(Assembled),
    Write(Generated),
    Notify(RunReport),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            Self::IdentifyTarget(_) => Stage::IdentifyTarget,
            Self::ResolveLanguage(_) => Stage::ResolveLanguage,
            Self::ProbeConflicts(_) => Stage::ProbeConflicts,
            Self::AssembleContinuation(_) => Stage::AssembleContinuation,
            Self::Generate(_) => Stage::Generate,
            Self::Write(_) => Stage::Write,
            Self::Notify(_) => Stage::Notify,
        }
    }
}

enum Transition {
    Next(State),
    Cancelled,
    Done(RunReport),
}

/// Per-run bookkeeping, dropped (and the lock released) when the run ends
#[derive(Default)]
struct RunLog {
    notices: Vec<Notice>,
    _lock: Option<RunLock>,
}

pub struct Orchestrator {
    extractor: Arc<dyn SymbolExtractor>,
    detector: Arc<dyn ContextDetector>,
    generator: Arc<dyn GenerationService>,
    tracker: Option<Arc<dyn IssueTracker>>,
    writer: Arc<dyn FileWriter>,
    interaction: Arc<dyn Interaction>,
    lock_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn SymbolExtractor>,
        detector: Arc<dyn ContextDetector>,
        generator: Arc<dyn GenerationService>,
        writer: Arc<dyn FileWriter>,
        interaction: Arc<dyn Interaction>,
    ) -> Self {
        Self {
            extractor,
            detector,
            generator,
            tracker: None,
            writer,
            interaction,
            lock_dir: RunLock::default_dir(),
        }
    }

    pub fn with_tracker(mut self, tracker: Option<Arc<dyn IssueTracker>>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    pub async fn run(&self, target: RunTarget) -> TestGenieResult<RunOutcome> {
        let mut log = RunLog::default();
        let mut state = State::IdentifyTarget(target);

        loop {
            let stage = state.stage();
            self.interaction.progress(stage.progress(), stage.message());
            tracing::debug!("Entering stage {:?}", stage);

            let transition = match state {
                State::IdentifyTarget(target) => self.identify_target(target, &mut log)?,
                State::ResolveLanguage(identified) => {
                    self.resolve_language(identified, &mut log)?
                }
                State::ProbeConflicts(resolved) => self.probe_conflicts(resolved)?,
                State::AssembleContinuation(probed) => {
                    self.assemble_continuation(probed, &mut log)?
                }
                State::Generate(assembled) => self.generate(assembled).await?,
                State::Write(generated) => self.write_outputs(generated, &mut log)?,
                State::Notify(report) => self.finish(report, &mut log),
            };

            match transition {
                Transition::Next(next) => state = next,
                Transition::Cancelled => {
                    tracing::info!("Run cancelled at {:?}", stage);
                    self.interaction.notify(&Notice::info("Generation cancelled."));
                    return Ok(RunOutcome::Cancelled { stage });
                }
                Transition::Done(report) => return Ok(RunOutcome::Completed(report)),
            }
        }
    }

    fn notify(&self, log: &mut RunLog, notice: Notice) {
        self.interaction.notify(&notice);
        log.notices.push(notice);
    }

    fn prompt_story_id(&self, prompt: &str, placeholder: &str) -> TestGenieResult<Option<StoryId>> {
        let validator = |input: &str| StoryId::validate(input);
        match self.interaction.text_input(prompt, placeholder, &validator) {
            Some(input) => input
                .parse()
                .map(Some)
                .map_err(TestGenieError::Validation),
            None => Ok(None),
        }
    }

    fn identify_target(&self, target: RunTarget, log: &mut RunLog) -> TestGenieResult<Transition> {
        match target {
            RunTarget::Source {
                file,
                root,
                language,
            } => {
                let context = capture_editor_context(&file, root.as_deref(), language.as_deref())?;
                log._lock = Some(RunLock::acquire_in(&self.lock_dir, &context.project_root)?);

                Ok(Transition::Next(State::ResolveLanguage(Identified {
                    root: context.project_root.clone(),
                    item: WorkItem::Source(context),
                    language: None,
                    mode: ContinuationMode::New,
                })))
            }
            RunTarget::Story {
                id,
                root,
                language,
                continuation,
            } => {
                if self.tracker.is_none() {
                    return Err(TestGenieError::Precondition(
                        "Jira credentials not configured. Set tracker.url, tracker.email and tracker.token."
                            .to_string(),
                    ));
                }

                let root = resolve_workspace_root(root.as_deref())?;
                log._lock = Some(RunLock::acquire_in(&self.lock_dir, &root)?);

                let id = match id {
                    Some(id) => id,
                    None => match self.prompt_story_id("Enter Jira Story ID", "e.g. PROJ-123")? {
                        Some(id) => id,
                        None => return Ok(Transition::Cancelled),
                    },
                };

                Ok(Transition::Next(State::ResolveLanguage(Identified {
                    root,
                    item: WorkItem::Story(id),
                    language,
                    mode: continuation,
                })))
            }
        }
    }

    fn resolve_language(&self, identified: Identified, log: &mut RunLog) -> TestGenieResult<Transition> {
        let Identified {
            root,
            item,
            language,
            mode,
        } = identified;

        let (config, symbols) = match &item {
            WorkItem::Source(context) => {
                let extraction = self
                    .extractor
                    .extract(&context.language_id, &context.file_content)?;
                if extraction.partial {
                    self.notify(
                        log,
                        Notice::warning(format!(
                            "{} has syntax errors; some symbols may be missing.",
                            context.file_name
                        )),
                    );
                }
                self.notify(
                    log,
                    Notice::info(format!(
                        "Found {} in {}.",
                        Symbol::summary(&extraction.symbols),
                        context.file_name
                    )),
                );
                (extraction.config, extraction.symbols)
            }
            WorkItem::Story(_) => match self.story_language(&root, language.as_deref(), log)? {
                Some(lang) => (lang.config(), Vec::new()),
                None => return Ok(Transition::Cancelled),
            },
        };

        let framework = resolve_framework(&root, config);
        tracing::debug!(
            "Resolved {} with {} ({} symbols)",
            config.language,
            framework.name,
            symbols.len()
        );

        Ok(Transition::Next(State::ProbeConflicts(Resolved {
            plan: Plan {
                root,
                item,
                config,
                framework,
                symbols,
            },
            mode,
        })))
    }

    /// Explicit choice, then detection, then asking
    fn story_language(
        &self,
        root: &Path,
        explicit: Option<&str>,
        log: &mut RunLog,
    ) -> TestGenieResult<Option<Language>> {
        if let Some(id) = explicit {
            return get_config(id)
                .map(|c| Some(c.language))
                .ok_or_else(|| TestGenieError::unsupported_language(id));
        }

        if let Some(lang) = self.detector.detect_project_language(root) {
            self.notify(
                log,
                Notice::info(format!(
                    "Detected existing {} project, continuing in {}.",
                    lang.label(),
                    lang.label()
                )),
            );
            return Ok(Some(lang));
        }

        let options: Vec<PickOption> = Language::ALL
            .iter()
            .map(|l| PickOption::new(l.label(), l.config().test_framework))
            .collect();

        Ok(self
            .interaction
            .pick_one("Select language for code generation", &options)
            .and_then(|i| Language::ALL.get(i).copied()))
    }

    fn probe_conflicts(&self, resolved: Resolved) -> TestGenieResult<Transition> {
        let Resolved { plan, mode } = resolved;

        let outputs = match &plan.item {
            WorkItem::Source(context) => Outputs {
                test: derive_path(&context.file_path, plan.config),
                production: None,
            },
            WorkItem::Story(id) => {
                let (test, production) = story_paths(&plan.root, id, plan.config.language);
                Outputs {
                    test,
                    production: Some(production),
                }
            }
        };

        let existing: Vec<PathBuf> = std::iter::once(&outputs.test)
            .chain(outputs.production.as_ref())
            .filter(|p| p.exists())
            .cloned()
            .collect();

        if existing.is_empty() {
            return Ok(Transition::Next(State::AssembleContinuation(Probed {
                plan,
                mode,
                outputs,
                decisions: Vec::new(),
            })));
        }

        let names = existing
            .iter()
            .map(|p| file_label(p))
            .collect::<Vec<_>>()
            .join(" and ");
        let (message, options) = match &plan.item {
            WorkItem::Source(_) => (
                format!("{} already exists. Overwrite?", names),
                ["Overwrite", "Cancel"],
            ),
            WorkItem::Story(id) => (
                format!(
                    "Files already exist for {} ({}). Do you want to replace them?",
                    id, names
                ),
                ["Yes, Replace", "No, Cancel"],
            ),
        };

        if self.interaction.confirm(&message, &options) != Some(0) {
            return Ok(Transition::Cancelled);
        }

        let decisions = existing
            .into_iter()
            .map(|path| FileConflict {
                path,
                existed: true,
                choice: ConflictChoice::Overwrite,
            })
            .collect();

        Ok(Transition::Next(State::AssembleContinuation(Probed {
            plan,
            mode,
            outputs,
            decisions,
        })))
    }

    fn assemble_continuation(&self, probed: Probed, log: &mut RunLog) -> TestGenieResult<Transition> {
        let Probed {
            plan,
            mode,
            outputs,
            decisions,
        } = probed;

        let previous = match (&plan.item, mode) {
            (WorkItem::Source(_), _) | (WorkItem::Story(_), ContinuationMode::New) => None,
            (WorkItem::Story(_), ContinuationMode::Continues(prev)) => Some(prev),
            (WorkItem::Story(_), ContinuationMode::Ask) => {
                let options = [
                    PickOption::new("New story", "Start fresh"),
                    PickOption::new("Continuation story", "Builds on a previous Jira ticket"),
                ];
                match self.interaction.pick_one(
                    "Is this a new story or a continuation of a previous ticket?",
                    &options,
                ) {
                    Some(0) => None,
                    Some(_) => match self.prompt_story_id(
                        "Enter the previous Jira Story ID to use as context",
                        "e.g. PROJ-122",
                    )? {
                        Some(prev) => Some(prev),
                        None => return Ok(Transition::Cancelled),
                    },
                    None => return Ok(Transition::Cancelled),
                }
            }
        };

        let continuation = previous.map(|prev| {
            let (test, production) = story_paths(&plan.root, &prev, plan.config.language);
            let context = ContinuationContext {
                previous_test_code: std::fs::read_to_string(&test).ok(),
                previous_production_code: std::fs::read_to_string(&production).ok(),
                previous_story_id: prev,
            };

            let notice = if context.has_code() {
                Notice::info(format!(
                    "Found existing code from {}, using as context for generation.",
                    context.previous_story_id
                ))
            } else {
                Notice::warning(format!(
                    "No existing files found for {}. Proceeding without context.",
                    context.previous_story_id
                ))
            };
            self.notify(log, notice);
            context
        });

        Ok(Transition::Next(State::Generate(Assembled {
            plan,
            outputs,
            decisions,
            continuation,
        })))
    }

    async fn generate(&self, assembled: Assembled) -> TestGenieResult<Transition> {
        let Assembled {
            plan,
            outputs,
            decisions,
            continuation,
        } = assembled;

        let result = match &plan.item {
            WorkItem::Source(context) => {
                let request =
                    GenerationRequest::new(context.file_content.clone(), plan.config, &plan.root)?
                        .with_framework(&plan.framework.name, &plan.framework.hints)
                        .with_symbols(plan.symbols.clone())
                        .with_source_file(context);

                let response = self.generator.generate(&request).await?;
                if response.production_code.is_some() {
                    tracing::debug!("Ignoring production code returned for a source run");
                }

                GenerationResult {
                    test_file_path: outputs.test,
                    production_file_path: None,
                    test_code: response.test_code,
                    production_code: None,
                    requirements_count: None,
                    story_title: None,
                }
            }
            WorkItem::Story(id) => {
                let tracker = self.tracker.as_ref().ok_or_else(|| {
                    TestGenieError::Precondition("Jira credentials not configured.".to_string())
                })?;
                let story = tracker.fetch_story(id).await?;
                let requirements = story.requirements();
                tracing::info!("Story {} has {} requirements", id, requirements.len());

                let story_ref = StoryRef {
                    id: id.clone(),
                    title: story.title.clone(),
                    requirement_count: requirements.len(),
                };
                let request = GenerationRequest::new(
                    format_requirements(&requirements),
                    plan.config,
                    &plan.root,
                )?
                .with_framework(&plan.framework.name, &plan.framework.hints)
                .with_story(story_ref)
                .with_continuation(continuation.clone());

                let response = self.generator.generate(&request).await?;
                let production_file_path = response
                    .production_code
                    .as_ref()
                    .and(outputs.production);

                GenerationResult {
                    test_file_path: outputs.test,
                    production_file_path,
                    test_code: response.test_code,
                    production_code: response.production_code,
                    requirements_count: response.requirement_count.or(Some(requirements.len())),
                    story_title: response.title.or(Some(story.title)),
                }
            }
        };

        Ok(Transition::Next(State::Write(Generated {
            plan,
            decisions,
            continuation,
            result,
        })))
    }

    /// Write one output, re-asking if the path appeared after the probe
    fn write_one(
        &self,
        path: &Path,
        content: &str,
        decisions: &[FileConflict],
        log: &mut RunLog,
    ) -> TestGenieResult<bool> {
        let decision = decisions.iter().find(|d| d.path == path);
        match self.writer.write(path, content, decision)? {
            WriteOutcome::Written(_) => return Ok(true),
            WriteOutcome::Conflict(_) => {}
        }

        let message = format!("{} already exists. Overwrite?", file_label(path));
        if self.interaction.confirm(&message, &["Overwrite", "Cancel"]) == Some(0) {
            let resolution = FileConflict {
                path: path.to_path_buf(),
                existed: true,
                choice: ConflictChoice::Overwrite,
            };
            if self.writer.write(path, content, Some(&resolution))?.is_written() {
                return Ok(true);
            }
        }

        self.notify(
            log,
            Notice::warning(format!(
                "Skipped {}; the existing file was left untouched.",
                file_label(path)
            )),
        );
        Ok(false)
    }

    fn write_outputs(&self, generated: Generated, log: &mut RunLog) -> TestGenieResult<Transition> {
        let Generated {
            plan,
            decisions,
            continuation,
            result,
        } = generated;

        let mut writes = vec![(result.test_file_path.clone(), result.test_code.as_str())];
        if let (Some(path), Some(code)) = (&result.production_file_path, &result.production_code) {
            writes.push((path.clone(), code.as_str()));
        }

        let mut written = Vec::new();
        let mut skipped = Vec::new();
        for (path, content) in writes {
            let existed = path.exists();
            if self.write_one(&path, content, &decisions, log)? {
                let verb = if existed { "overwritten" } else { "created" };
                self.notify(log, Notice::info(format!("{} {}.", file_label(&path), verb)));
                written.push(path);
            } else {
                skipped.push(path);
            }
        }

        let (source_file, story_id) = match plan.item {
            WorkItem::Source(context) => (Some(context.file_path), None),
            WorkItem::Story(id) => (None, Some(id)),
        };

        Ok(Transition::Next(State::Notify(RunReport {
            language: plan.config.language,
            test_framework: plan.framework.name,
            project_root: plan.root,
            source_file,
            symbols: plan.symbols,
            story_id,
            continued_from: continuation.map(|c| c.previous_story_id),
            result,
            written,
            skipped,
            notices: Vec::new(),
        })))
    }

    fn finish(&self, mut report: RunReport, log: &mut RunLog) -> Transition {
        let files = report
            .written
            .iter()
            .map(|p| file_label(p))
            .collect::<Vec<_>>()
            .join(", ");

        let mut message = match (&report.story_id, &report.source_file) {
            (Some(id), _) => format!(
                "Generated {} code for {} ({} requirements): {}",
                report.test_framework,
                id,
                report.result.requirements_count.unwrap_or_default(),
                files
            ),
            (None, Some(source)) => format!(
                "Generated {} tests for {} ({}): {}",
                report.test_framework,
                file_label(source),
                Symbol::summary(&report.symbols),
                files
            ),
            (None, None) => format!("Generated {}", files),
        };
        if let Some(prev) = &report.continued_from {
            message.push_str(&format!(" (continues {})", prev));
        }

        tracing::info!("{}", message);
        self.notify(log, Notice::info(message));
        report.notices = std::mem::take(&mut log.notices);
        Transition::Done(report)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
