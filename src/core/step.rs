//! Step domain model

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback run in place of an external command
pub type StepCallback = Arc<dyn Fn(&Path) -> anyhow::Result<()> + Send + Sync>;

/// Hook invoked after a step's action succeeded
pub type AfterHook = Arc<dyn Fn(&Step) -> anyhow::Result<()> + Send + Sync>;

/// What a step does when it is dirty
#[derive(Clone)]
pub enum StepAction {
    /// Spawn an external program
    Command { program: String, args: Vec<String> },
    /// Invoke a supplied closure with the resolved working directory
    Callback(StepCallback),
}

impl StepAction {
    pub fn command<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StepAction::Command {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        StepAction::Callback(Arc::new(f))
    }

    /// Program name as persisted (empty for callbacks)
    pub fn program(&self) -> &str {
        match self {
            StepAction::Command { program, .. } => program,
            StepAction::Callback(_) => "",
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            StepAction::Command { args, .. } => args,
            StepAction::Callback(_) => &[],
        }
    }
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Command { program, args } => {
                f.debug_struct("Command").field("program", program).field("args", args).finish()
            }
            StepAction::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Whether a step is excluded from a run
#[derive(Clone, Default)]
pub enum SkipCondition {
    #[default]
    Never,
    Always,
    /// Evaluated lazily, right before the step would run
    When(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl SkipCondition {
    pub fn when<F>(f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        SkipCondition::When(Arc::new(f))
    }

    pub fn holds(&self) -> bool {
        match self {
            SkipCondition::Never => false,
            SkipCondition::Always => true,
            SkipCondition::When(predicate) => predicate(),
        }
    }
}

impl From<bool> for SkipCondition {
    fn from(skip: bool) -> Self {
        if skip {
            SkipCondition::Always
        } else {
            SkipCondition::Never
        }
    }
}

impl fmt::Debug for SkipCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCondition::Never => f.write_str("Never"),
            SkipCondition::Always => f.write_str("Always"),
            SkipCondition::When(_) => f.write_str("When(..)"),
        }
    }
}

/// A single named, hash-gated unit of pipeline work
#[derive(Clone)]
pub struct Step {
    /// Unique within its pipeline; merge and lookup key
    pub name: String,

    /// Directory the action runs in, relative to the pipeline root
    pub working_dir: PathBuf,

    /// File or directory whose content decides whether the step is dirty
    pub target: Option<PathBuf>,

    /// Entries excluded from the target hash on top of the ignore file
    pub ignore: Vec<String>,

    pub action: StepAction,

    /// Digest from the last successful run; empty means never evaluated
    pub sha: String,

    /// Additional attempts after the first failure
    pub retries: usize,

    /// Stream child output instead of buffering it
    pub verbose: bool,

    pub skip: SkipCondition,

    /// Prompt shown before a dirty step runs
    pub confirm: Option<String>,

    pub on_after: Option<AfterHook>,
}

impl Step {
    pub fn new(name: &str, action: StepAction) -> Self {
        Self {
            name: name.to_string(),
            working_dir: PathBuf::from("."),
            target: None,
            ignore: Vec::new(),
            action,
            sha: String::new(),
            retries: 0,
            verbose: false,
            skip: SkipCondition::Never,
            confirm: None,
            on_after: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Exclude `entries` from the target hash
    pub fn ignoring<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = sha.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn skip_if(mut self, skip: impl Into<SkipCondition>) -> Self {
        self.skip = skip.into();
        self
    }

    pub fn with_confirm(mut self, prompt: impl Into<String>) -> Self {
        self.confirm = Some(prompt.into());
        self
    }

    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Step) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_after = Some(Arc::new(hook));
        self
    }

    /// Resolve the working directory against the pipeline root
    pub fn resolved_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.working_dir)
    }

    /// Resolve the target against the pipeline root
    pub fn resolved_target(&self, root: &Path) -> Option<PathBuf> {
        self.target.as_ref().map(|t| root.join(t))
    }

    /// Whether the step has never been evaluated
    pub fn is_fresh(&self) -> bool {
        self.sha.is_empty()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("working_dir", &self.working_dir)
            .field("target", &self.target)
            .field("ignore", &self.ignore)
            .field("action", &self.action)
            .field("sha", &self.sha)
            .field("retries", &self.retries)
            .field("verbose", &self.verbose)
            .field("skip", &self.skip)
            .field("confirm", &self.confirm)
            .field("on_after", &self.on_after.as_ref().map(|_| ".."))
            .finish()
    }
}
