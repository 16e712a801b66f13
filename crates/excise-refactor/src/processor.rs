//! The Safe Delete processor.
//!
//! One [`SafeDeleteProcessor::run`] walks these phases:
//!
//! 1. validate the selection and expand it into a [`DeletionSet`]
//! 2. collect usages and conflicts under a shared model lock
//! 3. with no lock held, let the [`ConfirmationGate`] decide on conflicts
//!    (the usage view may send the run back to step 2)
//! 4. let every delegate preprocess the final usage list
//! 5. execute under an exclusive model lock
//!
//! A progress ticket is passed to every search call; cancelling it from
//! another thread ends the run without mutation.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use excise_model::{
    DescriptionLocation, ElementId, ModelEditor, ProgressSource, ProgressTicket,
    SymbolPointer,
};

use crate::collector::UsageCollector;
use crate::conflicts::{usage_conflicts, Conflict};
use crate::deletion_set::DeletionSet;
use crate::error::{InvalidReason, SafeDeleteError};
use crate::executor::{execute, ExecutionReport};
use crate::gate::{ConfirmationGate, ConflictDecision, GateState, UsageViewDecision};
use crate::listener::SafeDeleteListener;
use crate::registry::DelegateRegistry;
use crate::settings::{SearchToggles, SettingsKey, SettingsStore};
use crate::usage::{dedup_usages, UsageInfo};

/// Identifier passed to listeners.
pub const REFACTORING_ID: &str = "refactoring.safeDelete";

/// Per-invocation overrides of the persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeDeleteOptions {
    /// Overrides the comments and strings toggle.
    pub search_in_comments: Option<bool>,
    /// Overrides the non-source files toggle.
    pub search_non_source: Option<bool>,
    /// Overrides whether delegates may add satellites.
    pub ask_for_accessors: Option<bool>,
    /// Ask the gate to preview non-code occurrences before an unconfirmed
    /// deletion.
    pub preview_non_code: bool,
}

impl Default for SafeDeleteOptions {
    fn default() -> Self {
        Self {
            search_in_comments: None,
            search_non_source: None,
            ask_for_accessors: None,
            preview_non_code: true,
        }
    }
}

/// Usages and conflicts found for one deletion set.
#[derive(Debug, Clone, Default)]
pub struct CollectionResult {
    /// Deduplicated usages.
    pub usages: Vec<UsageInfo>,
    /// Delegate conflicts followed by unsafe-usage conflicts.
    pub conflicts: Vec<Conflict>,
}

impl CollectionResult {
    /// Returns true if the run can proceed without confirmation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeDeleteOutcome {
    /// The deletion set was deleted.
    Deleted(ExecutionReport),
    /// The user, a delegate or the progress ticket aborted the run.
    Cancelled,
}

/// Sequences one Safe Delete over a shared code model.
pub struct SafeDeleteProcessor<M> {
    model: Arc<RwLock<M>>,
    registry: Arc<DelegateRegistry>,
    settings: SettingsStore,
    options: SafeDeleteOptions,
    listeners: Vec<Arc<dyn SafeDeleteListener>>,
    progress: ProgressSource,
    command_name: Option<String>,
}

impl<M: ModelEditor> SafeDeleteProcessor<M> {
    /// Creates a processor with default settings.
    pub fn new(model: Arc<RwLock<M>>, registry: Arc<DelegateRegistry>) -> Self {
        Self {
            model,
            registry,
            settings: SettingsStore::default(),
            options: SafeDeleteOptions::default(),
            listeners: Vec::new(),
            progress: ProgressSource::new(),
            command_name: None,
        }
    }

    /// Uses `settings` as the persisted preferences.
    #[must_use]
    pub fn with_settings(mut self, settings: SettingsStore) -> Self {
        self.settings = settings;
        self
    }

    /// Applies per-invocation overrides.
    #[must_use]
    pub fn with_options(mut self, options: SafeDeleteOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares `progress` with the caller so another thread can cancel runs.
    ///
    /// Runs begun from one source do not cancel each other; calling
    /// [`ProgressSource::cancel`] aborts every run still in flight.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSource) -> Self {
        self.progress = progress;
        self
    }

    /// Registers a lifecycle listener.
    pub fn add_listener(&mut self, listener: Arc<dyn SafeDeleteListener>) {
        self.listeners.push(listener);
    }

    /// Current preferences, including toggles written back by the last run.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Consumes the processor, returning the preferences to persist.
    #[must_use]
    pub fn into_settings(self) -> SettingsStore {
        self.settings
    }

    /// Handle for cancelling the running search from another thread.
    #[must_use]
    pub fn progress(&self) -> ProgressSource {
        self.progress.clone()
    }

    /// Rejects selections that cannot be deleted. Files are always valid;
    /// anything else must be physical and of a deletable kind.
    pub fn validate_elements(model: &M, elements: &[ElementId]) -> Result<(), SafeDeleteError> {
        for &element in elements {
            let reason = match model.kind(element) {
                None => Some(InvalidReason::Missing),
                Some(kind) if kind.is_file() => None,
                Some(_) if !model.is_physical(element) => Some(InvalidReason::NotPhysical),
                Some(_) if !model.safe_delete_available(element) => {
                    Some(InvalidReason::Unsupported)
                }
                Some(_) => None,
            };
            if let Some(reason) = reason {
                let name = if reason == InvalidReason::Missing {
                    format!("element #{}", element.0)
                } else {
                    model.description(element, DescriptionLocation::Usage)
                };
                return Err(SafeDeleteError::InvalidElement { name, reason });
            }
        }
        Ok(())
    }

    /// Expands the selection through claiming delegates. `None` means a
    /// delegate declined.
    pub fn expand(&self, model: &M, selection: &[ElementId]) -> Option<DeletionSet> {
        let mut elements = Vec::with_capacity(selection.len());
        for &element in selection {
            match self.registry.claiming(model, element) {
                Some(delegate) => {
                    let Some(found) = delegate.elements_to_search(model, element, selection) else {
                        info!(
                            element = element.0,
                            delegate = delegate.name(),
                            "delegate declined the selection"
                        );
                        return None;
                    };
                    elements.extend(found);
                }
                None => elements.push(element),
            }
        }

        let ask_user = self.ask_for_accessors();
        let mut satellites = Vec::new();
        for &element in &elements {
            if let Some(delegate) = self.registry.claiming(model, element) {
                if let Some(extra) =
                    delegate.additional_elements_to_delete(model, element, &elements, ask_user)
                {
                    satellites.extend(extra);
                }
            }
        }
        elements.extend(satellites);

        let set = DeletionSet::new(model, elements);
        debug!(
            selected = selection.len(),
            members = set.len(),
            "deletion set expanded"
        );
        Some(set)
    }

    /// Resolves the toggles for this run: options first, then the stored
    /// entry for the claiming delegate (or global), then the delegate's own
    /// defaults.
    pub fn search_toggles(&self, model: &M, set: &DeletionSet) -> (SettingsKey, SearchToggles) {
        let first = set.roots().first().copied();
        let key = first.map_or(SettingsKey::Global, |element| {
            self.registry.settings_key(model, element)
        });
        let claimed = first.and_then(|element| {
            self.registry
                .claiming(model, element)
                .map(|delegate| (delegate, element))
        });
        let mut toggles = match (self.settings.get(&key), claimed) {
            (Some(stored), _) => stored,
            (None, Some((delegate, element))) => SearchToggles {
                search_in_comments: delegate.is_to_search_in_comments(model, element),
                search_non_source: delegate.is_to_search_for_text_occurrences(model, element),
            },
            (None, None) => self.settings.global,
        };
        if let Some(value) = self.options.search_in_comments {
            toggles.search_in_comments = value;
        }
        if let Some(value) = self.options.search_non_source {
            toggles.search_non_source = value;
        }
        (key, toggles)
    }

    /// Collects usages and conflicts under the shared lock.
    ///
    /// `Ok(None)` means a delegate declined the search.
    pub fn collect(
        &self,
        set: &DeletionSet,
        toggles: SearchToggles,
        ticket: &ProgressTicket,
    ) -> Result<Option<CollectionResult>, SafeDeleteError> {
        let guard = self.model.read();
        let model: &M = &guard;

        let collector = UsageCollector::new(model, &self.registry, set, toggles, ticket);
        let Some(usages) = collector.collect()? else {
            return Ok(None);
        };

        let mut conflicts = Vec::new();
        for element in set.members() {
            if let Some(delegate) = self.registry.claiming(model, element) {
                conflicts.extend(delegate.find_conflicts(model, element, set, ticket)?);
            }
        }
        conflicts.extend(usage_conflicts(model, set, &usages));
        debug!(
            usages = usages.len(),
            conflicts = conflicts.len(),
            "collection finished"
        );
        Ok(Some(CollectionResult { usages, conflicts }))
    }

    /// Expands `selection` and collects its usages without deleting
    /// anything. `Ok(None)` means a delegate declined.
    pub fn find_usages(
        &self,
        selection: &[ElementId],
    ) -> Result<Option<(DeletionSet, CollectionResult)>, SafeDeleteError> {
        let ticket = self.progress.begin();
        let (set, toggles) = {
            let guard = self.model.read();
            Self::validate_elements(&guard, selection)?;
            let Some(set) = self.expand(&guard, selection) else {
                return Ok(None);
            };
            let (_, toggles) = self.search_toggles(&guard, &set);
            (set, toggles)
        };
        Ok(self
            .collect(&set, toggles, &ticket)?
            .map(|result| (set, result)))
    }

    /// `"Deleting <descriptions>"`, computed once per run.
    pub fn command_name(&mut self, model: &M, set: &DeletionSet) -> String {
        if let Some(name) = &self.command_name {
            return name.clone();
        }
        let descriptions: Vec<String> = set
            .members()
            .map(|element| model.description(element, DescriptionLocation::Usage))
            .collect();
        let name = format!("Deleting {}", descriptions.join(", "));
        self.command_name = Some(name.clone());
        name
    }

    /// Runs Safe Delete for `selection`.
    ///
    /// In a non-interactive gate, declined conflicts surface as
    /// [`SafeDeleteError::Conflicts`]; everywhere else an abort is
    /// [`SafeDeleteOutcome::Cancelled`].
    pub fn run(
        &mut self,
        selection: &[ElementId],
        gate: &mut dyn ConfirmationGate,
    ) -> Result<SafeDeleteOutcome, SafeDeleteError> {
        let ticket = self.progress.begin();
        self.command_name = None;
        let model = Arc::clone(&self.model);

        let (mut set, mut pointers, key, toggles) = {
            let guard = model.read();
            Self::validate_elements(&guard, selection)?;
            let Some(set) = self.expand(&guard, selection) else {
                return Ok(SafeDeleteOutcome::Cancelled);
            };
            let pointers: Vec<SymbolPointer> = set
                .members()
                .filter_map(|element| guard.pointer(element))
                .collect();
            let (key, toggles) = self.search_toggles(&guard, &set);
            (set, pointers, key, toggles)
        };
        self.settings.store(&key, toggles);
        self.settings.ask_for_accessors = self.ask_for_accessors();

        let mut state = GateState::Collecting;
        let (usages, confirmed) = loop {
            let result = match self.collect(&set, toggles, &ticket) {
                Ok(Some(result)) => result,
                Ok(None) | Err(SafeDeleteError::Cancelled) => {
                    transition(&mut state, GateState::Terminated);
                    return Ok(SafeDeleteOutcome::Cancelled);
                }
                Err(err) => return Err(err),
            };
            if result.is_clean() {
                break (result.usages, false);
            }

            transition(&mut state, GateState::ConflictsFound);
            for listener in &self.listeners {
                listener.conflicts_detected(REFACTORING_ID, &result.conflicts);
            }
            match gate.on_conflicts(&result.conflicts) {
                ConflictDecision::ProceedAnyway => {
                    transition(&mut state, GateState::ProceedAnyway);
                    break (result.usages, true);
                }
                ConflictDecision::Cancel => {
                    transition(&mut state, GateState::Cancelled);
                    transition(&mut state, GateState::Terminated);
                    if gate.is_interactive() {
                        return Ok(SafeDeleteOutcome::Cancelled);
                    }
                    return Err(SafeDeleteError::Conflicts {
                        conflicts: result.conflicts,
                        usages: result.usages,
                    });
                }
                ConflictDecision::ViewUsages => {
                    transition(&mut state, GateState::ViewUsages);
                    let lines = self.usage_lines(&result.usages);
                    match gate.view_usages(&lines) {
                        UsageViewDecision::Retry => {
                            let resolved = self.resolve_pointers(&pointers);
                            if resolved.is_empty() {
                                transition(&mut state, GateState::Terminated);
                                return Ok(SafeDeleteOutcome::Cancelled);
                            }
                            let expanded = {
                                let guard = model.read();
                                Self::validate_elements(&guard, &resolved)?;
                                self.expand(&guard, &resolved).map(|set| {
                                    let pointers: Vec<SymbolPointer> = set
                                        .members()
                                        .filter_map(|element| guard.pointer(element))
                                        .collect();
                                    (set, pointers)
                                })
                            };
                            let Some((expanded, expanded_pointers)) = expanded else {
                                transition(&mut state, GateState::Terminated);
                                return Ok(SafeDeleteOutcome::Cancelled);
                            };
                            set = expanded;
                            pointers = expanded_pointers;
                            self.command_name = None;
                            transition(&mut state, GateState::Collecting);
                        }
                        UsageViewDecision::DeleteAnyway => break (result.usages, true),
                        UsageViewDecision::Close => {
                            transition(&mut state, GateState::Terminated);
                            return Ok(SafeDeleteOutcome::Cancelled);
                        }
                    }
                }
            }
        };

        transition(&mut state, GateState::Preprocessing);
        let Some(usages) = self.preprocess(usages) else {
            transition(&mut state, GateState::Terminated);
            return Ok(SafeDeleteOutcome::Cancelled);
        };

        if !confirmed && self.options.preview_non_code {
            let non_code: Vec<UsageInfo> = usages
                .iter()
                .filter(|usage| usage.is_non_code())
                .cloned()
                .collect();
            if !non_code.is_empty() && !gate.preview_non_code(&self.usage_lines(&non_code)) {
                transition(&mut state, GateState::Terminated);
                return Ok(SafeDeleteOutcome::Cancelled);
            }
        }
        if ticket.is_cancelled() {
            transition(&mut state, GateState::Terminated);
            return Ok(SafeDeleteOutcome::Cancelled);
        }

        let mut guard = model.write();
        let name = self.command_name(&guard, &set);
        let members = set.to_vec();
        for listener in &self.listeners {
            listener.before(REFACTORING_ID, &members);
        }
        let report = execute(&mut *guard, &self.registry, &set, &usages, &name)?;
        drop(guard);

        for listener in &self.listeners {
            listener.after(REFACTORING_ID, &report);
        }
        Ok(SafeDeleteOutcome::Deleted(report))
    }

    fn ask_for_accessors(&self) -> bool {
        self.options
            .ask_for_accessors
            .unwrap_or(self.settings.ask_for_accessors)
    }

    /// Every delegate's preprocessing hook in registry order, then dedup.
    fn preprocess(&self, mut usages: Vec<UsageInfo>) -> Option<Vec<UsageInfo>> {
        let guard = self.model.read();
        for delegate in self.registry.delegates() {
            match delegate.preprocess_usages(&*guard, usages) {
                Some(next) => usages = next,
                None => {
                    info!(delegate = delegate.name(), "delegate aborted preprocessing");
                    return None;
                }
            }
        }
        Some(dedup_usages(usages))
    }

    fn usage_lines(&self, usages: &[UsageInfo]) -> Vec<String> {
        let guard = self.model.read();
        usages.iter().map(|usage| usage.describe(&*guard)).collect()
    }

    fn resolve_pointers(&self, pointers: &[SymbolPointer]) -> Vec<ElementId> {
        let guard = self.model.read();
        pointers
            .iter()
            .filter_map(|pointer| {
                let resolved = guard.resolve(pointer);
                if resolved.is_none() {
                    warn!(%pointer, "symbol no longer resolves; dropping it from the retry");
                }
                resolved
            })
            .collect()
    }
}

fn transition(state: &mut GateState, next: GateState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid safe delete transition {state:?} -> {next:?}"
    );
    debug!(from = ?state, to = ?next, "safe delete state");
    *state = next;
}
