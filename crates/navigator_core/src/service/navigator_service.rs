//! Remote-backed navigator use-case service.
//!
//! # Responsibility
//! - Run domain/perspective mutations against the table store.
//! - Invalidate cached reads after every confirmed write and rebuild state
//!   from a fresh read.
//! - Queue success/failure notices for the UI.
//!
//! # Invariants
//! - State is only changed after the store confirms a write; a failed write
//!   leaves state untouched apart from the queued error notice.
//! - Validation rejections are silent: no store call, no notice.
//! - Deleting an unknown domain succeeds; updating one fails.

use crate::cache::{QueryCache, QueryKey};
use crate::model::domain::{Domain, DomainId, DomainPatch, DomainType, DomainValidationError};
use crate::model::particle::ParticleView;
use crate::model::perspective::{
    is_default_perspective, normalize_perspective_name, Perspective, DEFAULT_PERSPECTIVE,
};
use crate::repo::domain_repo::DomainRepository;
use crate::repo::perspective_repo::PerspectiveRepository;
use crate::repo::{RepoError, Table};
use crate::state::app_state::{Action, AppState, Outcome};
use crate::state::domain_registry::DomainRegistry;
use crate::state::notice::Notice;
use crate::state::{MutationKind, StateError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error surfaced to callers and mirrored as an error notice.
#[derive(Debug)]
pub enum NavigatorError {
    /// The same mutation kind is already in flight.
    Busy(MutationKind),
    DomainNotFound(DomainId),
    Validation(DomainValidationError),
    /// Store/transport failure.
    Store(RepoError),
}

impl Display for NavigatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy(kind) => write!(f, "{kind} is already in progress"),
            Self::DomainNotFound(id) => write!(f, "domain not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NavigatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NavigatorError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<StateError> for NavigatorError {
    fn from(value: StateError) -> Self {
        match value {
            StateError::Busy(kind) => Self::Busy(kind),
            StateError::DomainNotFound(id) => Self::DomainNotFound(id),
            StateError::Validation(err) => Self::Validation(err),
        }
    }
}

pub type NavigatorResult<T> = Result<T, NavigatorError>;

/// Navigator facade over domain and perspective repositories.
pub struct NavigatorService<D: DomainRepository, P: PerspectiveRepository> {
    domain_repo: D,
    perspective_repo: P,
    state: AppState,
    domain_lists: QueryCache<Vec<Domain>>,
    domain_items: QueryCache<Option<Domain>>,
    perspective_lists: QueryCache<Vec<Perspective>>,
}

impl<D: DomainRepository, P: PerspectiveRepository> NavigatorService<D, P> {
    /// Creates a service with an empty state. Call `load` before reading.
    pub fn new(domain_repo: D, perspective_repo: P) -> Self {
        Self::with_state(domain_repo, perspective_repo, AppState::new())
    }

    /// Creates a service resuming a previously captured view state.
    ///
    /// In-flight marks of the captured state are dropped; no write of this
    /// service can be running yet.
    pub fn with_state(domain_repo: D, perspective_repo: P, mut state: AppState) -> Self {
        state.clear_pending();
        Self {
            domain_repo,
            perspective_repo,
            state,
            domain_lists: QueryCache::new(),
            domain_items: QueryCache::new(),
            perspective_lists: QueryCache::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    /// Takes queued notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.state.drain_notices()
    }

    /// Number of invalidations seen for `table`.
    pub fn cache_generation(&self, table: Table) -> u64 {
        match table {
            Table::Domains => self.domain_lists.generation(table),
            Table::Perspectives => self.perspective_lists.generation(table),
            Table::Users => 0,
        }
    }

    /// Reads both lists into state, seeding the `Default` perspective row
    /// when the store lacks it.
    pub fn load(&mut self) -> NavigatorResult<()> {
        let result = self.load_lists();
        if let Err(err) = &result {
            error!("event=navigator_load module=service status=error error={err}");
            self.state
                .push_notice(Notice::error("Failed to load navigator", err.to_string()));
        }
        result
    }

    /// Routes one user action: data actions go through the store, view
    /// actions are applied to state directly.
    pub fn dispatch(&mut self, action: Action) -> NavigatorResult<Outcome> {
        match action {
            Action::SubmitDraft => self.submit_domain_draft().map(created_outcome),
            Action::AddDomain { name, kind } => self.add_domain(&name, kind).map(created_outcome),
            Action::UpdateDomain { id, patch } => {
                self.update_domain(id, &patch).map(created_outcome)
            }
            Action::ReplaceDomain(domain) => self.replace_domain(&domain).map(created_outcome),
            Action::SetParticle {
                id,
                perspective,
                key,
                value,
            } => self
                .set_particle(id, &perspective, &key, &value)
                .map(created_outcome),
            Action::RemoveDomain(id) => self.remove_domain(id).map(changed_outcome),
            Action::AddPerspective(name) => self
                .add_perspective(&name)
                .map(|created| changed_outcome(created.is_some())),
            Action::RemovePerspective(name) => {
                self.remove_perspective(&name).map(changed_outcome)
            }
            view_action => {
                let transition = self.state.apply(view_action);
                self.state = transition.state;
                Ok(transition.outcome)
            }
        }
    }

    /// Creates a domain from form input.
    ///
    /// Returns `Ok(None)` for a blank name or missing type.
    pub fn add_domain(
        &mut self,
        name: &str,
        kind: Option<DomainType>,
    ) -> NavigatorResult<Option<Domain>> {
        let Some(domain) = Domain::from_form(name, kind) else {
            debug!("event=domain_add module=service status=ignored reason=invalid_form");
            return Ok(None);
        };

        self.run_mutation(MutationKind::AddDomain, |domains, _| {
            domains.insert_domain(&domain)?;
            Ok(())
        })?;
        self.after_write(Table::Domains, MutationKind::AddDomain, &domain.name)?;

        Ok(Some(self.state.domains.get(domain.id).cloned().unwrap_or(domain)))
    }

    /// Submits the form draft held in state; clears it on success.
    pub fn submit_domain_draft(&mut self) -> NavigatorResult<Option<Domain>> {
        let draft = self.state.draft.clone();
        let created = self.add_domain(&draft.name, draft.kind)?;
        if created.is_some() {
            self.state.complete_draft();
        }
        Ok(created)
    }

    /// Merges `patch` into a stored domain.
    ///
    /// Returns `Ok(None)` when the merged record fails validation, e.g. a
    /// blank name.
    pub fn update_domain(
        &mut self,
        id: DomainId,
        patch: &DomainPatch,
    ) -> NavigatorResult<Option<Domain>> {
        let updated = self.run_mutation(MutationKind::UpdateDomain, |domains, _| {
            domains
                .update_domain(id, patch)
                .map_err(|err| not_found_as_domain(err, id))
        });
        let Some(updated) = ignore_invalid(updated)? else {
            return Ok(None);
        };
        self.after_write(Table::Domains, MutationKind::UpdateDomain, &updated.name)?;
        Ok(Some(updated))
    }

    /// Replaces a stored domain as a whole.
    ///
    /// Returns `Ok(None)` when `domain` fails validation.
    pub fn replace_domain(&mut self, domain: &Domain) -> NavigatorResult<Option<Domain>> {
        let replaced = self.run_mutation(MutationKind::UpdateDomain, |domains, _| {
            domains
                .replace_domain(domain)
                .map_err(|err| not_found_as_domain(err, domain.id))
        });
        if ignore_invalid(replaced)?.is_none() {
            return Ok(None);
        }
        self.after_write(Table::Domains, MutationKind::UpdateDomain, &domain.name)?;
        Ok(Some(domain.clone()))
    }

    /// Records one particle value under `perspective`.
    pub fn set_particle(
        &mut self,
        id: DomainId,
        perspective: &str,
        key: &str,
        value: &str,
    ) -> NavigatorResult<Option<Domain>> {
        self.update_domain(id, &DomainPatch::particle(perspective, key, value))
    }

    /// Deletes a domain. Unknown ids succeed; returns whether a row was
    /// removed.
    pub fn remove_domain(&mut self, id: DomainId) -> NavigatorResult<bool> {
        let removed = self.run_mutation(MutationKind::DeleteDomain, |domains, _| {
            Ok(domains.delete_domain(id)?)
        })?;
        if !removed {
            debug!("event=domain_delete module=service status=noop domain_id={id}");
        }
        self.after_write(Table::Domains, MutationKind::DeleteDomain, &id.to_string())?;
        Ok(removed)
    }

    /// Reads one domain through the item cache.
    pub fn get_domain(&mut self, id: DomainId) -> NavigatorResult<Option<Domain>> {
        let domain_repo = &self.domain_repo;
        let domain = self
            .domain_items
            .get_or_fetch(QueryKey::item(Table::Domains, id), || {
                domain_repo.get_domain(id)
            })?;
        Ok(domain)
    }

    /// Registers a perspective. Blank or already known names are ignored;
    /// a name the store already holds refreshes the list without a notice.
    pub fn add_perspective(&mut self, name: &str) -> NavigatorResult<Option<Perspective>> {
        let Some(name) = normalize_perspective_name(name) else {
            return Ok(None);
        };
        if self.state.perspectives.contains(&name) {
            debug!("event=perspective_add module=service status=ignored reason=duplicate");
            return Ok(None);
        }

        let created = self.run_mutation(MutationKind::AddPerspective, |_, perspectives| {
            match perspectives.insert_perspective(&name) {
                Ok(perspective) => Ok(Some(perspective)),
                Err(RepoError::Duplicate { .. }) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })?;
        if created.is_none() {
            debug!("event=perspective_add module=service status=noop reason=stored_duplicate");
            self.refresh(Table::Perspectives)?;
            return Ok(None);
        }
        self.after_write(Table::Perspectives, MutationKind::AddPerspective, &name)?;
        Ok(created)
    }

    /// Removes a perspective by name. `Default` is never removed; removing
    /// the active perspective resets the selection to `Default`.
    pub fn remove_perspective(&mut self, name: &str) -> NavigatorResult<bool> {
        let Some(name) = normalize_perspective_name(name) else {
            return Ok(false);
        };
        if is_default_perspective(&name) {
            return Ok(false);
        }
        let name = name.as_str();

        let removed = self.run_mutation(MutationKind::DeletePerspective, |_, perspectives| {
            match perspectives.find_perspective_by_name(name)? {
                Some(row) => Ok(perspectives.delete_perspective(row.id)?),
                None => Ok(false),
            }
        })?;
        self.state.perspectives.remove(name);
        self.after_write(Table::Perspectives, MutationKind::DeletePerspective, name)?;
        Ok(removed)
    }

    /// Changes the active perspective; always succeeds.
    pub fn set_active_perspective(&mut self, name: &str) {
        self.state = self
            .state
            .apply(Action::SetActivePerspective(name.to_string()))
            .state;
    }

    /// Particles of one domain under the active perspective.
    pub fn particles(&self, id: DomainId) -> Option<Vec<ParticleView>> {
        self.state.particles(id)
    }

    fn run_mutation<T>(
        &mut self,
        kind: MutationKind,
        write: impl FnOnce(&D, &P) -> NavigatorResult<T>,
    ) -> NavigatorResult<T> {
        self.state.begin_mutation(kind)?;
        let started_at = Instant::now();
        info!("event=navigator_mutation module=service status=start kind={kind}");

        let result = write(&self.domain_repo, &self.perspective_repo);
        self.state.finish_mutation(kind);

        match &result {
            Ok(_) => info!(
                "event=navigator_mutation module=service status=ok kind={kind} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(NavigatorError::Validation(err)) => debug!(
                "event=navigator_mutation module=service status=ignored kind={kind} reason={err}"
            ),
            Err(err) => {
                error!(
                    "event=navigator_mutation module=service status=error kind={kind} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                self.state
                    .push_notice(Notice::error(failure_title(kind), err.to_string()));
            }
        }
        result
    }

    fn after_write(
        &mut self,
        table: Table,
        kind: MutationKind,
        subject: &str,
    ) -> NavigatorResult<()> {
        self.refresh(table)?;
        self.state
            .push_notice(Notice::success(success_title(kind), subject.to_string()));
        Ok(())
    }

    fn refresh(&mut self, table: Table) -> NavigatorResult<()> {
        self.invalidate(table);
        if let Err(err) = self.reconcile(table) {
            error!(
                "event=navigator_refresh module=service status=error table={table} error={err}"
            );
            self.state.push_notice(Notice::error(
                format!("Failed to refresh {table}"),
                err.to_string(),
            ));
            return Err(err);
        }
        Ok(())
    }

    fn invalidate(&mut self, table: Table) {
        match table {
            Table::Domains => {
                self.domain_lists.invalidate(table);
                self.domain_items.invalidate(table);
            }
            Table::Perspectives => {
                self.perspective_lists.invalidate(table);
            }
            Table::Users => {}
        }
    }

    fn reconcile(&mut self, table: Table) -> NavigatorResult<()> {
        match table {
            Table::Domains => {
                let domain_repo = &self.domain_repo;
                let domains = self
                    .domain_lists
                    .get_or_fetch(QueryKey::list(table), || domain_repo.list_domains())?;
                self.state.domains = DomainRegistry::from_domains(domains);
            }
            Table::Perspectives => {
                let perspective_repo = &self.perspective_repo;
                let perspectives = self
                    .perspective_lists
                    .get_or_fetch(QueryKey::list(table), || {
                        perspective_repo.list_perspectives()
                    })?;
                self.state
                    .perspectives
                    .replace_names(perspectives.iter().map(|row| row.name.as_str()));
            }
            Table::Users => {}
        }
        Ok(())
    }

    fn load_lists(&mut self) -> NavigatorResult<()> {
        self.ensure_default_perspective()?;
        self.reconcile(Table::Perspectives)?;
        self.reconcile(Table::Domains)
    }

    fn ensure_default_perspective(&mut self) -> NavigatorResult<()> {
        if self
            .perspective_repo
            .find_perspective_by_name(DEFAULT_PERSPECTIVE)?
            .is_some()
        {
            return Ok(());
        }
        match self.perspective_repo.insert_perspective(DEFAULT_PERSPECTIVE) {
            Ok(_) | Err(RepoError::Duplicate { .. }) => {
                self.perspective_lists.invalidate(Table::Perspectives);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn not_found_as_domain(err: RepoError, id: DomainId) -> NavigatorError {
    match err {
        RepoError::NotFound {
            table: Table::Domains,
            ..
        } => NavigatorError::DomainNotFound(id),
        other => other.into(),
    }
}

/// Turns a validation rejection into a silent `None`.
fn ignore_invalid<T>(result: NavigatorResult<T>) -> NavigatorResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(NavigatorError::Validation(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

fn created_outcome(created: Option<Domain>) -> Outcome {
    changed_outcome(created.is_some())
}

fn changed_outcome(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}

fn success_title(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::AddDomain => "Domain added",
        MutationKind::UpdateDomain => "Domain updated",
        MutationKind::DeleteDomain => "Domain deleted",
        MutationKind::AddPerspective => "Perspective added",
        MutationKind::DeletePerspective => "Perspective deleted",
    }
}

fn failure_title(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::AddDomain => "Failed to add domain",
        MutationKind::UpdateDomain => "Failed to update domain",
        MutationKind::DeleteDomain => "Failed to delete domain",
        MutationKind::AddPerspective => "Failed to add perspective",
        MutationKind::DeletePerspective => "Failed to delete perspective",
    }
}
