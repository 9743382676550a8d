//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose navigator use-cases to Dart via FRB.
//! - Flatten core results into response envelopes the UI turns into toasts.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the configured store, loads lists, runs one use-case
//!   and drops the connection.
//! - Validation rejections return `ok=true` with `changed=false`.

use navigator_core::db::open_db;
use navigator_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppState, DomainId, DomainPatch, DomainType, NavigatorConfig, NavigatorService, Notice,
    ParticleSource, SqliteDomainRepository, SqlitePerspectiveRepository,
};
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const NOTHING_TO_CHANGE: &str = "Nothing to change.";
static NAVIGATOR_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the table store file for this process.
///
/// # FFI contract
/// - Must be called before the first store-backed call to take effect.
/// - Calling again with the same path is a no-op.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = NAVIGATOR_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// One displayable particle row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleItem {
    pub key: String,
    pub value: String,
    /// `true` when the value is a type-default placeholder.
    pub is_placeholder: bool,
}

/// Domain row with particles resolved for the requested perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainItem {
    pub domain_id: String,
    pub name: String,
    /// `Trust|Knowledge|Tools|Exchange`.
    pub kind: String,
    pub description: Option<String>,
    pub particles: Vec<ParticleItem>,
}

/// Full view snapshot for one active perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorSnapshot {
    pub ok: bool,
    pub domains: Vec<DomainItem>,
    pub perspectives: Vec<String>,
    pub active_perspective: String,
    /// `N/A` when the active perspective is not registered.
    pub active_label: String,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorResponse {
    /// `false` when the call failed; the reason is in `message`.
    pub ok: bool,
    /// Whether the store was changed.
    pub changed: bool,
    /// Affected domain id, when there is one.
    pub domain_id: Option<String>,
    /// Active perspective after the call.
    pub active_perspective: String,
    /// Human-readable notice text for the UI.
    pub message: String,
}

/// Lists domain types selectable in the creation form.
#[flutter_rust_bridge::frb(sync)]
pub fn domain_types() -> Vec<String> {
    DomainType::ALL
        .iter()
        .map(|kind| kind.label().to_string())
        .collect()
}

/// Reads every domain and perspective, resolving particles under
/// `active_perspective`.
#[flutter_rust_bridge::frb(sync)]
pub fn navigator_snapshot(active_perspective: String) -> NavigatorSnapshot {
    match with_navigator(&active_perspective, |_| Ok(())) {
        Ok((state, ())) => NavigatorSnapshot {
            ok: true,
            domains: to_domain_items(&state),
            perspectives: state.perspectives.names().to_vec(),
            active_perspective: state.perspectives.active().to_string(),
            active_label: state.perspectives.active_label().to_string(),
            message: if state.domains.is_empty() {
                "No domains defined yet.".to_string()
            } else {
                format!("Loaded {} domain(s).", state.domains.len())
            },
        },
        Err(message) => NavigatorSnapshot {
            ok: false,
            domains: Vec::new(),
            perspectives: Vec::new(),
            active_perspective,
            active_label: String::new(),
            message: format!("navigator_snapshot failed: {message}"),
        },
    }
}

/// Creates a domain from the creation form.
///
/// Blank `name` or an unknown/empty `kind` is ignored (`changed=false`).
#[flutter_rust_bridge::frb(sync)]
pub fn domain_add(name: String, kind: String) -> NavigatorResponse {
    let kind = DomainType::parse(&kind);
    respond(
        "domain_add",
        "",
        with_navigator("", |service| service.add_domain(&name, kind)),
        |created| (created.is_some(), created.map(|domain| domain.id)),
    )
}

/// Renames a domain and/or replaces its description.
///
/// A blank `name` is ignored; `description = Some("")` clears the
/// description.
#[flutter_rust_bridge::frb(sync)]
pub fn domain_update(
    domain_id: String,
    name: Option<String>,
    description: Option<String>,
) -> NavigatorResponse {
    let id = match parse_domain_id(&domain_id) {
        Ok(id) => id,
        Err(message) => return NavigatorResponse::failure("", message),
    };
    let patch = DomainPatch {
        name: name.filter(|value| !value.trim().is_empty()),
        description: description.map(|value| {
            let trimmed = value.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
        ..DomainPatch::default()
    };
    respond(
        "domain_update",
        "",
        with_navigator("", |service| service.update_domain(id, &patch)),
        |updated| (updated.is_some(), Some(id)),
    )
}

/// Deletes a domain. Unknown ids succeed with `changed=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn domain_delete(domain_id: String) -> NavigatorResponse {
    let id = match parse_domain_id(&domain_id) {
        Ok(id) => id,
        Err(message) => return NavigatorResponse::failure("", message),
    };
    respond(
        "domain_delete",
        "",
        with_navigator("", |service| service.remove_domain(id)),
        |removed| (removed, Some(id)),
    )
}

/// Records one particle value for a domain under `perspective`.
///
/// A blank key or perspective is ignored (`changed=false`).
#[flutter_rust_bridge::frb(sync)]
pub fn particle_set(
    domain_id: String,
    perspective: String,
    key: String,
    value: String,
) -> NavigatorResponse {
    let id = match parse_domain_id(&domain_id) {
        Ok(id) => id,
        Err(message) => return NavigatorResponse::failure(&perspective, message),
    };
    if key.trim().is_empty() || perspective.trim().is_empty() {
        return NavigatorResponse {
            ok: true,
            changed: false,
            domain_id: Some(id.to_string()),
            active_perspective: perspective,
            message: NOTHING_TO_CHANGE.to_string(),
        };
    }
    respond(
        "particle_set",
        &perspective,
        with_navigator(&perspective, |service| {
            service.set_particle(id, &perspective, key.trim(), &value)
        }),
        |updated| (updated.is_some(), Some(id)),
    )
}

/// Registers a perspective. Blank or existing names are ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn perspective_add(name: String) -> NavigatorResponse {
    respond(
        "perspective_add",
        "",
        with_navigator("", |service| service.add_perspective(&name)),
        |created| (created.is_some(), None),
    )
}

/// Removes a perspective; `Default` is never removed.
///
/// The response carries the active perspective to use afterwards, which is
/// `Default` when the removed one was active.
#[flutter_rust_bridge::frb(sync)]
pub fn perspective_delete(name: String, active_perspective: String) -> NavigatorResponse {
    respond(
        "perspective_delete",
        &active_perspective,
        with_navigator(&active_perspective, |service| service.remove_perspective(&name)),
        |removed| (removed, None),
    )
}

impl NavigatorResponse {
    fn failure(active_perspective: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            domain_id: None,
            active_perspective: active_perspective.to_string(),
            message: message.into(),
        }
    }
}

type NavigatorOutput<T> = Result<(AppState, T), String>;

fn respond<T>(
    operation: &str,
    active_perspective: &str,
    output: NavigatorOutput<T>,
    summarize: impl FnOnce(T) -> (bool, Option<DomainId>),
) -> NavigatorResponse {
    match output {
        Ok((mut state, value)) => {
            let (changed, domain_id) = summarize(value);
            let message = notice_message(state.drain_notices())
                .unwrap_or_else(|| NOTHING_TO_CHANGE.to_string());
            NavigatorResponse {
                ok: true,
                changed,
                domain_id: domain_id.map(|id| id.to_string()),
                active_perspective: state.perspectives.active().to_string(),
                message,
            }
        }
        Err(message) => {
            log::warn!("event=ffi_call module=ffi status=error operation={operation}");
            NavigatorResponse::failure(active_perspective, format!("{operation} failed: {message}"))
        }
    }
}

fn with_navigator<T>(
    active_perspective: &str,
    f: impl FnOnce(
        &mut NavigatorService<SqliteDomainRepository<'_>, SqlitePerspectiveRepository<'_>>,
    ) -> navigator_core::NavigatorResult<T>,
) -> NavigatorOutput<T> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("navigator DB open failed: {err}"))?;
    let domains = SqliteDomainRepository::try_new(&conn)
        .map_err(|err| format!("domain repo init failed: {err}"))?;
    let perspectives = SqlitePerspectiveRepository::try_new(&conn)
        .map_err(|err| format!("perspective repo init failed: {err}"))?;

    let mut service = NavigatorService::new(domains, perspectives);
    service.load().map_err(|err| err.to_string())?;
    if !active_perspective.trim().is_empty() {
        service.set_active_perspective(active_perspective.trim());
    }
    let value = f(&mut service).map_err(|err| err.to_string())?;
    Ok((service.into_state(), value))
}

fn resolve_db_path() -> PathBuf {
    NAVIGATOR_DB_PATH
        .get_or_init(|| NavigatorConfig::from_env().db_path)
        .clone()
}

fn parse_domain_id(raw: &str) -> Result<DomainId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid domain id `{}`", raw.trim()))
}

fn notice_message(notices: Vec<Notice>) -> Option<String> {
    notices
        .last()
        .map(|notice| format!("{}: {}", notice.title, notice.message))
}

fn to_domain_items(state: &AppState) -> Vec<DomainItem> {
    state
        .domains
        .list()
        .iter()
        .map(|domain| DomainItem {
            domain_id: domain.id.to_string(),
            name: domain.name.clone(),
            kind: domain.kind.label().to_string(),
            description: domain.description.clone(),
            particles: state
                .particles(domain.id)
                .unwrap_or_default()
                .into_iter()
                .map(|particle| ParticleItem {
                    key: particle.key,
                    value: particle.value,
                    is_placeholder: particle.source == ParticleSource::TypeDefault,
                })
                .collect(),
        })
        .collect()
}
