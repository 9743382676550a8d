use navigator_core::db::open_db_in_memory;
use navigator_core::{
    Action, AppState, Domain, DomainId, DomainPatch, DomainRepository, DomainType, MutationKind,
    NavigatorError, NavigatorService, NoticeLevel, Outcome, ParticleSource, RepoError, RepoResult,
    SqliteDomainRepository, SqlitePerspectiveRepository, Table, PARTICLE_PLACEHOLDER,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::rc::Rc;
use uuid::Uuid;

type SqliteNavigator<'conn> =
    NavigatorService<SqliteDomainRepository<'conn>, SqlitePerspectiveRepository<'conn>>;

fn navigator(conn: &Connection) -> SqliteNavigator<'_> {
    let mut service = NavigatorService::new(
        SqliteDomainRepository::try_new(conn).expect("domain repo should accept migrated db"),
        SqlitePerspectiveRepository::try_new(conn)
            .expect("perspective repo should accept migrated db"),
    );
    service.load().expect("initial load should succeed");
    service
}

fn memory_db() -> Connection {
    open_db_in_memory().expect("in-memory db should open")
}

fn acme(service: &mut SqliteNavigator<'_>, kind: DomainType) -> Domain {
    service
        .add_domain("Acme", Some(kind))
        .expect("add should reach the store")
        .expect("valid form should create a domain")
}

#[test]
fn end_to_end_create_view_and_delete_domain() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    let domain = service
        .add_domain("ExampleCo", Some(DomainType::Exchange))
        .expect("add should reach the store")
        .expect("valid form should create a domain");
    service.set_active_perspective("Default");

    let keys = service
        .particles(domain.id)
        .expect("created domain should be in state")
        .into_iter()
        .map(|particle| particle.key)
        .collect::<Vec<_>>();
    assert_eq!(keys, ["Payment Processing", "Service Listing", "Reviews"]);

    assert!(service.remove_domain(domain.id).expect("delete should succeed"));
    assert!(service.state().domains.get(domain.id).is_none());
    assert!(service.state().domains.is_empty());
}

#[test]
fn invalid_domain_form_is_silently_ignored() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    assert!(service
        .add_domain("", Some(DomainType::Trust))
        .expect("blank name is not an error")
        .is_none());
    assert!(service
        .add_domain("Acme", None)
        .expect("missing type is not an error")
        .is_none());

    assert!(service.state().domains.is_empty());
    assert!(service.drain_notices().is_empty());
    assert_eq!(service.cache_generation(Table::Domains), 0);
}

#[test]
fn blank_rename_is_silently_ignored_in_both_modes() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    let domain = acme(&mut service, DomainType::Trust);
    service.drain_notices();
    let generation = service.cache_generation(Table::Domains);

    let blank = || Action::UpdateDomain {
        id: domain.id,
        patch: DomainPatch {
            name: Some(" ".to_string()),
            ..DomainPatch::default()
        },
    };
    let local = service.state().apply(blank());
    assert_eq!(local.outcome, Outcome::Ignored);

    let remote = service.dispatch(blank()).expect("blank rename is not an error");
    assert_eq!(remote, Outcome::Ignored);
    assert!(service.drain_notices().is_empty());
    assert_eq!(service.cache_generation(Table::Domains), generation);
    assert_eq!(
        service.state().domains.get(domain.id).map(|d| d.name.as_str()),
        Some("Acme")
    );

    let mut renamed = domain.clone();
    renamed.name = String::new();
    assert_eq!(
        service.replace_domain(&renamed).expect("blank replace is not an error"),
        None
    );
    assert!(service.drain_notices().is_empty());
}

#[test]
fn created_domain_has_default_perspective_and_success_notice() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    let domain = acme(&mut service, DomainType::Trust);

    assert_eq!(service.state().domains.len(), 1);
    assert!(domain.perspectives.contains_key("Default"));
    let notices = service.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(service.cache_generation(Table::Domains), 1);
}

#[test]
fn knowledge_domain_resolves_placeholder_defaults() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    let domain = service
        .add_domain("Library", Some(DomainType::Knowledge))
        .expect("add should reach the store")
        .expect("valid form should create a domain");

    let particles = service
        .particles(domain.id)
        .expect("created domain should be in state");
    let keys = particles.iter().map(|p| p.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, ["Learning Path", "Webinar", "Information Sharing"]);
    assert!(particles
        .iter()
        .all(|p| p.value == PARTICLE_PLACEHOLDER && p.source == ParticleSource::TypeDefault));
}

#[test]
fn particle_edits_persist_and_reload() {
    let conn = memory_db();
    let domain_id = {
        let mut service = navigator(&conn);
        let domain = acme(&mut service, DomainType::Tools);
        service.add_perspective("Ops").expect("perspective insert");
        service
            .set_particle(domain.id, "Ops", "Timeline", "Q3")
            .expect("particle write");
        service
            .set_particle(domain.id, "Ops", "Resource Allocation", "2 FTE")
            .expect("particle write");
        domain.id
    };

    let mut reloaded = navigator(&conn);
    reloaded.set_active_perspective("Ops");
    let particles = reloaded
        .particles(domain_id)
        .expect("reloaded state should hold the domain");
    assert_eq!(particles.len(), 2);
    assert!(particles.iter().all(|p| p.source == ParticleSource::Recorded));
    assert_eq!(reloaded.state().perspectives.names(), ["Default", "Ops"]);
}

#[test]
fn update_unknown_domain_fails_with_error_notice() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    let missing = Uuid::new_v4();

    let err = service
        .update_domain(missing, &DomainPatch::particle("Default", "Trust Score", "1"))
        .expect_err("unknown id should fail");
    assert!(matches!(err, NavigatorError::DomainNotFound(id) if id == missing));

    let notices = service.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("domain not found"));
}

#[test]
fn removing_unknown_domain_is_idempotent_success() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    assert!(!service
        .remove_domain(Uuid::new_v4())
        .expect("unknown id delete should succeed"));
}

#[test]
fn perspective_rules_hold_against_the_store() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    assert!(service.add_perspective("Ops").expect("insert").is_some());
    assert!(service.add_perspective("Ops").expect("duplicate").is_none());
    assert!(service.add_perspective("  ").expect("blank").is_none());
    assert_eq!(service.state().perspectives.names(), ["Default", "Ops"]);

    assert!(!service.remove_perspective("Default").expect("default removal"));
    assert_eq!(service.state().perspectives.names(), ["Default", "Ops"]);

    service.set_active_perspective("Ops");
    assert!(service.remove_perspective("Ops").expect("delete"));
    assert_eq!(service.state().perspectives.active(), "Default");
    assert_eq!(service.state().perspectives.names(), ["Default"]);
}

#[test]
fn perspective_already_in_store_refreshes_without_notice() {
    let conn = memory_db();
    let mut stale = navigator(&conn);
    let mut fresh = navigator(&conn);

    assert!(fresh.add_perspective("Ops").expect("insert").is_some());
    stale.drain_notices();

    assert!(stale
        .add_perspective("Ops")
        .expect("stored duplicate is not an error")
        .is_none());
    assert!(stale.drain_notices().is_empty());
    assert_eq!(stale.state().perspectives.names(), ["Default", "Ops"]);
}

#[test]
fn perspective_names_are_trimmed_on_remove() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    service.add_perspective(" Ops ").expect("insert");
    assert_eq!(service.state().perspectives.names(), ["Default", "Ops"]);

    assert!(service.remove_perspective(" Ops ").expect("delete"));
    assert_eq!(service.state().perspectives.names(), ["Default"]);
    assert!(!service.remove_perspective("  ").expect("blank"));
}

#[test]
fn resumed_state_does_not_carry_in_flight_marks() {
    let conn = memory_db();
    let mut snapshot = AppState::new();
    snapshot
        .begin_mutation(MutationKind::AddDomain)
        .expect("first mark");
    let restored = AppState::from_json(&snapshot.to_json().expect("serialize"))
        .expect("deserialize");
    assert!(!restored.is_pending(MutationKind::AddDomain));

    let mut service = NavigatorService::with_state(
        SqliteDomainRepository::try_new(&conn).expect("domain repo"),
        SqlitePerspectiveRepository::try_new(&conn).expect("perspective repo"),
        snapshot,
    );
    service.load().expect("load");
    assert!(!service.state().is_pending(MutationKind::AddDomain));
    acme(&mut service, DomainType::Trust);
    acme(&mut service, DomainType::Tools);
    assert_eq!(service.state().domains.len(), 2);
}

#[test]
fn unknown_active_perspective_renders_not_available() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    service.set_active_perspective("Ghost");
    assert_eq!(service.state().perspectives.active_label(), "N/A");
}

#[test]
fn dispatch_routes_draft_submission_through_store() {
    let conn = memory_db();
    let mut service = navigator(&conn);

    service.dispatch(Action::BeginAddDomain).expect("view action");
    service
        .dispatch(Action::EditDraftName("Acme".to_string()))
        .expect("view action");
    assert_eq!(
        service.dispatch(Action::SubmitDraft).expect("incomplete draft"),
        Outcome::Ignored
    );
    assert!(service.state().is_adding_domain);

    service
        .dispatch(Action::EditDraftType(Some(DomainType::Trust)))
        .expect("view action");
    assert_eq!(
        service.dispatch(Action::SubmitDraft).expect("complete draft"),
        Outcome::Applied
    );
    assert!(!service.state().is_adding_domain);

    let stored = SqliteDomainRepository::try_new(&conn)
        .expect("domain repo")
        .list_domains()
        .expect("list domains");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Acme");
}

#[test]
fn get_domain_reads_through_item_cache() {
    let conn = memory_db();
    let mut service = navigator(&conn);
    let domain = acme(&mut service, DomainType::Trust);

    assert_eq!(
        service.get_domain(domain.id).expect("first read"),
        Some(domain.clone())
    );
    conn.execute("DELETE FROM domains;", [])
        .expect("direct delete should succeed");
    assert_eq!(
        service.get_domain(domain.id).expect("cached read"),
        Some(domain.clone()),
        "second read must be served from cache"
    );

    service.remove_domain(domain.id).expect("delete");
    assert_eq!(service.get_domain(domain.id).expect("fresh read"), None);
}

/// Domain store that fails every write and counts list reads.
struct OfflineDomains {
    list_calls: Rc<Cell<u32>>,
}

impl DomainRepository for OfflineDomains {
    fn list_domains(&self) -> RepoResult<Vec<Domain>> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(Vec::new())
    }

    fn get_domain(&self, _id: DomainId) -> RepoResult<Option<Domain>> {
        Ok(None)
    }

    fn insert_domain(&self, _domain: &Domain) -> RepoResult<DomainId> {
        Err(RepoError::InvalidData("backend unavailable".to_string()))
    }

    fn update_domain(&self, id: DomainId, _patch: &DomainPatch) -> RepoResult<Domain> {
        Err(RepoError::not_found(Table::Domains, id))
    }

    fn replace_domain(&self, _domain: &Domain) -> RepoResult<()> {
        Err(RepoError::InvalidData("backend unavailable".to_string()))
    }

    fn delete_domain(&self, _id: DomainId) -> RepoResult<bool> {
        Err(RepoError::InvalidData("backend unavailable".to_string()))
    }
}

#[test]
fn store_failure_leaves_state_unchanged_and_reports() {
    let conn = memory_db();
    let domains = OfflineDomains {
        list_calls: Rc::new(Cell::new(0)),
    };
    let mut service =
        NavigatorService::new(domains, SqlitePerspectiveRepository::try_new(&conn).expect("repo"));
    service.load().expect("offline store still lists");
    let before = service.state().clone();

    let err = service
        .add_domain("Acme", Some(DomainType::Trust))
        .expect_err("offline insert should fail");
    assert!(matches!(err, NavigatorError::Store(_)));
    assert_eq!(service.state().domains, before.domains);

    let notices = service.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "Failed to add domain");
    assert!(notices[0].message.contains("backend unavailable"));
    assert_eq!(service.cache_generation(Table::Domains), 0);
}

#[test]
fn failed_write_does_not_invalidate_cached_list() {
    let conn = memory_db();
    let list_calls = Rc::new(Cell::new(0));
    let domains = OfflineDomains {
        list_calls: Rc::clone(&list_calls),
    };
    let mut service =
        NavigatorService::new(domains, SqlitePerspectiveRepository::try_new(&conn).expect("repo"));
    service.load().expect("first load");
    service.load().expect("cached load");
    assert_eq!(list_calls.get(), 1);

    assert!(service.remove_domain(Uuid::new_v4()).is_err());
    service.load().expect("load after failed write");
    assert_eq!(list_calls.get(), 1);
    assert!(service.state().domains.is_empty());
}
