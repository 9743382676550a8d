use navigator_core::db::open_db_in_memory;
use navigator_core::{
    Domain, DomainPatch, DomainRepository, DomainType, PerspectiveRepository, RepoError,
    SqliteDomainRepository, SqlitePerspectiveRepository, SqliteUserRepository, Table, UserPatch,
    UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn domain_insert_and_get_roundtrip() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let mut domain = Domain::new("Acme", DomainType::Trust);
    domain.description = Some("identity provider".to_string());
    domain.set_particle("Default", "Trust Score", "97");
    let id = repo.insert_domain(&domain).expect("insert_domain should succeed");

    let loaded = repo.get_domain(id).expect("get_domain should succeed").expect("row should exist");
    assert_eq!(loaded, domain);
}

#[test]
fn domain_list_keeps_insertion_order() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let first = Domain::new("Zeta", DomainType::Tools);
    let second = Domain::new("Alpha", DomainType::Exchange);
    repo.insert_domain(&first).expect("insert_domain should succeed");
    repo.insert_domain(&second).expect("insert_domain should succeed");

    let ids = repo
        .list_domains()
        .expect("list_domains should succeed")
        .into_iter()
        .map(|domain| domain.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, [first.id, second.id]);
}

#[test]
fn domain_update_merges_particles_and_fields() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let mut domain = Domain::new("Acme", DomainType::Tools);
    domain.set_particle("Default", "Timeline", "Q3");
    repo.insert_domain(&domain).expect("insert_domain should succeed");

    let mut patch = DomainPatch::particle("Default", "Task Management", "Kanban");
    patch.description = Some(Some("internal tooling".to_string()));
    let updated = repo.update_domain(domain.id, &patch).expect("update_domain should succeed");

    let particles = updated.particles_for("Default").expect("Default particles should be recorded");
    assert_eq!(particles.len(), 2);
    assert_eq!(updated.description.as_deref(), Some("internal tooling"));
    assert_eq!(
        repo
            .get_domain(domain.id)
            .expect("get_domain should succeed")
            .expect("row should exist"),
        updated
    );
}

#[test]
fn domain_update_unknown_id_is_not_found() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let missing = Uuid::new_v4();
    let err = repo
        .update_domain(missing, &DomainPatch::default())
        .expect_err("call should fail");
    assert!(matches!(
        err,
        RepoError::NotFound { table: Table::Domains, ref id } if *id == missing.to_string()
    ));
    assert_eq!(err.to_string(), format!("domain not found: {missing}"));
}

#[test]
fn domain_update_with_blank_name_is_rejected_and_row_kept() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let domain = Domain::new("Acme", DomainType::Tools);
    repo.insert_domain(&domain).expect("insert_domain should succeed");
    let patch = DomainPatch {
        name: Some("  ".to_string()),
        ..DomainPatch::default()
    };

    let err = repo.update_domain(domain.id, &patch).expect_err("update_domain should fail");
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(
        repo
            .get_domain(domain.id)
            .expect("get_domain should succeed")
            .expect("row should exist").name,
        "Acme"
    );
}

#[test]
fn domain_replace_overwrites_every_field() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let mut domain = Domain::new("Acme", DomainType::Tools);
    domain.set_particle("Ops", "Timeline", "Q3");
    repo.insert_domain(&domain).expect("insert_domain should succeed");

    let replacement = Domain::with_id(domain.id, "Acme Labs", DomainType::Knowledge);
    repo.replace_domain(&replacement).expect("replace_domain should succeed");

    let loaded = repo
        .get_domain(domain.id)
        .expect("get_domain should succeed")
        .expect("row should exist");
    assert_eq!(loaded, replacement);
    assert!(loaded.particles_for("Ops").is_none());

    let stranger = Domain::new("Nobody", DomainType::Trust);
    assert!(matches!(
        repo.replace_domain(&stranger),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn domain_delete_is_idempotent() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let domain = Domain::new("Acme", DomainType::Trust);
    repo.insert_domain(&domain).expect("insert_domain should succeed");

    assert!(repo.delete_domain(domain.id).expect("delete_domain should succeed"));
    assert!(!repo.delete_domain(domain.id).expect("delete_domain should succeed"));
    assert!(repo.get_domain(domain.id).expect("get_domain should succeed").is_none());
}

#[test]
fn domain_insert_twice_reports_duplicate() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");

    let domain = Domain::new("Acme", DomainType::Trust);
    repo.insert_domain(&domain).expect("insert_domain should succeed");
    assert!(matches!(
        repo.insert_domain(&domain),
        Err(RepoError::Duplicate { .. })
    ));
}

#[test]
fn corrupt_particles_column_is_rejected_on_read() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");
    let domain = Domain::new("Acme", DomainType::Trust);
    repo.insert_domain(&domain).expect("insert_domain should succeed");

    conn.execute(
        "UPDATE domains SET particles = 'not json' WHERE id = ?1;",
        [domain.id.to_string()],
    )
    .expect("direct update should succeed");

    assert!(matches!(
        repo.get_domain(domain.id),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().expect("raw sqlite should open");
    assert!(matches!(
        SqliteDomainRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
    assert!(SqlitePerspectiveRepository::try_new(&conn).is_err());
    assert!(SqliteUserRepository::try_new(&conn).is_err());
}

#[test]
fn perspective_list_starts_with_default() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqlitePerspectiveRepository::try_new(&conn).expect("repo should accept migrated db");

    repo.insert_perspective("Ops").expect("insert_perspective should succeed");
    let names = repo
        .list_perspectives()
        .expect("list_perspectives should succeed")
        .into_iter()
        .map(|row| row.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["Default", "Ops"]);
}

#[test]
fn perspective_insert_rejects_blank_and_duplicate_names() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqlitePerspectiveRepository::try_new(&conn).expect("repo should accept migrated db");

    assert!(matches!(
        repo.insert_perspective("   "),
        Err(RepoError::Validation(_))
    ));
    let created = repo.insert_perspective(" Ops ").expect("insert_perspective should succeed");
    assert_eq!(created.name, "Ops");
    assert!(matches!(
        repo.insert_perspective("Ops"),
        Err(RepoError::Duplicate { .. })
    ));
    assert!(repo.insert_perspective("ops").is_ok());
}

#[test]
fn perspective_default_row_is_protected() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqlitePerspectiveRepository::try_new(&conn).expect("repo should accept migrated db");
    let default = repo
        .find_perspective_by_name("Default")
        .expect("find_perspective_by_name should succeed")
        .expect("row should exist");

    assert!(matches!(
        repo.delete_perspective(default.id),
        Err(RepoError::Protected { .. })
    ));
    assert!(matches!(
        repo.update_perspective(default.id, "Main"),
        Err(RepoError::Protected { .. })
    ));
    assert!(repo.get_perspective(default.id).expect("get_perspective should succeed").is_some());
}

#[test]
fn perspective_rename_and_delete() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let repo = SqlitePerspectiveRepository::try_new(&conn).expect("repo should accept migrated db");

    let ops = repo.insert_perspective("Ops").expect("insert_perspective should succeed");
    let renamed = repo
        .update_perspective(ops.id, "Operations")
        .expect("update_perspective should succeed");
    assert_eq!(renamed.name, "Operations");
    assert!(repo
        .find_perspective_by_name("Ops")
        .expect("find_perspective_by_name should succeed")
        .is_none());

    assert!(repo.delete_perspective(ops.id).expect("delete_perspective should succeed"));
    assert!(!repo.delete_perspective(ops.id).expect("delete_perspective should succeed"));
    assert!(matches!(
        repo.update_perspective(ops.id, "Again"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn user_crud_roundtrip() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let domains = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");
    let users = SqliteUserRepository::try_new(&conn).expect("repo should accept migrated db");

    let domain = Domain::new("Acme", DomainType::Trust);
    domains.insert_domain(&domain).expect("insert_domain should succeed");

    let id = Uuid::new_v4();
    let created = users.insert_user(id, None).expect("insert_user should succeed");
    assert_eq!(created.domain_def, None);
    assert!(created.created_at > 0);

    let updated = users
        .update_user(
            id,
            &UserPatch {
                domain_def: Some(Some(domain.id)),
            },
        )
        .expect("update_user should succeed");
    assert_eq!(updated.domain_def, Some(domain.id));
    assert_eq!(users.list_users().expect("list_users should succeed"), [updated.clone()]);

    assert!(users.delete_user(id).expect("delete_user should succeed"));
    assert!(users.get_user(id).expect("get_user should succeed").is_none());
    assert!(matches!(
        users.update_user(
            id,
            &UserPatch {
                domain_def: Some(None)
            }
        ),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn deleting_domain_clears_user_reference() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let domains = SqliteDomainRepository::try_new(&conn).expect("repo should accept migrated db");
    let users = SqliteUserRepository::try_new(&conn).expect("repo should accept migrated db");

    let domain = Domain::new("Acme", DomainType::Trust);
    domains.insert_domain(&domain).expect("insert_domain should succeed");
    let id = Uuid::new_v4();
    users.insert_user(id, Some(domain.id)).expect("insert_user should succeed");

    domains.delete_domain(domain.id).expect("delete_domain should succeed");
    assert_eq!(
        users
            .get_user(id)
            .expect("get_user should succeed")
            .expect("row should exist").domain_def,
        None
    );
}
