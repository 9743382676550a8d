//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `navigator_core` linkage and run one create/view/delete pass
//!   against an in-memory store.
//! - Keep output deterministic apart from generated ids.

use navigator_core::db::open_db_in_memory;
use navigator_core::{
    init_logging_from_config, DomainType, NavigatorConfig, NavigatorService,
    SqliteDomainRepository, SqlitePerspectiveRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("navigator_core ping={}", navigator_core::ping());
    println!("navigator_core version={}", navigator_core::core_version());

    let config = NavigatorConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    match smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let mut service = NavigatorService::new(
        SqliteDomainRepository::try_new(&conn)?,
        SqlitePerspectiveRepository::try_new(&conn)?,
    );
    service.load()?;

    let Some(domain) = service.add_domain("ExampleCo", Some(DomainType::Exchange))? else {
        return Err("domain form was rejected".into());
    };
    service.set_active_perspective("Default");
    let particles = service.particles(domain.id).unwrap_or_default();
    let keys = particles
        .iter()
        .map(|particle| particle.key.as_str())
        .collect::<Vec<_>>();
    println!("domain={} type={} particles={}", domain.name, domain.kind, keys.join(","));

    service.remove_domain(domain.id)?;
    println!("domains_after_delete={}", service.state().domains.len());
    for notice in service.drain_notices() {
        println!("notice level={:?} title={}", notice.level, notice.title);
    }
    Ok(())
}
