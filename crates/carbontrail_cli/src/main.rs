//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `carbontrail_core` linkage.
//! - Optionally summarize a project catalog JSON file, one line per project.
//! - Start engine logging at the `CARBONTRAIL_LOG` level.

use carbontrail_core::{init_logging, level_from_env, InMemoryProjectCatalog, KnownLocations};
use std::path::PathBuf;
use std::process::ExitCode;

/// Overrides the log directory; defaults to `<tmp>/carbontrail/logs`.
const LOG_DIR_ENV: &str = "CARBONTRAIL_LOG_DIR";

fn main() -> ExitCode {
    let log_dir = log_dir();
    if let Err(message) = init_logging(&level_from_env(), &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {message}");
    }

    println!("carbontrail_core ping={}", carbontrail_core::ping());
    println!("carbontrail_core version={}", carbontrail_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match summarize_catalog(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn log_dir() -> PathBuf {
    std::env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| std::env::temp_dir().join("carbontrail").join("logs"))
}

fn summarize_catalog(path: &str) -> Result<(), String> {
    let json = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let catalog = InMemoryProjectCatalog::from_json_str(&json).map_err(|err| err.to_string())?;

    for project in catalog.iter() {
        let known = KnownLocations::for_project(project);
        let roles = known
            .iter()
            .map(|(role, _)| role.as_str())
            .collect::<Vec<_>>();
        println!(
            "project id={} methodology={} events={} known_locations={}",
            project.id,
            project.methodology.as_str(),
            project.events.len(),
            if roles.is_empty() {
                "none".to_string()
            } else {
                roles.join(",")
            }
        );
    }
    Ok(())
}
