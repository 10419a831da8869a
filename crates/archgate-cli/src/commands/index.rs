//! Index command implementation.

use crate::config_resolver::ResolvedConfig;
use anyhow::{Context, Result};
use archgate_core::{CodeModel, GlobalIndexBuilder, IndexBuild, SnapshotModel};
use std::path::Path;

/// Runs the index command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub fn run(resolved: &ResolvedConfig, snapshot: Option<&Path>, json: bool) -> Result<()> {
    let config = &resolved.config;
    let snapshot = resolved.snapshot_path(snapshot)?;
    let model = SnapshotModel::load(&snapshot, &config.index)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

    let build = GlobalIndexBuilder::new()
        .text_scan(config.index.text_scan)
        .build(model.list_code_units());

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&build))?);
    } else {
        for name in build.index.iter() {
            println!("{name}");
        }
        println!(
            "\n{} base type name(s), {} from text scan, {} file(s) scanned",
            build.index.len(),
            build.text_only_names,
            build.files_scanned
        );
        for warning in &build.warnings {
            println!("  unreadable: {} ({})", warning.path.display(), warning.reason);
        }
    }
    Ok(())
}

fn to_json(build: &IndexBuild) -> serde_json::Value {
    serde_json::json!({
        "baseTypes": build.index.iter().collect::<Vec<_>>(),
        "filesScanned": build.files_scanned,
        "textOnlyNames": build.text_only_names,
        "warnings": build
            .warnings
            .iter()
            .map(|w| serde_json::json!({
                "path": w.path.display().to_string(),
                "reason": w.reason,
            }))
            .collect::<Vec<_>>(),
    })
}
