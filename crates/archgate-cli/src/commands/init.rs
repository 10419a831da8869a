//! Init command implementation.

use anyhow::{bail, Result};
use archgate_rules::Preset;
use std::path::Path;

const CONFIG_FILE: &str = "archgate.toml";

const DEFAULT_CONFIG: &str = r#"# archgate configuration

# Lowest severity that fails the gate: "blocking", "advisory" or "informational"
fail_on = "blocking"

[analyzer]
# Symbol snapshot written by the compiler front end
snapshot = "build/archgate-symbols.json"
# Rules evaluated concurrently
# parallelism = 4

[index]
source_extensions = ["cs"]
exclude = ["**/obj/**", "**/bin/**"]
# Scan source text for base types the snapshot missed
text_scan = true
respect_gitignore = true

[report]
output_dir = "artifacts/archgate"
report_file = "report.json"
violations_dir = "violations"

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.sealed-if-leaf]
enabled = {sealed}
# severity = "blocking"  # Override default severity
# ignore_suffixes = ["Exception"]
# include_records = true

[rules.layer-dependency-graph]
enabled = true

# Replace the built-in layer table:
#
# [[layers]]
# name = "domain"
# suffixes = ["Domain"]
#
# [[layers]]
# name = "infrastructure"
# suffixes = ["Infrastructure", "Infra"]
#
# [layer-dependencies]
# infrastructure = ["domain"]
"#;

/// Runs the init command in the current directory.
///
/// # Errors
///
/// Returns an error if the preset is unknown, the file exists without
/// `force`, or the file cannot be written.
pub fn run(force: bool, preset: &str) -> Result<()> {
    run_in(Path::new("."), force, preset)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Point [analyzer] snapshot at your symbol snapshot");
    println!("  2. Edit {CONFIG_FILE} to configure rules");
    println!("  3. Run: archgate check");

    Ok(())
}

fn run_in(dir: &Path, force: bool, preset: &str) -> Result<()> {
    let Some(preset) = Preset::parse(preset) else {
        bail!("Unknown preset `{preset}`. Use `recommended` or `minimal`.");
    };

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, render(preset))?;
    Ok(())
}

fn render(preset: Preset) -> String {
    let sealed = matches!(preset, Preset::Recommended);
    DEFAULT_CONFIG.replace("{sealed}", &sealed.to_string())
}
