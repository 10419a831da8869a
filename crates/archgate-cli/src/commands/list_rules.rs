//! List rules command implementation.

use archgate_core::Config;
use archgate_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<24} {:<8} {:<14} Description",
        "Name", "Kind", "Severity"
    );
    println!("{}", "-".repeat(90));

    for rule in all_rules(&Config::default()) {
        let descriptor = rule.descriptor();
        println!(
            "{:<24} {:<8} {:<14} {}",
            descriptor.name,
            rule.kind().to_string(),
            descriptor.default_severity.to_string(),
            descriptor.description
        );
        println!("{:<48} see {}", "", descriptor.doc_reference);
    }

    println!("\nPresets:");
    println!("  recommended  - sealed-if-leaf, layer-dependency-graph (default)");
    println!("  minimal      - layer-dependency-graph only (for gradual adoption)");

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  archgate check --rules layer-dependency-graph");
}
