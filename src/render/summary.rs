//! Colored terminal summary printed after a report is written.

use colored::*;

use crate::report::ArchitectureReport;

/// Print a one-screen summary of the scan.
pub fn write_summary(report: &ArchitectureReport, output: &str) {
    let s = &report.stats;

    println!();
    print!("  ");
    print!("{}", "gdarch".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Project: ".dimmed());
    println!("{}", report.project.name);
    print!("  {}", "Path:    ".dimmed());
    println!("{}", report.root);
    println!();

    println!(
        "  {} scripts, {} scenes, {} resources, {} files",
        s.scripts.to_string().bold(),
        s.scenes.to_string().bold(),
        s.resources.to_string().bold(),
        s.total_files
    );
    println!(
        "  {} classes, {} functions, {} signals, {} autoloads",
        s.classes, s.functions, s.signals, s.autoloads
    );

    if !report.warnings.is_empty() {
        println!();
        println!("  {} ({}):", "Warnings".yellow().bold(), report.warnings.len());
        for warning in &report.warnings {
            println!("    {} {}", "WARN".yellow(), warning);
        }
    }

    let errors = report.error_count();
    if errors > 0 {
        println!();
        print!("  {}", format!("{} file(s) degraded", errors).red());
        println!(
            "  {}",
            format!(
                "({} script fallbacks, {} unreadable scenes)",
                s.parse_errors, s.unreadable_scenes
            )
            .dimmed()
        );
    }

    println!();
    print!("  {} ", "✓".green());
    print!("{}", "Written: ".dimmed());
    println!("{}", output.blue());
    println!();
}
