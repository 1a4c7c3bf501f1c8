//! Pure formatting functions for UI output.
//!
//! Everything user-facing goes to stdout except errors and warnings, which go to stderr.

use console::style;

use crate::build_plan::BuildPlan;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a warning message in yellow.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a section header in bold.
pub fn display_header(message: &str) {
    println!("\n{}", style(message).bold());
}

/// Lines describing the configure step, logged before it runs.
pub fn format_configure_summary(plan: &BuildPlan) -> Vec<String> {
    vec![
        format!("configure env:  {}", crate::build_plan::CONFIGURE_ENV),
        format!("configure opts: {}", plan.configure_flags().join(" ")),
    ]
}

/// Lines describing a plan: source URL, one line per stage, artifact path.
pub fn format_plan(plan: &BuildPlan, download_url: &str, artifact: &str) -> Vec<String> {
    let mut lines = vec![format!("  Source:   {}", download_url)];
    lines.extend(
        plan.stages()
            .iter()
            .map(|stage| format!("  {:<9} {}", format!("{}:", stage.kind.name()), stage.command)),
    );
    lines.push(format!("  Artifact: {}", artifact));
    lines
}

/// Display a plan without running it.
///
/// # Arguments
/// * `plan` - The build plan
/// * `download_url` - Where the source tarball comes from
/// * `artifact` - Where the artifact would be written
pub fn display_plan(plan: &BuildPlan, download_url: &str, artifact: &str) {
    display_header("Build plan");
    for line in format_plan(plan, download_url, artifact) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_plan::Jobs;
    use crate::domain::RubyVersion;
    use std::path::Path;

    #[test]
    fn test_format_plan() {
        let plan = BuildPlan::new(
            Path::new("/tmp/prefix"),
            &RubyVersion::new("3.1.2").unwrap(),
            Jobs::new(4).unwrap(),
        );
        let lines = format_plan(&plan, "https://example.test/ruby.tar.gz", "/out/ruby.tgz");

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  Source:   https://example.test/ruby.tar.gz");
        assert!(lines[1].starts_with("  configure: debugflags=\"-g\" ./configure"));
        assert_eq!(lines[2], "  make:     make -j4");
        assert_eq!(lines[3], "  make install: make install");
        assert_eq!(lines[4], "  Artifact: /out/ruby.tgz");
    }

    #[test]
    fn test_format_configure_summary() {
        let plan = BuildPlan::new(
            Path::new("/tmp/prefix"),
            &RubyVersion::new("3.1.2").unwrap(),
            Jobs::new(2).unwrap(),
        );
        let summary = format_configure_summary(&plan);
        assert_eq!(summary[0], "configure env:  debugflags=\"-g\"");
        assert_eq!(
            summary[1],
            "configure opts: --disable-install-doc --prefix /tmp/prefix --enable-load-relative --enable-shared"
        );
    }
}
