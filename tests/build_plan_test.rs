// tests/build_plan_test.rs
use std::path::Path;

use ruby_builder::build_plan::{self, BuildPlan, Jobs, StageKind};
use ruby_builder::domain::RubyVersion;
use ruby_builder::BuilderError;

fn version(s: &str) -> RubyVersion {
    RubyVersion::new(s).unwrap()
}

#[test]
fn test_full_command() {
    let command = build_plan::command(
        Path::new("iamaprefix"),
        &version("3.1.2"),
        Jobs::new(16).unwrap(),
    );
    assert_eq!(
        command,
        r#"debugflags="-g" ./configure --disable-install-doc --prefix iamaprefix --enable-load-relative --enable-shared && make -j16 && make install"#
    );
}

#[test]
fn test_yjit_iff_at_least_3_2() {
    let jobs = Jobs::new(2).unwrap();
    let cases = [
        ("3.1.4", false),
        ("3.2.0-preview3", false),
        ("3.2.0", true),
        ("3.2.2", true),
        ("3.3.0.preview2", true),
    ];

    for (input, expected) in cases {
        let command = build_plan::command(Path::new("/p"), &version(input), jobs);
        assert_eq!(command.contains("--enable-yjit"), expected, "{}", input);
    }
}

#[test]
fn test_three_stages_in_order() {
    let plan = BuildPlan::new(Path::new("/app/prefix"), &version("3.3.0"), Jobs::new(4).unwrap());

    let kinds: Vec<StageKind> = plan.stages().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![StageKind::Configure, StageKind::Make, StageKind::Install]
    );

    let command = plan.command();
    let parts: Vec<&str> = command.split(" && ").collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[0].starts_with("debugflags=\"-g\" ./configure "));
    assert!(parts[0].ends_with("--enable-yjit"));
    assert_eq!(parts[1], "make -j4");
    assert_eq!(parts[2], "make install");
}

#[test]
fn test_jobs_must_be_positive_integer() {
    assert_eq!(Jobs::parse(" 8 ").unwrap().get(), 8);
    for bad in ["0", "-1", "eight", ""] {
        assert!(
            matches!(Jobs::parse(bad), Err(BuilderError::InvalidJobs(_))),
            "{}",
            bad
        );
    }
}
