// tests/cli_startup.rs

use std::fs;
use std::process::{Command, Output};

fn hotserve(cwd: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hotserve"))
        .current_dir(cwd)
        .env("HOTSERVE_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run hotserve")
}

const SOURCE: &str = r#"
#[derive(Default)]
pub struct Greeter;

#[hotserve::endpoint(path = "/greet")]
impl Greeter {
    #[get]
    pub fn hi(&self) -> String { "hi".to_string() }

    #[post(path = "echo")]
    pub fn echo(&self, body: String) -> String { body }
}
"#;

#[test]
fn serve_without_artifacts_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = hotserve(dir.path(), &["serve", "missing-dir", "--port", "0"]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("hotserve error"), "{stderr}");
    assert!(stderr.contains("missing-dir"), "{stderr}");
}

#[test]
fn invalid_entry_point_is_rejected_by_argument_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let out = hotserve(dir.path(), &["serve", ".", "lib/app:entry"]);
    assert!(!out.status.success());
}

#[test]
fn generate_writes_the_route_table() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), SOURCE).unwrap();

    let out = hotserve(
        dir.path(),
        &["generate", "--src", "src", "--out", "gen/routes.rs"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let generated = fs::read_to_string(dir.path().join("gen/routes.rs")).unwrap();
    assert!(generated.contains("\"/greet/echo\""));
    assert!(generated.contains("hotserve_entry"));
}

#[test]
fn routes_lists_every_route() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), SOURCE).unwrap();

    let out = hotserve(dir.path(), &["routes", "--src", "src"]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("GET  /greet"), "{stdout}");
    assert!(stdout.contains("POST /greet/echo"), "{stdout}");
    assert!(stdout.contains("crate::Greeter::echo"), "{stdout}");
}
