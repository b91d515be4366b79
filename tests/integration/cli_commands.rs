use std::fs;

use canvas_sync::tooling::cli::{CliContext, Commands, ConfigCommands};
use tempfile::TempDir;

fn init() -> Commands {
    Commands::Config {
        command: ConfigCommands::Init { force: false },
    }
}

#[test]
fn config_init_writes_template_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("canvas-sync").join("config.toml");

    let cli = CliContext::new(Some(path.clone()), &init()).unwrap();
    let out = cli.execute(&init()).unwrap();
    assert!(out.contains("Wrote config template"));
    assert!(fs::read_to_string(&path).unwrap().contains("[canvas]"));

    assert!(cli.execute(&init()).is_err());
}

#[test]
fn explicit_config_drives_status_and_show() {
    let temp = TempDir::new().unwrap();
    let mirror_root = temp.path().join("systems");
    fs::create_dir_all(mirror_root.join("course-files")).unwrap();
    fs::write(mirror_root.join("course-files/a.pdf"), b"12345").unwrap();

    let path = temp.path().join("config.toml");
    fs::write(
        &path,
        format!(
            r#"
[canvas]
api_key = "canvas-secret"

[courses.7]
name = "Systems"
save_path = "{}"
"#,
            mirror_root.display()
        ),
    )
    .unwrap();

    let status = Commands::Status {
        format: "json".to_string(),
    };
    let cli = CliContext::new(Some(path.clone()), &status).unwrap();
    let out = cli.execute(&status).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["course_id"], 7);
    assert_eq!(value[0]["files"], 1);
    assert_eq!(value[0]["bytes"], 5);

    let show = Commands::Config {
        command: ConfigCommands::Show,
    };
    let shown = cli.execute(&show).unwrap();
    assert!(shown.contains("Systems"));
    assert!(!shown.contains("canvas-secret"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    assert!(CliContext::new(Some(path), &Commands::Files).is_err());
}
