use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn stackship_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackship"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_plan(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("plan.yaml");
    fs::write(&path, body).expect("write plan");
    path
}

// ---------------------------------------------------------------------------
// key
// ---------------------------------------------------------------------------

#[test]
fn key_for_empty_env_file_uses_default_namespace() {
    let home = TempDir::new().expect("home");
    let file = home.path().join("foo.env");
    fs::write(&file, "").unwrap();

    stackship_cmd(home.path())
        .arg("key")
        .arg(&file)
        .args(["--category", "env-file", "--name", "foo.env"])
        .assert()
        .success()
        .stdout(format!("manual/env-files/foo.env/{EMPTY_SHA256}.env\n"));
}

#[test]
fn key_respects_configured_namespace_and_ext_override() {
    let home = TempDir::new().expect("home");
    let cfg_dir = home.path().join(".stackship");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("config.yaml"), "artifact_namespace: ci\n").unwrap();
    let file = home.path().join("template.yml");
    fs::write(&file, "").unwrap();

    stackship_cmd(home.path())
        .arg("key")
        .arg(&file)
        .args(["--category", "addons", "--name", "api", "--ext", "yaml"])
        .assert()
        .success()
        .stdout(format!("ci/addons/api/{EMPTY_SHA256}.yaml\n"));

    stackship_cmd(home.path())
        .arg("key")
        .arg(&file)
        .args(["--category", "addons", "--name", "api", "--namespace", "manual"])
        .assert()
        .success()
        .stdout(contains("manual/addons/api/"));
}

#[test]
fn key_for_missing_file_fails() {
    let home = TempDir::new().expect("home");
    stackship_cmd(home.path())
        .args(["key", "does-not-exist.env", "--category", "env-file", "--name", "x"])
        .assert()
        .failure()
        .stderr(contains("cannot read 'does-not-exist.env'"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

const VALID_PLAN: &str = r#"
app:
  name: press
environment:
  name: test
  region: us-west-2
capabilities:
  env_template_version: v1.4.0
  public_alb_certificates: ["arn:cert"]
certificates:
  "arn:cert": ["*.example.com"]
workload:
  name: api
  kind: load-balanced-web-service
  http:
    aliases:
      - name: api.example.com
"#;

#[test]
fn validate_accepts_covered_alias() {
    let home = TempDir::new().expect("home");
    let plan = write_plan(home.path(), VALID_PLAN);

    stackship_cmd(home.path())
        .arg("validate")
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("api → test").and(contains("api.example.com")));
}

#[test]
fn validate_reports_uncovered_alias() {
    let home = TempDir::new().expect("home");
    let plan = write_plan(
        home.path(),
        &VALID_PLAN.replace("api.example.com", "v1.api.example.com"),
    );

    stackship_cmd(home.path())
        .arg("validate")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(contains(
            "validate aliases against the imported public ALB certificate for env test",
        ))
        .stderr(contains("alias v1.api.example.com is not covered"));
}

#[test]
fn validate_rejects_alias_without_domain_or_certificate() {
    let home = TempDir::new().expect("home");
    let plan = write_plan(
        home.path(),
        &VALID_PLAN.replace("  public_alb_certificates: [\"arn:cert\"]\n", ""),
    );

    stackship_cmd(home.path())
        .arg("validate")
        .arg(&plan)
        .arg("--json")
        .assert()
        .failure()
        .stdout(contains(r#""valid": false"#))
        .stderr(contains(
            "cannot specify http.alias when application is not associated with a domain",
        ));
}

#[test]
fn validate_json_lists_aliases() {
    let home = TempDir::new().expect("home");
    let plan = write_plan(home.path(), VALID_PLAN);

    let output = stackship_cmd(home.path())
        .arg("validate")
        .arg(&plan)
        .arg("--json")
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["valid"], true);
    assert_eq!(report["aliases"], serde_json::json!(["api.example.com"]));
    assert!(report.get("error").is_none());
}

#[test]
fn validate_rejects_malformed_plan() {
    let home = TempDir::new().expect("home");
    let plan = write_plan(home.path(), "app: [not, a, map]\n");

    stackship_cmd(home.path())
        .arg("validate")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(contains("invalid plan"));
}

// ---------------------------------------------------------------------------
// resources / config
// ---------------------------------------------------------------------------

#[test]
fn resources_for_one_kind() {
    let home = TempDir::new().expect("home");
    stackship_cmd(home.path())
        .args(["resources", "--kind", "scheduled-job"])
        .assert()
        .success()
        .stdout(
            contains("EnvControllerFunction")
                .and(contains("custom-resources/env-controller-function.js"))
                .and(contains("DynamicDesiredCountFunction").not()),
        );
}

#[test]
fn resources_rejects_unknown_kind() {
    let home = TempDir::new().expect("home");
    stackship_cmd(home.path())
        .args(["resources", "--kind", "lambda"])
        .assert()
        .failure()
        .stderr(contains("unknown workload kind 'lambda'"));
}

#[test]
fn config_init_then_show() {
    let home = TempDir::new().expect("home");

    stackship_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("force_update_timeout_secs: 600"));
    assert!(!home.path().join(".stackship/config.yaml").exists());

    stackship_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("Wrote default config"));
    assert!(home.path().join(".stackship/config.yaml").exists());

    stackship_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("config already exists"));
}
