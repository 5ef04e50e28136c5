//! CLI integration tests for Jarbird
//!
//! Each test writes a small workspace (jarbird.toml, pom.yaml,
//! gradle.properties) to a temporary directory and runs the binary on it.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROPERTIES: &str = "\
repository.maven.mock.release=https://mock/release
repository.maven.mock.snapshot=https://mock/snapshot
repository.maven.mock2.release=https://mock2/release
repository.maven.mock2.snapshot=https://mock2/snapshot
repository.artifactory.mock.release=https://artifactory/release
repository.artifactory.mock.snapshot=https://artifactory/snapshot
repository.artifactory.mock.repoKey=libs
repository.mavencentral.newUser=true
";

const KEYRING: &str = "\
signing.keyId=ABCDEF12
signing.password=secret
signing.secretKeyRingFile=/tmp/secring.gpg
";

/// Get a command instance for the jarbird binary, isolated from the user's config
fn jarbird_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("jarbird"));
    cmd.current_dir(dir)
        .env("JARBIRD_USER_PROPERTIES", dir.join("no-user.properties"))
        .env_remove("JARBIRD_ROOT")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a workspace with the given descriptor and extra files
fn setup_workspace(descriptor: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("jarbird.toml"), descriptor).unwrap();
    fs::write(dir.path().join("gradle.properties"), PROPERTIES).unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn single_project() -> TempDir {
    setup_workspace(
        r#"
[[project]]
path = ":"
group = "io.example"
version = "1.0"
repos = { maven = ["mock"] }
"#,
        &[("pom.yaml", "artifactId: lib\nlicenses:\n  - name: Apache-2.0\n")],
    )
}

fn multi_project() -> TempDir {
    setup_workspace(
        r#"
[settings]
registration = "eager"

[[project]]
path = ":app"
group = "io.example"
version = "1.0"
repos = { maven = ["mock"], artifactory = "mock" }

[[project]]
path = ":lib"
group = "io.example"
version = "1.0"
"#,
        &[],
    )
}

fn json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

// =============================================================================
// Workspace Discovery
// =============================================================================

#[test]
fn test_outside_workspace_fails() {
    let dir = TempDir::new().unwrap();

    jarbird_cmd(dir.path())
        .arg("tasks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Not in a jarbird workspace"));
}

#[test]
fn test_workspace_found_from_subdirectory() {
    let dir = single_project();
    let sub = dir.path().join("src").join("main");
    fs::create_dir_all(&sub).unwrap();

    jarbird_cmd(&sub)
        .arg("tasks")
        .assert()
        .success()
        .stdout(predicate::str::contains(":jbPublish - Publish"));
}

#[test]
fn test_root_flag() {
    let dir = single_project();
    let elsewhere = TempDir::new().unwrap();

    jarbird_cmd(elsewhere.path())
        .arg("--root")
        .arg(dir.path())
        .arg("tasks")
        .assert()
        .success()
        .stdout(predicate::str::contains(":jbPublishToMavenMock"));
}

// =============================================================================
// Tasks
// =============================================================================

#[test]
fn test_tasks_lists_jarbird_group() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .arg("tasks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Jarbird publishing tasks"))
        .stdout(predicate::str::contains(
            ":jbPublishLibToMavenLocal - Publish module 'lib' to Maven Local repository",
        ))
        .stdout(predicate::str::contains(
            ":jbPublishToMavenMock - Publish to Maven repository 'mock'",
        ))
        .stdout(predicate::str::contains("publishLibPublicationToMavenLocal").not());
}

#[test]
fn test_tasks_all_includes_native_tasks() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .args(["tasks", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Publishing tasks"))
        .stdout(predicate::str::contains(":publishLibPublicationToMavenMockRepository"))
        .stdout(predicate::str::contains("Documentation tasks"))
        .stdout(predicate::str::contains(":jbDokkaJarLib"));
}

#[test]
fn test_tasks_json() {
    let dir = single_project();

    let output = jarbird_cmd(dir.path())
        .args(["tasks", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows = json(&output.stdout);
    let paths: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&":jbPublish"));
    assert!(paths.contains(&":jbPublishLibToMavenRepositories"));
}

#[test]
fn test_tasks_unknown_project() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .args(["tasks", "--project", ":nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project not found: :nope"));
}

// =============================================================================
// Graph and Plan
// =============================================================================

#[test]
fn test_graph_shows_tree() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublishToMavenRepositories"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("jbPublishToMavenRepositories\n"))
        .stdout(predicate::str::contains("  jbPublishToMavenMock\n"))
        .stdout(predicate::str::contains("    jbPublishLibToMavenMock\n"))
        .stdout(predicate::str::contains(
            "      publishLibPublicationToMavenMockRepository\n",
        ));
}

#[test]
fn test_graph_json() {
    let dir = single_project();

    let output = jarbird_cmd(dir.path())
        .args(["-f", "json", "graph"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let tree = json(&output.stdout);
    assert_eq!(tree["label"], "jbPublish");
    let children: Vec<&str> = tree["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["label"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["jbPublishToMavenLocal", "jbPublishToMavenRepositories"]);
}

#[test]
fn test_graph_unknown_task() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublishToNowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found: :jbPublishToNowhere"));
}

#[test]
fn test_plan_orders_dependencies_first() {
    let dir = single_project();

    let output = jarbird_cmd(dir.path())
        .args(["plan", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan = json(&output.stdout);
    let paths: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["path"].as_str().unwrap())
        .collect();

    let pos = |p: &str| paths.iter().position(|x| *x == p).unwrap();
    assert_eq!(paths.last(), Some(&":jbPublish"));
    assert!(pos(":sourcesJarLib") < pos(":publishLibPublicationToMavenLocal"));
    assert!(pos(":publishLibPublicationToMavenLocal") < pos(":jbPublishLibToMavenLocal"));
    assert!(pos(":jbPublishLibToMavenMock") < pos(":jbPublishToMavenMock"));
}

#[test]
fn test_plan_marks_gated_tasks() {
    let dir = setup_workspace(
        r#"
[[project]]
path = ":"
group = "io.example"
version = "1.0"

[[project.pub]]
repos = { maven = ["mock"] }

[[project.pub]]
variant = "debug"
repos = { maven = ["mock2"] }
"#,
        &[("pom.yaml", "artifactId: lib\n")],
    );

    jarbird_cmd(dir.path())
        .args(["plan", "publish"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            ":publishLibPublicationToMavenMock2Repository SKIPPED",
        ))
        .stdout(predicate::str::contains(
            ":publishLibDebugPublicationToMavenMockRepository SKIPPED",
        ))
        .stdout(predicate::str::contains(":publishLibPublicationToMavenMockRepository\n"));

    jarbird_cmd(dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("SKIPPED").not());
}

#[test]
fn test_multi_project_root_delegates() {
    let dir = multi_project();

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublishToMavenLocal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  :app:jbPublishToMavenLocal\n"))
        .stdout(predicate::str::contains("  :lib:jbPublishToMavenLocal\n"));

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublish", "--project", ":app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  jbPublishToArtifactory\n"))
        .stdout(predicate::str::contains("    artifactoryPublish\n"));
}

#[test]
fn test_lazy_override_still_plans() {
    let dir = multi_project();

    jarbird_cmd(dir.path())
        .args(["--registration", "lazy", "plan", ":app:jbPublish"])
        .assert()
        .success()
        .stdout(predicate::str::contains(":app:artifactoryPublish"));
}

// =============================================================================
// Repos and Signing
// =============================================================================

#[test]
fn test_repos_lists_urls() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project :"))
        .stdout(predicate::str::contains("lib (io.example:lib:1.0)"))
        .stdout(predicate::str::contains("https://mock/release"));
}

#[test]
fn test_repos_snapshot_url() {
    let dir = setup_workspace(
        r#"
[[project]]
path = ":"
group = "io.example"
version = "1.0-SNAPSHOT"
repos = { maven = ["mock"] }
"#,
        &[],
    );

    let output = jarbird_cmd(dir.path())
        .args(["repos", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json(&output.stdout);
    let publication = &report[0]["publications"][0];
    assert_eq!(publication["snapshot"], true);
    let urls: Vec<&str> = publication["repos"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["url"].as_str())
        .collect();
    assert_eq!(urls, vec!["https://mock/snapshot"]);
}

#[test]
fn test_signing_without_configuration() {
    let dir = single_project();

    jarbird_cmd(dir.path())
        .arg("signing")
        .assert()
        .success()
        .stdout(predicate::str::contains("skip: not configured"))
        .stderr(predicate::str::contains("No signing setting is provided"));
}

#[test]
fn test_signing_with_keyring() {
    let dir = single_project();
    let props = format!("{}{}", PROPERTIES, KEYRING);
    fs::write(dir.path().join("gradle.properties"), props).unwrap();

    jarbird_cmd(dir.path())
        .arg("signing")
        .assert()
        .success()
        .stdout(predicate::str::contains("sign with keyring"));
}

#[test]
fn test_signing_snapshot_skipped() {
    let dir = setup_workspace(
        "[[project]]\npath = \":\"\ngroup = \"g\"\nversion = \"1.0-SNAPSHOT\"\n",
        &[],
    );

    let output = jarbird_cmd(dir.path())
        .args(["signing", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json(&output.stdout);
    assert_eq!(report[0]["required"], false);
    assert_eq!(report[0]["publications"][0]["decision"]["decision"], "skip");
    assert_eq!(report[0]["publications"][0]["decision"]["with"], "snapshot");
}

// =============================================================================
// Check and Errors
// =============================================================================

#[test]
fn test_check_succeeds() {
    let dir = multi_project();

    jarbird_cmd(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK: 3 projects, 2 publications"));
}

#[test]
fn test_missing_property_is_an_error() {
    let dir = setup_workspace(
        "[[project]]\npath = \":\"\ngroup = \"g\"\nversion = \"1.0\"\nrepos = { maven = [\"unknown\"] }\n",
        &[],
    );

    jarbird_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Failed to configure project ':'"))
        .stderr(predicate::str::contains("repository.maven.unknown.release"));
}

#[test]
fn test_env_property_fills_gap() {
    let dir = setup_workspace(
        "[[project]]\npath = \":\"\ngroup = \"g\"\nversion = \"1.0\"\nrepos = { maven = [\"env\"] }\n",
        &[],
    );

    jarbird_cmd(dir.path())
        .env("ORG_GRADLE_PROJECT_repository.maven.env.release", "https://env/release")
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://env/release"));
}

#[test]
fn test_plugin_without_website_fails() {
    let dir = setup_workspace(
        "[[project]]\npath = \":\"\ngroup = \"g\"\nversion = \"1.0\"\n",
        &[(
            "pom.yaml",
            "artifactId: plugin\nplugin:\n  id: io.example.plugin\n  implementationClass: io.example.Plugin\n",
        )],
    );

    jarbird_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a website"));
}

#[test]
fn test_plugin_goes_to_portal() {
    let dir = setup_workspace(
        "[[project]]\npath = \":\"\ngroup = \"g\"\nversion = \"1.0\"\n",
        &[(
            "pom.yaml",
            "artifactId: plugin\nweb:\n  url: https://example.io\nplugin:\n  id: io.example.plugin\n  implementationClass: io.example.Plugin\n",
        )],
    );

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublishToGradlePluginPortal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  jbPublishPluginToGradlePluginPortal\n"))
        .stdout(predicate::str::contains("    publishPlugins\n"));

    jarbird_cmd(dir.path())
        .args(["graph", "jbPublishPluginToMavenLocal"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "publishPluginPluginMarkerMavenPublicationToMavenLocal",
        ));
}

#[test]
fn test_invalid_descriptor() {
    let dir = setup_workspace("[[project]]\npath = \"app\"\n", &[]);

    jarbird_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project path 'app'"));
}
