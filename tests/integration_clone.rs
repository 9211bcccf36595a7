//! End-to-end tests for `tenfold clone` against a synthesized master
//! project.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tenfold() -> Command {
    Command::cargo_bin("tenfold").expect("binary builds")
}

/// Build a root with one environment, a populated master project, and a
/// registry mapping two tenants.
fn fixture() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    let master = temp.path().join("tenants_env1/dbt_packages/master_project");

    fs::create_dir_all(master.join("models/staging")).unwrap();
    fs::create_dir_all(master.join("macros/util")).unwrap();

    fs::write(
        master.join("models/orders.sql"),
        "select * from {{ ref('stg_orders') }}\n",
    )
    .unwrap();
    fs::write(
        master.join("models/staging/stg_orders.sql"),
        "{{ config(materialized='view') }}\nselect * from raw.orders\n",
    )
    .unwrap();
    fs::write(
        master.join("models/schema.yml"),
        "version: 2\nmodels:\n- name: orders\n- name: stg_orders\nsources:\n- name: raw\n  schema: landing\n",
    )
    .unwrap();
    fs::write(
        master.join("macros/util/cents.sql"),
        "{% macro cents(col) %}{{ col }} / 100{% endmacro %}\n",
    )
    .unwrap();
    fs::write(master.join("models/orders.md"), "# Orders\n").unwrap();
    fs::write(master.join("models/notes.txt"), "scratch notes\n").unwrap();

    fs::write(
        temp.path().join("tenfold.toml"),
        "[environments]\ntenants_env1 = [\"acme\", \"globex\"]\n",
    )
    .unwrap();

    temp
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|_| panic!("missing output: {}", path.display()))
}

#[test]
fn test_clone_full_fan_out() {
    let temp = fixture();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .success();

    let env = temp.path().join("tenants_env1");

    // Tenant-scoped model, renamed, config injected, ref rewritten
    let orders = read(&env.join("models/acme/acme_orders.sql"));
    assert!(orders.starts_with("{{ config(schema='acme', alias='orders') }}\n\n"));
    assert!(orders.contains("{{ ref('acme_stg_orders') }}"));

    // Nested model keeps its sub-path; existing config augmented
    let stg = read(&env.join("models/acme/staging/acme_stg_orders.sql"));
    assert!(stg.contains("materialized='view', schema='acme', alias='stg_orders'"));

    // Schema document tenant-scoped, unrenamed, rewritten
    let schema = read(&env.join("models/acme/schema.yml"));
    assert!(schema.contains("acme_orders"));
    assert!(schema.contains("schema: acme"));
    // Source names stay untouched
    assert!(schema.contains("name: raw"));

    // Macro shared once, nested, verbatim
    let cents = read(&env.join("macros/util/cents.sql"));
    assert!(cents.contains("{% macro cents(col) %}"));
    assert!(!env.join("macros/acme").exists());

    // Doc shared, flattened
    assert!(env.join("models/shared/orders.md").exists());

    // Second tenant got its own scoped copies
    assert!(env.join("models/globex/globex_orders.sql").exists());
    assert!(read(&env.join("models/globex/schema.yml")).contains("globex_orders"));
}

#[test]
fn test_unsupported_extension_is_skipped_not_fatal() {
    let temp = fixture();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));

    // The .txt file produced zero output files
    let env = temp.path().join("tenants_env1");
    assert!(!env.join("models/acme/notes.txt").exists());
    assert!(!env.join("models/acme/acme_notes.txt").exists());
    assert!(!env.join("models/shared/notes.txt").exists());
}

#[test]
fn test_clone_is_idempotent_across_runs() {
    let temp = fixture();
    let target = temp.path().join("tenants_env1/models/acme/acme_orders.sql");

    tenfold().args(["clone", "--path"]).arg(temp.path()).assert().success();
    let first = read(&target);

    tenfold().args(["clone", "--path"]).arg(temp.path()).assert().success();
    assert_eq!(read(&target), first);
}

#[test]
fn test_json_report() {
    let temp = fixture();

    let output = tenfold()
        .args(["clone", "--format", "json", "--path"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // 3 tenant-scoped files (2 models + schema) for each of 2 tenants
    assert_eq!(report["written"], 6);
    // notes.txt recorded per tenant pass
    assert_eq!(report["skipped"].as_array().unwrap().len(), 2);
    assert!(
        report["skipped"][0]["path"]
            .as_str()
            .unwrap()
            .contains("notes.txt")
    );
}

#[test]
fn test_unmapped_environment_aborts_before_any_writes() {
    let temp = fixture();
    fs::create_dir_all(temp.path().join("tenants_env2/dbt_packages/master_project/models"))
        .unwrap();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no registry entry for environment 'tenants_env2'",
        ));

    // Pre-flight runs before any file is processed, for every environment
    assert!(!temp.path().join("tenants_env1/models").exists());
}

#[test]
fn test_environment_filter_selects_subset() {
    let temp = fixture();
    let env2 = temp.path().join("tenants_env2/dbt_packages/master_project/models");
    fs::create_dir_all(&env2).unwrap();
    fs::write(env2.join("orders.sql"), "select 1\n").unwrap();
    fs::write(
        temp.path().join("tenfold.toml"),
        "[environments]\ntenants_env1 = [\"acme\"]\ntenants_env2 = [\"initech\"]\n",
    )
    .unwrap();

    tenfold()
        .args(["clone", "--environment", "tenants_env2", "--path"])
        .arg(temp.path())
        .assert()
        .success();

    assert!(
        temp.path()
            .join("tenants_env2/models/initech/initech_orders.sql")
            .exists()
    );
    assert!(!temp.path().join("tenants_env1/models").exists());
}

#[test]
fn test_missing_registry_is_fatal_with_suggestion() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("tenants_env1")).unwrap();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("tenant registry not found"))
        .stderr(predicate::str::contains("tenfold init"));
}

#[test]
fn test_malformed_schema_aborts_run_naming_file() {
    let temp = fixture();
    let master = temp.path().join("tenants_env1/dbt_packages/master_project");
    fs::write(master.join("models/broken.yml"), "models:\n  - name: [unclosed").unwrap();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.yml"));
}

#[test]
fn test_no_environments_found_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("tenfold.toml"),
        "[environments]\ntenants_env1 = [\"acme\"]\n",
    )
    .unwrap();

    tenfold()
        .args(["clone", "--path"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no environment directories"));
}
