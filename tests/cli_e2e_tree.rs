//! End-to-end tests for the `tree` command.

mod common;
use common::prelude::*;

#[test]
fn test_tree_groups_jobs_by_view() {
    let fixture = TestFixture::new().with_metadata(metadata::LUBUNTU);

    fixture
        .command_for("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("views (10 jobs)"))
        .stdout(predicate::str::contains("focal unstable (2)"))
        .stdout(predicate::str::contains("merger (2)"))
        .stdout(predicate::str::contains("mgmt (5)"))
        .stdout(predicate::str::contains("bionic_stable_lxqt-panel"));
}

#[test]
fn test_tree_invalid_metadata_fails() {
    let fixture = TestFixture::new().with_metadata(metadata::MISSPELT_KEY);

    fixture.command_for("tree").assert().failure();
}
