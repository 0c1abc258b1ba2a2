//! Metadata resolution tests using datatest-stable for test data discovery
//!
//! Every YAML file under `tests/testdata/metadata` is a complete metadata
//! document. Each one must resolve, and planning it must produce a job
//! for every repository and release without skipping anything.

use ci_jobgen::config::ConfigType;
use ci_jobgen::reconcile::{JobCategory, Reconciler};
use ci_jobgen::resolver::resolve_str;
use std::path::Path;

/// Resolve and plan one metadata document.
///
/// Checks that:
/// 1. The document resolves
/// 2. Planning it skips no job
/// 3. Every release gets a stable and an unstable management job
/// 4. The merger management job is always planned
/// 5. Each merger group plans one job per repository of its parent
fn test_metadata_resolution(path: &Path) -> datatest_stable::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read test file {}: {}", path.display(), e))?;

    let metadata = resolve_str(&content)
        .map_err(|e| format!("Failed to resolve {}: {}", path.display(), e))?;
    let plan = Reconciler::default()
        .plan(&metadata)
        .map_err(|e| format!("Failed to plan {}: {}", path.display(), e))?;

    assert!(!plan.is_empty(), "{} planned no jobs", path.display());
    assert!(
        plan.skipped.is_empty(),
        "{} skipped jobs: {:?}",
        path.display(),
        plan.skipped
    );

    let mgmt = plan
        .jobs
        .iter()
        .filter(|job| job.category() == JobCategory::Mgmt)
        .count();
    assert_eq!(
        mgmt,
        2 * plan.releases.len() + 1,
        "{} has the wrong number of management jobs",
        path.display()
    );
    assert!(plan.job("merger").is_some(), "{} has no merger job", path.display());

    let expected_mergers: usize = metadata
        .of_type(ConfigType::Merger)
        .map(|merger| metadata.parent_of(merger).map(|p| p.repositories.len()))
        .sum::<ci_jobgen::error::Result<usize>>()?;
    let mergers = plan
        .jobs
        .iter()
        .filter(|job| job.category() == JobCategory::Merger)
        .count();
    assert_eq!(mergers, expected_mergers, "{}", path.display());

    for job in &plan.jobs {
        assert!(
            job.content.starts_with("<?xml"),
            "{} in {} is not a Jenkins config.xml",
            job.identity,
            path.display()
        );
    }

    Ok(())
}

// Register datatest harness to discover and run tests on all YAML files in testdata/metadata
datatest_stable::harness!(
    test_metadata_resolution,
    "tests/testdata/metadata",
    r".*\.yaml$"
);
