//! Benchmarks for metadata resolution and job planning.
//!
//! These benchmarks measure resolving a metadata document and rendering
//! every job it describes, for documents of growing size.

use ci_jobgen::reconcile::Reconciler;
use ci_jobgen::resolver::resolve_str;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;

/// A document with one unstable group, a stable group sharing its
/// repositories, and a merger group cascading the unstable one.
fn generate_metadata(num_repos: usize, num_releases: usize) -> String {
    let releases: Vec<String> = (0..num_releases).map(|i| format!("rel{}", i)).collect();
    let releases = releases.join(", ");

    let mut repositories = String::new();
    for i in 0..num_repos {
        write!(
            repositories,
            "      - name: pkg{i}\n        upstream_url: https://example.org/pkg{i}\n        default_branch: ubuntu/master\n"
        )
        .unwrap();
    }

    let mut doc = String::from("substitutions:\n  \"$name\": name\nactive_configs:\n");
    for (group, config_type) in [("desktop", "unstable"), ("backports", "stable")] {
        write!(
            doc,
            r#"  {group}:
    default:
      type: {config_type}
      packaging_url: ssh://git@git.example.org/packaging/$name
      packaging_branch_stable: ubuntu/stable
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:example/stable
      upload_target_unstable: ppa:example/unstable
      releases: [{releases}]
    repositories:
{repositories}"#
        )
        .unwrap();
    }
    doc.push_str(
        "  merger:\n    default:\n      type: merger\n      parent: desktop\n      cascade: [ubuntu/master, ubuntu/stable]\n",
    );
    doc
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for num_repos in [10, 50, 200] {
        let doc = generate_metadata(num_repos, 3);
        group.bench_with_input(BenchmarkId::new("repos", num_repos), &doc, |b, doc| {
            b.iter(|| resolve_str(black_box(doc)))
        });
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let reconciler = Reconciler::default();

    for num_repos in [10, 50, 200] {
        let metadata = resolve_str(&generate_metadata(num_repos, 3)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("repos", num_repos),
            &metadata,
            |b, metadata| b.iter(|| reconciler.plan(black_box(metadata))),
        );
    }

    for num_releases in [1, 4, 16] {
        let metadata = resolve_str(&generate_metadata(20, num_releases)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("releases", num_releases),
            &metadata,
            |b, metadata| b.iter(|| reconciler.plan(black_box(metadata))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_plan);
criterion_main!(benches);
