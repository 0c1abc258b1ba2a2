//! # Tree Command Implementation
//!
//! The `tree` subcommand shows the planned jobs grouped by the view they
//! will be placed in, views sorted by name and jobs in plan order.
//!
//! This command is read-only and never contacts Jenkins.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;

use ci_jobgen::reconcile::Plan;

use super::MetadataArgs;

/// Show the jobs the metadata describes, grouped by view
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub metadata: MetadataArgs,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let plan = args.metadata.plan()?;
    let root = build_tree(&plan);
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn build_tree(plan: &Plan) -> TreeNode {
    let children = plan
        .views()
        .into_iter()
        .map(|(view, jobs)| TreeNode {
            label: format!("{} ({})", view, jobs.len()),
            children: jobs
                .into_iter()
                .map(|job| TreeNode {
                    label: job.identity.to_string(),
                    children: Vec::new(),
                })
                .collect(),
        })
        .collect();
    TreeNode {
        label: format!("views ({} jobs)", plan.len()),
        children,
    }
}

#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_jobgen::reconcile::Reconciler;
    use ci_jobgen::resolver::resolve_str;

    #[test]
    fn test_build_tree_groups_jobs_by_view() {
        let metadata = resolve_str(
            r#"
active_configs:
  lubuntu:
    default:
      type: unstable
      packaging_url: ssh://git@git.example.org/foo
      packaging_branch_stable: ubuntu/focal
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:x/stable
      upload_target_unstable: ppa:x/unstable
      releases: [focal]
    repositories:
      - name: a
        upstream_url: https://example.org/a
      - name: b
        upstream_url: https://example.org/b
"#,
        )
        .unwrap();
        let plan = Reconciler::default().plan(&metadata).unwrap();
        let tree = build_tree(&plan);

        assert_eq!(tree.label, "views (5 jobs)");
        let labels: Vec<&str> = tree.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["focal unstable (2)", "mgmt (3)"]);
        assert_eq!(tree.children[0].children[0].label, "focal_unstable_a");
    }
}
