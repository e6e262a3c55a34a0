use indexmap::IndexMap;
use serde::Serialize;

use crate::model::project::ProjectRecord;
use crate::model::vault::Vault;
use crate::ops::hierarchy::{ParentLink, build_from_links, flatten_hierarchy, link_projects};

/// Statuses that mean a project no longer needs next actions
const FINISHED_STATUSES: &[&str] = &["complete", "completed", "done", "archived", "someday"];

/// Structured result from `gtd check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that should be fixed in the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The parent link closes a cycle; the project is shown as a root
    #[serde(rename = "parent_cycle")]
    ParentCycle { project: String, parent: String },
}

/// A non-critical issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// The parent reference names no known project
    #[serde(rename = "unresolved_parent")]
    UnresolvedParent { project: String, reference: String },
    /// Several projects share a title, so `[[Title]]` links are ambiguous
    #[serde(rename = "duplicate_title")]
    DuplicateTitle { title: String, paths: Vec<String> },
    /// Neither the project nor any sub-project has a next action
    #[serde(rename = "stalled_project")]
    StalledProject { project: String },
}

/// Validate the vault's projects. Read-only.
pub fn check_vault(vault: &Vault) -> CheckResult {
    check_projects(&vault.projects)
}

/// Checks performed:
/// 1. Parent links that would close a cycle (error)
/// 2. Parent references that resolve to nothing
/// 3. Titles shared by more than one project
/// 4. Unfinished projects with no next actions in their whole subtree
pub fn check_projects(records: &[ProjectRecord]) -> CheckResult {
    let mut result = CheckResult::default();

    let links = link_projects(records);
    for (record, link) in records.iter().zip(&links) {
        match link {
            ParentLink::Cycle(parent) => result.errors.push(CheckError::ParentCycle {
                project: record.path.clone(),
                parent: records[*parent].path.clone(),
            }),
            ParentLink::Unresolved(reference) => {
                result.warnings.push(CheckWarning::UnresolvedParent {
                    project: record.path.clone(),
                    reference: reference.clone(),
                })
            }
            ParentLink::Root | ParentLink::Child(_) => {}
        }
    }

    let mut by_title: IndexMap<&str, Vec<String>> = IndexMap::new();
    for record in records {
        by_title
            .entry(record.title.as_str())
            .or_default()
            .push(record.path.clone());
    }
    for (title, paths) in by_title {
        if paths.len() > 1 {
            result.warnings.push(CheckWarning::DuplicateTitle {
                title: title.to_string(),
                paths,
            });
        }
    }

    let roots = build_from_links(records, &links);
    for node in flatten_hierarchy(&roots) {
        if node.all_next_actions.is_empty() && !is_finished(&node.record) {
            result.warnings.push(CheckWarning::StalledProject {
                project: node.record.path.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

fn is_finished(record: &ProjectRecord) -> bool {
    record.status.as_deref().is_some_and(|status| {
        FINISHED_STATUSES
            .iter()
            .any(|f| status.trim().eq_ignore_ascii_case(f))
    })
}
