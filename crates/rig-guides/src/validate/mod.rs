//! Whole-project validation.
//!
//! Entity predicates (`Proxy::validate`, `Module::validate`) only look at
//! one unit. The checks here need the whole project: registered module
//! types, identifier collisions across modules and parent cycles. A
//! dangling parent is not an issue; declaring a parent that is built
//! elsewhere, or not at all, is a legal authoring state.

use std::collections::{HashMap, HashSet};

use crate::error::ValidationError;
use crate::model::{Identifier, Project};

/// Collects every issue in the project, in declaration order.
pub fn validate_project(project: &Project) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    if project.modules().is_empty() {
        issues.push(ValidationError::EmptyProject {
            name: project.name().to_string(),
        });
    }

    for module in project.modules() {
        if !project.registry().contains(module.type_name()) {
            issues.push(ValidationError::UnknownModuleType {
                type_name: module.type_name().to_string(),
            });
        }
        if let Err(err) = module.validate() {
            issues.push(err);
        }
        for proxy in module.proxies() {
            if let Err(err) = proxy.validate() {
                issues.push(err);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (_, proxy) in project.proxies() {
        let id = proxy.identifier();
        if !seen.insert(id) && reported.insert(id) {
            issues.push(ValidationError::DuplicateIdentifier {
                identifier: proxy.identifier().to_string(),
            });
        }
    }

    let cycles = parent_cycle_members(project);
    let mut reported = HashSet::new();
    for (_, proxy) in project.proxies() {
        if cycles.contains(proxy.identifier()) && reported.insert(proxy.identifier()) {
            issues.push(ValidationError::ParentCycle {
                identifier: proxy.identifier().to_string(),
            });
        }
    }

    issues
}

/// Returns the first issue, if any.
pub fn check_project(project: &Project) -> Result<(), ValidationError> {
    match validate_project(project).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Identifiers of proxies whose effective parent chain leads back to
/// themselves.
pub fn parent_cycle_members(project: &Project) -> HashSet<Identifier> {
    let parents: HashMap<&Identifier, &Identifier> = project
        .proxies()
        .filter_map(|(module, proxy)| {
            module
                .effective_parent(proxy)
                .map(|parent| (proxy.identifier(), parent))
        })
        .collect();

    let mut members = HashSet::new();
    for &start in parents.keys() {
        let mut current = parents.get(start).copied();
        // A chain longer than the number of edges has to repeat a node.
        for _ in 0..parents.len() {
            match current {
                Some(id) if id == start => {
                    members.insert(start.clone());
                    break;
                }
                Some(id) => current = parents.get(id).copied(),
                None => break,
            }
        }
    }
    members
}
