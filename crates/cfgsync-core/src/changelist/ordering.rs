//! Dependency ordering of create and delete entries
//!
//! Ordering runs Kahn's algorithm over the entries of one sequence. Ties are
//! broken lexically, so entries without dependencies come out in name order.

use std::collections::{BTreeMap, BTreeSet};

/// Result of ordering one sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Every input name exactly once.
    pub order: Vec<String>,
    /// Names that sat on a cycle, appended to `order` lexically.
    pub cycle: Vec<String>,
}

/// Order `names` so every item follows the items it depends on.
///
/// `dependencies` maps a name to the names it declares. Declared names that
/// are not in `names` are ignored.
pub fn dependency_first(
    names: &BTreeSet<String>,
    dependencies: &BTreeMap<String, Vec<String>>,
) -> DependencyOrder {
    let mut prerequisites: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for name in names {
        let deps = dependencies
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|dep| *dep != name && names.contains(*dep))
            .collect();
        prerequisites.insert(name.as_str(), deps);
    }
    kahn(prerequisites)
}

/// Order `names` so every item precedes the items it depends on.
pub fn referrer_first(
    names: &BTreeSet<String>,
    dependencies: &BTreeMap<String, Vec<String>>,
) -> DependencyOrder {
    let mut prerequisites: BTreeMap<&str, BTreeSet<&str>> =
        names.iter().map(|n| (n.as_str(), BTreeSet::new())).collect();
    for referrer in names {
        for dep in dependencies.get(referrer).into_iter().flatten() {
            if dep != referrer {
                if let Some(required) = prerequisites.get_mut(dep.as_str()) {
                    required.insert(referrer.as_str());
                }
            }
        }
    }
    kahn(prerequisites)
}

/// `prerequisites[n]` must all be emitted before `n`.
fn kahn(mut prerequisites: BTreeMap<&str, BTreeSet<&str>>) -> DependencyOrder {
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, required) in &prerequisites {
        for prerequisite in required {
            dependents.entry(*prerequisite).or_default().push(*name);
        }
    }

    let mut ready: BTreeSet<&str> = prerequisites
        .iter()
        .filter(|(_, required)| required.is_empty())
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(prerequisites.len());
    while let Some(current) = ready.pop_first() {
        prerequisites.remove(current);
        order.push(current.to_string());

        for dependent in dependents.get(current).into_iter().flatten() {
            if let Some(required) = prerequisites.get_mut(dependent) {
                required.remove(current);
                if required.is_empty() {
                    ready.insert(*dependent);
                }
            }
        }
    }

    // Whatever is left is on, or behind, a cycle.
    let cycle: Vec<String> = prerequisites.keys().map(|n| n.to_string()).collect();
    order.extend(cycle.iter().cloned());
    DependencyOrder { order, cycle }
}
