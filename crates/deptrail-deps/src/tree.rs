//! Flattened dependency forest for tree rendering

use crate::types::{Dependency, DependencyTreeEntry, Ecosystem};
use std::collections::{BTreeMap, BTreeSet};

/// One package version in the forest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Node {
    ecosystem: Ecosystem,
    name: String,
    version: String,
    /// Name transitive sources use for this package (differs for aliases)
    package: String,
}

impl Node {
    fn of(dep: &Dependency, version: &str) -> Self {
        Self {
            ecosystem: dep.ecosystem,
            name: dep.name.clone(),
            version: version.to_string(),
            package: dep.package_name().to_string(),
        }
    }

    fn parent_key(&self) -> ParentKey {
        (
            self.ecosystem,
            self.ecosystem.normalize_name(&self.package),
            self.version.clone(),
        )
    }
}

/// (ecosystem, normalized name, version) of a parent package
type ParentKey = (Ecosystem, String, String);

/// Pre-order rows of the dependency forest.
///
/// Roots are the direct dependencies (one per name and resolved version),
/// sorted by ecosystem then name; `filter` keeps roots of one ecosystem.
/// Children follow transitive edges down to `max_depth` levels below the
/// roots. A package version already on the current branch is not repeated,
/// so cycles end while diamonds still appear under every parent.
pub fn build_tree(
    dependencies: &[Dependency],
    max_depth: usize,
    filter: Option<Ecosystem>,
) -> Vec<DependencyTreeEntry> {
    let children = child_index(dependencies);

    let mut seen = BTreeSet::new();
    let mut roots: Vec<(Node, bool)> = Vec::new();
    for dep in dependencies {
        if filter.is_some_and(|eco| eco != dep.ecosystem) {
            continue;
        }
        for entry in dep.direct_versions() {
            let node = Node::of(dep, &entry.resolved);
            if seen.insert(node.clone()) {
                let is_dev = entry.source.group().is_some_and(|g| g.is_dev());
                roots.push((node, is_dev));
            }
        }
    }
    roots.sort_by(|(a, _), (b, _)| {
        (a.ecosystem.as_str(), &a.name, &a.version).cmp(&(b.ecosystem.as_str(), &b.name, &b.version))
    });

    let mut rows = Vec::new();
    let count = roots.len();
    for (idx, (node, is_dev)) in roots.into_iter().enumerate() {
        let walker = Walker {
            children: &children,
            max_depth,
            is_dev,
        };
        walker.visit(&node, 0, idx + 1 == count, Vec::new(), BTreeSet::new(), &mut rows);
    }
    rows
}

/// Parent package → child nodes, from transitive sources
fn child_index(dependencies: &[Dependency]) -> BTreeMap<ParentKey, BTreeSet<Node>> {
    let mut index: BTreeMap<ParentKey, BTreeSet<Node>> = BTreeMap::new();
    for dep in dependencies {
        for entry in &dep.versions {
            if let Some((ecosystem, parent, parent_version)) = entry.source.parent_of(dep.ecosystem) {
                index
                    .entry((ecosystem, ecosystem.normalize_name(parent), parent_version.to_string()))
                    .or_default()
                    .insert(Node::of(dep, &entry.resolved));
            }
        }
    }
    index
}

struct Walker<'a> {
    children: &'a BTreeMap<ParentKey, BTreeSet<Node>>,
    max_depth: usize,
    is_dev: bool,
}

impl Walker<'_> {
    /// Children of `node` not already on the branch, sorted by name then version
    fn next_level(&self, node: &Node, branch: &BTreeSet<Node>) -> Vec<&Node> {
        let mut next: Vec<&Node> = self
            .children
            .get(&node.parent_key())
            .into_iter()
            .flatten()
            .filter(|child| !branch.contains(*child))
            .collect();
        next.sort_by(|a, b| {
            (&a.name, &a.version, a.ecosystem.as_str()).cmp(&(&b.name, &b.version, b.ecosystem.as_str()))
        });
        next
    }

    fn visit(
        &self,
        node: &Node,
        depth: usize,
        is_last: bool,
        ancestor_is_last_flags: Vec<bool>,
        mut branch: BTreeSet<Node>,
        rows: &mut Vec<DependencyTreeEntry>,
    ) {
        branch.insert(node.clone());
        let next = if depth < self.max_depth {
            self.next_level(node, &branch)
        } else {
            Vec::new()
        };

        rows.push(DependencyTreeEntry {
            name: node.name.clone(),
            version: node.version.clone(),
            ecosystem: node.ecosystem,
            is_dev_dependency: self.is_dev,
            depth,
            is_last,
            has_children: !next.is_empty(),
            ancestor_is_last_flags: ancestor_is_last_flags.clone(),
        });

        let mut flags = ancestor_is_last_flags;
        flags.push(is_last);
        let count = next.len();
        for (idx, child) in next.into_iter().enumerate() {
            // Each sibling gets its own copy of the branch
            self.visit(child, depth + 1, idx + 1 == count, flags.clone(), branch.clone(), rows);
        }
    }
}
