//
//  no_circular.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::collections::HashSet;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::paths::{relative_to, to_posix};
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "dependency/no-circular";
const SUGGESTED_FIX: &str = "Break the cycle by extracting shared logic into a lower layer or introducing an interface abstraction.";

/// Detect circular dependencies between modules.
pub struct NoCircularRule;

/// Directed adjacency derived from the dependency graph: resolved targets
/// only, keyed by root-relative path, self-loops dropped.
fn build_adjacency(graph: &DependencyGraph, root: &Path) -> IndexMap<String, IndexSet<String>> {
    let mut adjacency: IndexMap<String, IndexSet<String>> = IndexMap::new();

    for (file, imports) in graph {
        let normalized = to_posix(file);
        let edges = adjacency.entry(normalized.clone()).or_default();

        for reference in imports {
            let Some(resolved) = &reference.resolved else {
                continue;
            };
            let target = relative_to(root, resolved);
            if target == normalized {
                continue;
            }
            edges.insert(target);
        }
    }

    adjacency
}

enum Step<'g> {
    Enter(&'g str),
    Close(&'g str),
    Skip,
    Retreat,
}

/// Depth-first cycle search over the adjacency map.
///
/// Runs with an explicit frame stack so graph depth never translates into
/// call-stack depth. A cycle is the slice of the traversal stack from the
/// position of an on-stack neighbor through the current node, closed by
/// repeating the neighbor. The global visited set means a cycle reachable
/// only through an already-visited node can go unreported; see DESIGN.md.
fn find_cycles(adjacency: &IndexMap<String, IndexSet<String>>) -> Vec<Vec<String>> {
    let empty: IndexSet<String> = IndexSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    for start in adjacency.keys() {
        if visited.contains(start.as_str()) {
            continue;
        }

        visited.insert(start);
        on_stack.insert(start);
        stack.push(start);
        let mut frames: Vec<(&str, usize)> = vec![(start.as_str(), 0)];

        loop {
            let step = {
                let Some(frame) = frames.last_mut() else {
                    break;
                };
                let neighbors = adjacency.get(frame.0).unwrap_or(&empty);
                match neighbors.get_index(frame.1) {
                    None => Step::Retreat,
                    Some(neighbor) => {
                        frame.1 += 1;
                        if on_stack.contains(neighbor.as_str()) {
                            Step::Close(neighbor)
                        } else if visited.contains(neighbor.as_str()) {
                            Step::Skip
                        } else {
                            Step::Enter(neighbor)
                        }
                    }
                }
            };

            match step {
                Step::Enter(neighbor) => {
                    visited.insert(neighbor);
                    on_stack.insert(neighbor);
                    stack.push(neighbor);
                    frames.push((neighbor, 0));
                }
                Step::Close(neighbor) => {
                    if let Some(position) = stack.iter().position(|node| *node == neighbor) {
                        let mut cycle: Vec<String> =
                            stack[position..].iter().map(|s| s.to_string()).collect();
                        cycle.push(neighbor.to_string());
                        cycles.push(cycle);
                    }
                }
                Step::Skip => {}
                Step::Retreat => {
                    if let Some((node, _)) = frames.pop() {
                        on_stack.remove(node);
                        stack.pop();
                    }
                }
            }
        }
    }

    cycles
}

impl Rule for NoCircularRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Detect circular dependencies between modules.",
            severity: Severity::Error,
            category: RuleCategory::Dependency,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let adjacency = build_adjacency(ctx.graph, ctx.root);
        let cycles = find_cycles(&adjacency);

        Ok(cycles
            .into_iter()
            .map(|cycle| {
                let readable = cycle.join(" -> ");
                let file = cycle.first().cloned();
                RuleViolation {
                    rule_id: RULE_ID.to_string(),
                    message: format!("Circular dependency detected: {readable}."),
                    file,
                    line: None,
                    column: None,
                    fixable: false,
                    suggested_fix: Some(SUGGESTED_FIX.to_string()),
                }
            })
            .collect())
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let violations = self.check(ctx)?;
        if !violations.is_empty() {
            ctx.emit(&violations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ImportReference;
    use std::path::PathBuf;

    fn edge(root: &Path, target: &str) -> ImportReference {
        ImportReference {
            specifier: format!("./{target}"),
            is_type_only: false,
            resolved: Some(root.join(target)),
        }
    }

    fn graph(root: &Path, entries: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (file, targets) in entries {
            graph.insert(
                file.to_string(),
                targets.iter().map(|t| edge(root, t)).collect(),
            );
        }
        graph
    }

    fn check(root: &Path, graph: &DependencyGraph) -> Vec<RuleViolation> {
        let files: Vec<String> = graph.keys().cloned().collect();
        let ctx = RuleContext {
            root,
            files: &files,
            fix: false,
            verbose: false,
            graph,
            report: None,
        };
        NoCircularRule.check(&ctx).unwrap()
    }

    #[test]
    fn reports_one_cycle_for_three_node_loop() {
        let root = PathBuf::from("/ws");
        let graph = graph(
            &root,
            &[
                ("a.ts", &["b.ts"] as &[&str]),
                ("b.ts", &["c.ts"]),
                ("c.ts", &["a.ts"]),
            ],
        );

        let violations = check(&root, &graph);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Circular dependency detected: a.ts -> b.ts -> c.ts -> a.ts."
        );
        assert_eq!(violations[0].file.as_deref(), Some("a.ts"));
    }

    #[test]
    fn acyclic_graph_reports_nothing() {
        let root = PathBuf::from("/ws");
        let graph = graph(&root, &[("a.ts", &["b.ts"] as &[&str]), ("b.ts", &[])]);
        assert!(check(&root, &graph).is_empty());
    }

    #[test]
    fn self_imports_are_not_cycles() {
        let root = PathBuf::from("/ws");
        let graph = graph(&root, &[("a.ts", &["a.ts"] as &[&str])]);
        assert!(check(&root, &graph).is_empty());
    }

    #[test]
    fn two_node_cycle_is_reported_once() {
        let root = PathBuf::from("/ws");
        let graph = graph(&root, &[("a.ts", &["b.ts"] as &[&str]), ("b.ts", &["a.ts"])]);
        let violations = check(&root, &graph);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Circular dependency detected: a.ts -> b.ts -> a.ts."
        );
    }

    #[test]
    fn unresolved_imports_are_ignored() {
        let root = PathBuf::from("/ws");
        let mut graph = DependencyGraph::new();
        graph.insert(
            "a.ts".to_string(),
            vec![ImportReference {
                specifier: "react".to_string(),
                is_type_only: false,
                resolved: None,
            }],
        );
        assert!(check(&root, &graph).is_empty());
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let root = PathBuf::from("/ws");
        let mut graph = DependencyGraph::new();
        let depth = 10_000;
        for i in 0..depth {
            let targets = if i + 1 < depth {
                vec![edge(&root, &format!("f{}.ts", i + 1))]
            } else {
                vec![edge(&root, "f0.ts")]
            };
            graph.insert(format!("f{i}.ts"), targets);
        }

        let violations = check(&root, &graph);
        assert_eq!(violations.len(), 1);
    }
}
