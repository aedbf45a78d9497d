//! The field dependency graph.
//!
//! Nodes are interned into an arena and edges kept as adjacency lists of
//! indices. All traversals are iterative.

use indexmap::{IndexMap, IndexSet};
use std::{cmp::Reverse, collections::BinaryHeap};
use tabula_core::{
    schema::{FieldId, Reference},
    Error, Result,
};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexSet<FieldId>,

    /// `outgoing[i]` lists the nodes that depend on node `i`
    outgoing: Vec<Vec<usize>>,

    /// `incoming[i]` lists the nodes node `i` depends on
    incoming: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new(references: &[Reference]) -> Graph {
        let mut graph = Graph::default();
        for reference in references {
            graph.add_edge(&reference.from, &reference.to);
        }
        graph
    }

    pub fn add_edge(&mut self, from: &FieldId, to: &FieldId) {
        let from = self.intern(from);
        let to = self.intern(to);

        if !self.outgoing[from].contains(&to) {
            self.outgoing[from].push(to);
            self.incoming[to].push(from);
        }
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.nodes.contains(id)
    }

    fn intern(&mut self, id: &FieldId) -> usize {
        if let Some(index) = self.nodes.get_index_of(id) {
            return index;
        }

        let (index, _) = self.nodes.insert_full(id.clone());
        self.outgoing.push(vec![]);
        self.incoming.push(vec![]);
        index
    }

    /// Every field reachable from `roots` by following edges, in breadth-first
    /// order. Roots only appear when reachable from another root.
    pub fn dependents<'a>(&self, roots: impl IntoIterator<Item = &'a FieldId>) -> IndexSet<FieldId> {
        let mut queue = std::collections::VecDeque::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut ret = IndexSet::new();

        for root in roots {
            if let Some(index) = self.nodes.get_index_of(root) {
                queue.push_back(index);
            }
        }

        while let Some(node) = queue.pop_front() {
            for &next in &self.outgoing[node] {
                if !seen[next] {
                    seen[next] = true;
                    ret.insert(self.nodes[next].clone());
                    queue.push_back(next);
                }
            }
        }

        ret
    }

    /// Every field `id` transitively depends on.
    pub fn dependencies(&self, id: &FieldId) -> IndexSet<FieldId> {
        let mut stack = vec![];
        let mut seen = vec![false; self.nodes.len()];
        let mut ret = IndexSet::new();

        if let Some(index) = self.nodes.get_index_of(id) {
            stack.push(index);
        }

        while let Some(node) = stack.pop() {
            for &prev in &self.incoming[node] {
                if !seen[prev] {
                    seen[prev] = true;
                    ret.insert(self.nodes[prev].clone());
                    stack.push(prev);
                }
            }
        }

        ret
    }

    /// Checks that making `field` depend on `dependencies` keeps the graph
    /// acyclic. On failure the error names `field` and the dependency through
    /// which the cycle closes.
    pub fn check_new_edges<'a>(
        &self,
        field: &FieldId,
        dependencies: impl IntoIterator<Item = &'a FieldId>,
    ) -> Result<()> {
        let downstream = self.dependents([field]);

        for dependency in dependencies {
            if dependency == field || downstream.contains(dependency) {
                return Err(Error::circular_reference(field.as_str(), dependency.as_str()));
            }
        }

        Ok(())
    }

    /// Orders `subset` so every field comes after the fields of the subset it
    /// depends on, directly or through fields outside the subset. Fields that
    /// are mutually independent are ordered by id.
    pub fn topo_sort(&self, subset: &IndexSet<FieldId>) -> Result<Vec<FieldId>> {
        Ok(self.topo_levels(subset)?.into_iter().flatten().collect())
    }

    /// Groups `subset` into levels: each field sits one level after the
    /// deepest subset field it depends on. Fields within a level are
    /// independent of each other and sorted by id.
    pub fn topo_levels(&self, subset: &IndexSet<FieldId>) -> Result<Vec<Vec<FieldId>>> {
        let edges = self.restricted_edges(subset);

        let mut in_degree: IndexMap<&FieldId, usize> = subset.iter().map(|id| (id, 0)).collect();
        for targets in edges.values() {
            for target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree += 1;
                }
            }
        }

        let mut level_of: IndexMap<&FieldId, usize> = IndexMap::new();
        let mut ready: BinaryHeap<Reverse<&FieldId>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();

        let mut levels: Vec<Vec<FieldId>> = vec![];

        while let Some(Reverse(id)) = ready.pop() {
            let level = level_of.get(id).copied().unwrap_or(0);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(id.clone());

            for &target in edges.get(id).into_iter().flatten() {
                let next = level_of.entry(target).or_insert(0);
                *next = (*next).max(level + 1);

                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(target));
                    }
                }
            }
        }

        let sorted: usize = levels.iter().map(Vec::len).sum();
        if sorted < subset.len() {
            let stuck: Vec<&FieldId> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(id, _)| *id)
                .collect();
            let at = stuck.first().copied().unwrap_or(&subset[0]);
            let field = stuck.last().copied().unwrap_or(at);
            return Err(Error::circular_reference(field.as_str(), at.as_str()));
        }

        for level in &mut levels {
            level.sort();
        }

        Ok(levels)
    }

    /// Edges between members of `subset`, where a path leaving the subset and
    /// coming back counts as a direct edge.
    fn restricted_edges<'s>(
        &self,
        subset: &'s IndexSet<FieldId>,
    ) -> IndexMap<&'s FieldId, IndexSet<&'s FieldId>> {
        let mut edges = IndexMap::new();

        for id in subset {
            let Some(start) = self.nodes.get_index_of(id) else {
                continue;
            };

            let mut targets = IndexSet::new();
            let mut stack = vec![start];
            let mut seen = vec![false; self.nodes.len()];

            while let Some(node) = stack.pop() {
                for &next in &self.outgoing[node] {
                    if seen[next] {
                        continue;
                    }
                    seen[next] = true;

                    match subset.get(&self.nodes[next]) {
                        Some(member) => {
                            targets.insert(member);
                        }
                        None => stack.push(next),
                    }
                }
            }

            edges.insert(id, targets);
        }

        edges
    }
}
