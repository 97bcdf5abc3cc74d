//! Partially ordered set for overload storage.
//!
//! Declarations sharing a name are kept in a poset ordered by how
//! specific their parameter types are. The poset maintains:
//!
//! - the vertex list in topological order (every vertex after its
//!   parents and before its children), which is also the insertion list
//!   walked for code generation;
//! - forward edges from a vertex to its more-specific children and the
//!   matching backward edges;
//! - a colour per vertex and a running colour counter for DFS marking.
//!
//! After every insertion a transitive reduction removes any direct edge
//! whose target is rediscovered through a longer path, keeping the Hasse
//! diagram minimal.
//!
//! Ordering is supplied per call: `le(a, b)` must hold exactly when `a`
//! is at least as specific as `b`, i.e. every call that matches `a` also
//! matches `b`.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A partially ordered set over copyable vertex handles.
#[derive(Debug, Clone)]
pub struct Poset<T> {
    /// Vertices in topological order.
    vertices: Vec<T>,
    /// Forward edges, vertex to more-specific children.
    forwards: FxHashMap<T, Vec<T>>,
    /// Backward edges, vertex to less-specific parents.
    backwards: FxHashMap<T, Vec<T>>,
    /// Vertex colours for DFS marking.
    colours: FxHashMap<T, u32>,
    /// The current colour.
    colour: u32,
}

impl<T: Copy + Eq + Hash> Default for Poset<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Copy + Eq + Hash> Poset<T> {
    /// Creates an empty poset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            forwards: FxHashMap::default(),
            backwards: FxHashMap::default(),
            colours: FxHashMap::default(),
            colour: 0,
        }
    }

    /// The number of vertices.
    #[must_use]
    pub fn len(&self) -> usize { self.vertices.len() }

    /// True when the poset has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }

    /// The vertices in topological order.
    pub fn iter(&self) -> impl Iterator<Item = &T> { self.vertices.iter() }

    /// The more-specific children of a vertex.
    #[must_use]
    pub fn children(&self, v: T) -> &[T] {
        self.forwards.get(&v).map_or(&[], Vec::as_slice)
    }

    /// The less-specific parents of a vertex.
    #[must_use]
    pub fn parents(&self, v: T) -> &[T] {
        self.backwards.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Finds a vertex equivalent to the probe under the given order
    /// (at least as specific in both directions).
    pub fn find_equivalent(&self, v: T, le: &mut dyn FnMut(T, T) -> bool) -> Option<T> {
        self.vertices.iter().copied().find(|&u| u != v && le(u, v) && le(v, u))
    }

    /// Inserts a vertex, wiring edges by the given order and re-running
    /// the transitive reduction.
    pub fn insert(&mut self, v: T, le: &mut dyn FnMut(T, T) -> bool) {
        self.forward(v, le);
        self.backward(v, le);
        self.reduce();
        self.add_vertex(v);
    }

    /// Finds the most-specific matches for a probe.
    ///
    /// A vertex is returned exactly when it matches and no more-specific
    /// child of it matches. `matches` decides whether the probe could
    /// bind to a vertex.
    pub fn match_most_specific(&mut self, matches: &mut dyn FnMut(T) -> bool) -> Vec<T> {
        let mut found = Vec::new();
        self.colour += 1;
        for i in 0..self.vertices.len() {
            let u = self.vertices[i];
            if self.colour_of(u) < self.colour {
                let _ = self.match_from(u, matches, &mut found);
            }
        }
        found
    }

    /// Finds all matches for a probe, more-specific matches first.
    pub fn match_all(&mut self, matches: &mut dyn FnMut(T) -> bool) -> Vec<T> {
        let mut found = Vec::new();
        self.colour += 1;
        for i in 0..self.vertices.len() {
            let u = self.vertices[i];
            if self.colour_of(u) < self.colour {
                self.match_all_from(u, matches, &mut found);
            }
        }
        found
    }

    /// Renders the Hasse diagram in dot format, for diagnostics.
    pub fn dot(&self, label: &mut dyn FnMut(T) -> String) -> String {
        let mut out = String::from("digraph {\n");
        for &v in &self.vertices {
            out.push_str(&format!("  \"{}\"\n", label(v)));
        }
        for (&u, children) in &self.forwards {
            for &v in children {
                out.push_str(&format!("  \"{}\" -> \"{}\"\n", label(u), label(v)));
            }
        }
        out.push_str("}\n");
        out
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn colour_of(&self, v: T) -> u32 { self.colours.get(&v).copied().unwrap_or(0) }

    fn set_colour(&mut self, v: T, colour: u32) {
        let _ = self.colours.insert(v, colour);
    }

    fn add_edge(&mut self, u: T, v: T) {
        self.forwards.entry(u).or_default().push(v);
        self.backwards.entry(v).or_default().push(u);
    }

    fn remove_edge(&mut self, u: T, v: T) {
        if let Some(children) = self.forwards.get_mut(&u)
            && let Some(at) = children.iter().position(|&c| c == v)
        {
            let _ = children.remove(at);
        }
        if let Some(parents) = self.backwards.get_mut(&v)
            && let Some(at) = parents.iter().position(|&p| p == u)
        {
            let _ = parents.remove(at);
        }
    }

    /// Inserts the vertex into the topological list, after every parent
    /// and before every child.
    fn add_vertex(&mut self, v: T) {
        let mut lower = 0usize;
        let mut upper = self.vertices.len();

        for &parent in self.parents(v) {
            if let Some(at) = self.vertices.iter().position(|&x| x == parent) {
                lower = lower.max(at + 1);
            }
        }
        for &child in self.children(v) {
            if let Some(at) = self.vertices.iter().position(|&x| x == child) {
                upper = upper.min(at);
            }
        }
        debug_assert!(lower <= upper, "topological order violated on insert");

        self.vertices.insert(upper.max(lower), v);
        self.set_colour(v, self.colour);
    }

    fn match_from(
        &mut self,
        u: T,
        matches: &mut dyn FnMut(T) -> bool,
        found: &mut Vec<T>,
    ) -> bool {
        let mut deeper = false;
        if self.colour_of(u) < self.colour {
            self.set_colour(u, self.colour);
            if matches(u) {
                // This vertex matches; check whether any vertex in the
                // subgraph beneath it matches more specifically.
                let children = self.children(u).to_vec();
                for child in children {
                    let child_deeper = self.match_from(child, matches, found);
                    deeper = child_deeper || deeper;
                }
                if !deeper {
                    found.push(u);
                    deeper = true;
                }
            }
        }
        deeper
    }

    fn match_all_from(&mut self, u: T, matches: &mut dyn FnMut(T) -> bool, found: &mut Vec<T>) {
        if self.colour_of(u) < self.colour {
            self.set_colour(u, self.colour);
            if matches(u) {
                let children = self.children(u).to_vec();
                for child in children {
                    self.match_all_from(child, matches, found);
                }
                found.push(u);
            }
        }
    }

    /// Wires forward edges for a new vertex: any existing vertex at
    /// least as specific as it becomes a child.
    fn forward(&mut self, v: T, le: &mut dyn FnMut(T, T) -> bool) {
        self.colour += 1;
        for i in 0..self.vertices.len() {
            let u = self.vertices[i];
            if u != v && self.colour_of(u) < self.colour {
                self.forward_from(u, v, le);
            }
        }
    }

    fn forward_from(&mut self, u: T, v: T, le: &mut dyn FnMut(T, T) -> bool) {
        if self.colour_of(u) < self.colour {
            self.set_colour(u, self.colour);
            if le(u, v) {
                self.add_edge(v, u);
            } else {
                let children = self.children(u).to_vec();
                for child in children {
                    self.forward_from(child, v, le);
                }
            }
        }
    }

    /// Wires backward edges for a new vertex: any existing vertex it is
    /// at least as specific as becomes a parent.
    fn backward(&mut self, v: T, le: &mut dyn FnMut(T, T) -> bool) {
        self.colour += 1;
        for i in (0..self.vertices.len()).rev() {
            let u = self.vertices[i];
            if u != v && self.colour_of(u) < self.colour {
                self.backward_from(u, v, le);
            }
        }
    }

    fn backward_from(&mut self, u: T, v: T, le: &mut dyn FnMut(T, T) -> bool) {
        if self.colour_of(u) < self.colour {
            self.set_colour(u, self.colour);
            if le(v, u) {
                self.add_edge(u, v);
            } else {
                let parents = self.parents(u).to_vec();
                for parent in parents {
                    self.backward_from(parent, v, le);
                }
            }
        }
    }

    /// Transitive reduction over the whole graph.
    fn reduce(&mut self) {
        self.colour += 1;
        let stop = self.colour;
        for i in 0..self.vertices.len() {
            let u = self.vertices[i];
            if self.colour_of(u) < stop {
                self.reduce_from(u);
            }
        }
    }

    /// Transitive reduction beneath one vertex: DFS-colour the forward
    /// subgraph, then drop any direct edge whose target was rediscovered
    /// through a longer path.
    fn reduce_from(&mut self, u: T) {
        self.colour += 1;
        let colour = self.colour;

        // Local copy of the forward edges, as they may change.
        let children = self.children(u).to_vec();

        // Depth-first discovery.
        for &child in &children {
            if self.colour_of(child) < colour {
                self.set_colour(child, colour);
            }
            self.reduce_from(child);
        }

        // Remove edges for children that were rediscovered.
        for &child in &children {
            if self.colour_of(child) > colour {
                self.remove_edge(u, child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Divisibility order on integers: `a` is "more specific" than `b`
    /// when `b` divides `a`.
    fn divides(b: u32, a: u32) -> bool { a % b == 0 }

    fn le(a: u32, b: u32) -> bool { divides(b, a) }

    #[test]
    fn insert_keeps_topological_order() {
        let mut poset = Poset::new();
        for v in [4, 2, 12, 1, 6] {
            poset.insert(v, &mut le);
        }
        let order: Vec<u32> = poset.iter().copied().collect();
        for (i, &u) in order.iter().enumerate() {
            for &v in &order[i + 1..] {
                // An earlier vertex is never strictly more specific
                // than a later one.
                assert!(
                    !(le(u, v) && !le(v, u)),
                    "{u} is more specific than {v} but appears before it"
                );
            }
        }
    }

    #[test]
    fn transitive_reduction_removes_shortcuts() {
        let mut poset = Poset::new();
        poset.insert(1, &mut le);
        poset.insert(2, &mut le);
        poset.insert(4, &mut le);
        // 1 -> 2 -> 4; the direct edge 1 -> 4 must have been reduced away.
        assert_eq!(poset.children(1), &[2]);
        assert_eq!(poset.children(2), &[4]);
        assert!(poset.children(4).is_empty());
        assert_eq!(poset.parents(4), &[2]);
    }

    #[test]
    fn match_returns_most_specific() {
        let mut poset = Poset::new();
        for v in [1, 2, 3, 4, 6] {
            poset.insert(v, &mut le);
        }
        // Probe: vertices dividing 12 -> {1, 2, 3, 4, 6}; most specific
        // are 4 and 6.
        let mut found = poset.match_most_specific(&mut |v| 12 % v == 0);
        found.sort_unstable();
        assert_eq!(found, vec![4, 6]);

        // Probe: vertices dividing 8 -> {1, 2, 4}; most specific is 4.
        let found = poset.match_most_specific(&mut |v| 8 % v == 0);
        assert_eq!(found, vec![4]);
    }

    #[test]
    fn match_all_lists_more_specific_first() {
        let mut poset = Poset::new();
        for v in [1, 2, 4] {
            poset.insert(v, &mut le);
        }
        let found = poset.match_all(&mut |v| 4 % v == 0);
        assert_eq!(found, vec![4, 2, 1]);
    }

    #[test]
    fn find_equivalent_detects_duplicates() {
        // Order on the tens digit only, so 21 and 22 are equivalent.
        let mut tens = |a: u32, b: u32| (a / 10) % (b / 10) == 0;
        let mut poset = Poset::new();
        poset.insert(21, &mut tens);
        poset.insert(40, &mut tens);
        assert_eq!(poset.find_equivalent(22, &mut tens), Some(21));
        assert_eq!(poset.find_equivalent(30, &mut tens), None);
    }
}
