//! Disjoint-set (union-find) with ordered member lists per root.
//!
//! The merge loop in the cluster builder unions whole clusters while
//! scanning, so this structure keeps each root's members in merge order and
//! never shifts indices out from under an iteration.

/// Union-find over `0..n`, tracking ordered members at each root.
#[derive(Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    /// Meaningful only at roots; drained into the surviving root on union.
    members: Vec<Vec<usize>>,
}

impl DisjointSet {
    /// Create `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            members: (0..n).map(|i| vec![i]).collect(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the structure is empty.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Find the root of `i`, compressing the path.
    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the set rooted at `victim` into the set rooted at `target`.
    ///
    /// Both arguments must be roots. The victim's members are appended to
    /// the target's in order, so the target's first member never changes.
    pub fn union_into(&mut self, target: usize, victim: usize) {
        debug_assert_eq!(self.parent[target], target, "target must be a root");
        debug_assert_eq!(self.parent[victim], victim, "victim must be a root");
        debug_assert_ne!(target, victim);

        self.parent[victim] = target;
        let absorbed = std::mem::take(&mut self.members[victim]);
        self.members[target].extend(absorbed);
    }

    /// Ordered members of the set rooted at `root`.
    pub fn members(&self, root: usize) -> &[usize] {
        &self.members[root]
    }

    /// All current roots, ascending by index.
    ///
    /// Because unions always keep the earlier-scanned root, a root's index
    /// is also its cluster's first member.
    pub fn roots(&mut self) -> Vec<usize> {
        (0..self.parent.len())
            .filter(|&i| self.parent[i] == i)
            .collect()
    }
}
