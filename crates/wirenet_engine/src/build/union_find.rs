//! Disjoint-set forest over arena IDs.

use std::marker::PhantomData;

use crate::arena::ArenaId;

/// A union-find structure whose elements are dense arena IDs.
///
/// `find` uses path halving. `union` keeps the root with the smaller raw
/// index, so the representative of a set is always its oldest member.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind<I: ArenaId> {
    parent: Vec<u32>,
    _marker: PhantomData<I>,
}

impl<I: ArenaId> UnionFind<I> {
    pub(crate) fn new() -> Self {
        Self {
            parent: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Adds a new singleton set and returns its element.
    pub(crate) fn make_set(&mut self) -> I {
        let index = self.parent.len() as u32;
        self.parent.push(index);
        I::from_raw(index)
    }

    pub(crate) fn find(&mut self, id: I) -> I {
        let mut x = id.as_raw() as usize;
        while self.parent[x] as usize != x {
            self.parent[x] = self.parent[self.parent[x] as usize];
            x = self.parent[x] as usize;
        }
        I::from_raw(x as u32)
    }

    /// Merges the sets containing `a` and `b` and returns the new root.
    pub(crate) fn union(&mut self, a: I, b: I) -> I {
        let ra = self.find(a).as_raw();
        let rb = self.find(b).as_raw();
        let (root, child) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[child as usize] = root;
        I::from_raw(root)
    }
}
