/*****************************************************************************************[watch.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use crate::intmap::{AsIndex, IntMap, IntMapBool};
use smallvec::SmallVec;
use std::ops;

/// Predicate deciding whether a stored occurrence is logically deleted.
pub trait DeletePred<V> {
    fn deleted(&self, v: &V) -> bool;
}

pub type OccVec<V> = SmallVec<[V; 4]>;

/// Occurrence lists: for each key `K` (a literal), the values `V` (watcher
/// entries) mentioning it. Deletion is lazy: a list is only `smudge`d when
/// one of its entries dies, and filtered the next time it is looked up or
/// when `clean_all` runs.
#[derive(Debug, Clone)]
pub struct OccListsData<K: AsIndex, V> {
    occs: IntMap<K, OccVec<V>>,
    dirty: IntMapBool<K>,
    dirties: Vec<K>, // keys to examine in `clean_all_pred`
}

impl<K: AsIndex, V> OccListsData<K, V> {
    pub fn new() -> Self {
        Self {
            occs: IntMap::new(),
            dirty: IntMapBool::new(),
            dirties: Vec::new(),
        }
    }

    /// Initialize the occurrence list for `idx`.
    pub fn init(&mut self, idx: K) {
        self.occs.reserve_default(idx);
        self.occs[idx].clear();
        self.dirty.reserve(idx);
    }

    /// Pair the lists with a deletion predicate to obtain the full interface.
    pub fn promote<P: DeletePred<V>>(&mut self, pred: P) -> OccLists<K, V, P> {
        OccLists { data: self, pred }
    }

    /// Up-to-date list for `idx`: cleaned first if it was smudged.
    pub fn lookup_mut_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) -> &mut OccVec<V> {
        if self.dirty[idx] {
            self.clean_pred(idx, pred);
        }
        &mut self.occs[idx]
    }

    /// Drop deleted entries from every smudged list.
    pub fn clean_all_pred<P: DeletePred<V>>(&mut self, pred: &P) {
        for &x in &self.dirties {
            // `dirties` may contain duplicates, check the flag again
            if self.dirty[x] {
                self.occs[x].retain(|v| !pred.deleted(v));
                self.dirty.set(x, false);
            }
        }
        self.dirties.clear();
    }

    pub fn clean_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) {
        self.occs[idx].retain(|v| !pred.deleted(v));
        self.dirty.set(idx, false);
    }

    /// Mark `idx` as containing deleted entries, to be cleaned later.
    pub fn smudge(&mut self, idx: K) {
        if !self.dirty[idx] {
            self.dirty.insert(idx);
            self.dirties.push(idx);
        }
    }
}

impl<K: AsIndex, V> ops::Index<K> for OccListsData<K, V> {
    type Output = OccVec<V>;
    fn index(&self, index: K) -> &Self::Output {
        &self.occs[index]
    }
}

impl<K: AsIndex, V> ops::IndexMut<K> for OccListsData<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.occs[index]
    }
}

/// Occurrence lists together with their deletion predicate.
pub struct OccLists<'a, K: AsIndex, V, P: DeletePred<V>> {
    data: &'a mut OccListsData<K, V>,
    pred: P,
}

impl<'a, K: AsIndex, V, P: DeletePred<V>> OccLists<'a, K, V, P> {
    pub fn lookup_mut(&mut self, idx: K) -> &mut OccVec<V> {
        self.data.lookup_mut_pred(idx, &self.pred)
    }

    pub fn clean_all(&mut self) {
        self.data.clean_all_pred(&self.pred)
    }
}

impl<'a, K: AsIndex, V, P: DeletePred<V>> ops::Deref for OccLists<'a, K, V, P> {
    type Target = OccListsData<K, V>;
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<'a, K: AsIndex, V, P: DeletePred<V>> ops::DerefMut for OccLists<'a, K, V, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    struct K(usize);
    impl AsIndex for K {
        fn as_index(self) -> usize {
            self.0
        }
        fn from_index(index: usize) -> Self {
            K(index)
        }
    }

    struct Dead<'a>(&'a [bool]);
    impl<'a> DeletePred<u32> for Dead<'a> {
        fn deleted(&self, v: &u32) -> bool {
            self.0[*v as usize]
        }
    }

    #[test]
    fn test_smudge_and_clean() {
        let mut data: OccListsData<K, u32> = OccListsData::new();
        data.init(K(0));
        data.init(K(1));
        data[K(0)].push(0);
        data[K(0)].push(1);
        data[K(1)].push(2);

        let dead = [true, false, false];
        data.smudge(K(0));
        data.smudge(K(0)); // duplicate smudge is fine

        // lazy: nothing removed until a lookup or a full clean
        assert_eq!(data[K(0)].len(), 2);
        assert_eq!(data.lookup_mut_pred(K(0), &Dead(&dead)).as_slice(), &[1u32][..]);

        data.smudge(K(1));
        data.clean_all_pred(&Dead(&dead));
        assert_eq!(data[K(1)].len(), 1);
    }
}
