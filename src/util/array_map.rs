use std::fmt::{Debug};
use std::hash::{Hash};
use std::marker::{PhantomData};

/**
 * Internally represented as a small integer that is usable as an array index.
 */
pub trait AsUsize: Debug + Copy + Hash + Eq {
    fn as_usize(self) -> usize;
}

/**
 * A map that is implemented as a fixed-length array.
 * This is preferable to a HashMap when the keys are register numbers.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayMap<K: AsUsize, V>(
    Box<[V]>,
    PhantomData<K>,
);

impl<K: AsUsize, V> ArrayMap<K, V> {
    pub fn new(length: usize) -> Self where V: Default {
        Self::new_with(length, Default::default)
    }

    pub fn new_with(length: usize, f: impl Fn() -> V) -> Self {
        ArrayMap(
            (0..length).map(|_| f()).collect(),
            PhantomData,
        )
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: AsUsize, V> std::ops::Index<K> for ArrayMap<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &V {
        &self.0[index.as_usize()]
    }
}

impl<K: AsUsize, V> std::ops::IndexMut<K> for ArrayMap<K, V> {
    fn index_mut(&mut self, index: K) -> &mut V {
        &mut self.0[index.as_usize()]
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
    struct Key(u8);

    impl AsUsize for Key {
        fn as_usize(self) -> usize { self.0 as usize }
    }

    #[test]
    fn index() {
        let mut map: ArrayMap<Key, u32> = ArrayMap::new(4);
        assert_eq!(map.len(), 4);
        map[Key(2)] = 7;
        assert_eq!(map[Key(2)], 7);
        assert_eq!(map[Key(3)], 0);
    }
}
