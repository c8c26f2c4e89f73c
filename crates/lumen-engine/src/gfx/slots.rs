use std::collections::BTreeMap;

/// Handle-indexed storage for backend objects.
///
/// Ids are allocated monotonically and never reused, so a stale handle can
/// never alias a newer object.
#[derive(Debug)]
pub struct Slots<T> {
    next: u32,
    items: BTreeMap<u32, T>,
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self {
            next: 1,
            items: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        self.items.insert(id, value);
        id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&T> {
        self.items.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    #[inline]
    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.items.remove(&id)
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.items.iter().map(|(id, v)| (*id, v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self::new()
    }
}
