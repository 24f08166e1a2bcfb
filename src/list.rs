/// Append-only arena addressed by `i32` slot index.
///
/// Slots are never freed: the tree only ever grows, so an index handed out by
/// [`List::push`] stays valid for the lifetime of the list.
#[derive(Clone, Debug)]
pub struct List<T> {
    data: Vec<T>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    pub fn with_capacity(capacity: i32) -> Self {
        Self {
            data: Vec::with_capacity(capacity.max(0) as usize),
        }
    }

    pub fn size(&self) -> i32 {
        self.data.len() as i32
    }

    pub fn get(&self, index: i32) -> &T {
        debug_assert!(index >= 0 && index < self.size());
        &self.data[index as usize]
    }

    pub fn get_mut(&mut self, index: i32) -> &mut T {
        debug_assert!(index >= 0 && index < self.size());
        &mut self.data[index as usize]
    }

    /// Overwrites a slot, handing back what was there.
    pub fn replace(&mut self, index: i32, element: T) -> T {
        debug_assert!(index >= 0 && index < self.size());
        std::mem::replace(&mut self.data[index as usize], element)
    }

    pub fn push(&mut self, element: T) -> i32 {
        let index = self.size();
        self.data.push(element);
        index
    }
}
