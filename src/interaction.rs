use serde::{Deserialize, Serialize};

/// Move the element at `from` so that it ends up at `to`, shifting the
/// elements in between. Returns false when either position is out of range.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

/// Lifecycle of one drag gesture. Nothing is committed until [`DragState::drop`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragState<Id> {
    Idle,
    Dragging { active: Id, over: Option<Id> },
}

impl<Id> Default for DragState<Id> {
    fn default() -> Self {
        DragState::Idle
    }
}

impl<Id: Clone + PartialEq> DragState<Id> {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn start(&mut self, active: Id) {
        *self = DragState::Dragging { active, over: None };
    }

    pub fn hover(&mut self, target: Id) {
        if let DragState::Dragging { over, .. } = self {
            *over = Some(target);
        }
    }

    /// End the gesture. Yields `(active, over)` when the item was dropped on
    /// a different target; the state is back to idle either way.
    pub fn drop(&mut self) -> Option<(Id, Id)> {
        match std::mem::take(self) {
            DragState::Dragging {
                active,
                over: Some(over),
            } if active != over => Some((active, over)),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}

/// Lifecycle of one resize gesture; `current` is the live, uncommitted size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResizeState<Id> {
    Idle,
    Resizing {
        id: Id,
        start_size: u32,
        start_pos: i32,
        current: u32,
    },
}

impl<Id> Default for ResizeState<Id> {
    fn default() -> Self {
        ResizeState::Idle
    }
}

impl<Id: Clone> ResizeState<Id> {
    pub fn is_resizing(&self) -> bool {
        matches!(self, ResizeState::Resizing { .. })
    }

    pub fn start(&mut self, id: Id, start_size: u32, start_pos: i32) {
        *self = ResizeState::Resizing {
            id,
            start_size,
            start_pos,
            current: start_size,
        };
    }

    /// Track the pointer. Returns the live size clamped to `[min, max]`.
    pub fn drag_to(&mut self, pos: i32, min: u32, max: u32) -> Option<u32> {
        match self {
            ResizeState::Resizing {
                start_size,
                start_pos,
                current,
                ..
            } => {
                let size = (*start_size as i64 + (pos as i64 - *start_pos as i64))
                    .clamp(min as i64, max as i64);
                *current = size as u32;
                Some(*current)
            }
            ResizeState::Idle => None,
        }
    }

    pub fn commit(&mut self) -> Option<(Id, u32)> {
        match std::mem::take(self) {
            ResizeState::Resizing { id, current, .. } => Some((id, current)),
            ResizeState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = ResizeState::Idle;
    }
}

/// Ordered, editable list of criteria as assembled in the sidebar before
/// they are applied.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CriteriaList<T> {
    items: Vec<T>,
}

impl<T> Default for CriteriaList<T> {
    fn default() -> Self {
        CriteriaList { items: Vec::new() }
    }
}

impl<T: Clone> CriteriaList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn replace(&mut self, index: usize, item: T) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        move_item(&mut self.items, from, to)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
