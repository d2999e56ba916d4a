//! Pointer driven reordering of plan entries, independent of any toolkit.
//!
//! The caller reports vertical spans of the rows that are not being dragged
//! (in their current on-screen order, placeholder excluded) and the pointer
//! position; the controller tracks where the placeholder belongs and produces
//! the final key order on release.

use crate::draft::EntryKey;

/// Vertical extent of a row in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f32,
    pub height: f32,
}

impl Span {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn mid(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Index at which a dragged row lands: before the first row whose midpoint is
/// below the pointer, or at the end.
pub fn insertion_index(pointer_y: f32, others: &[Span]) -> usize {
    others
        .iter()
        .position(|s| pointer_y < s.mid())
        .unwrap_or(others.len())
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    key: EntryKey,
    original_index: usize,
    others: Vec<EntryKey>,
    placeholder: usize,
    grab_offset: f32,
    height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct DragReorder {
    active: Option<ActiveDrag>,
}

impl DragReorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_key(&self) -> Option<&EntryKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    /// Height of the dragged row, used to size the placeholder.
    pub fn dragged_height(&self) -> Option<f32> {
        self.active.as_ref().map(|a| a.height)
    }

    /// Begin dragging `key` out of `order`.
    ///
    /// Returns false (and does nothing) when there is nothing to reorder or
    /// the key is not part of `order`.
    pub fn start(&mut self, order: &[EntryKey], key: &EntryKey, item: Span, pointer_y: f32) -> bool {
        if order.len() <= 1 {
            return false;
        }
        let Some(original_index) = order.iter().position(|k| k == key) else {
            return false;
        };
        let others: Vec<EntryKey> = order.iter().filter(|k| *k != key).cloned().collect();
        log::debug!("Drag started for entry {key} at index {original_index}");
        self.active = Some(ActiveDrag {
            key: key.clone(),
            original_index,
            others,
            placeholder: original_index,
            grab_offset: pointer_y - item.top,
            height: item.height,
        });
        true
    }

    /// Move the placeholder according to the pointer. `others` must list the
    /// spans of the non-dragged rows in the order given by [`Self::others`].
    pub fn update(&mut self, pointer_y: f32, others: &[Span]) -> Option<usize> {
        let active = self.active.as_mut()?;
        active.placeholder = insertion_index(pointer_y, others).min(active.others.len());
        Some(active.placeholder)
    }

    /// Keys of the rows not being dragged, in their current order.
    pub fn others(&self) -> &[EntryKey] {
        self.active.as_ref().map(|a| a.others.as_slice()).unwrap_or(&[])
    }

    pub fn placeholder_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.placeholder)
    }

    /// Top edge for the floating row, clamped to the container.
    pub fn floating_top(&self, pointer_y: f32, container_height: f32) -> Option<f32> {
        let active = self.active.as_ref()?;
        let max_top = (container_height - active.height).max(0.0);
        Some((pointer_y - active.grab_offset).clamp(0.0, max_top))
    }

    /// Order as it would be committed right now.
    pub fn preview(&self) -> Option<Vec<EntryKey>> {
        let active = self.active.as_ref()?;
        let mut order = active.others.clone();
        order.insert(active.placeholder, active.key.clone());
        Some(order)
    }

    /// Finish the drag and return the new key order to pass to `reorder`.
    pub fn release(&mut self) -> Option<Vec<EntryKey>> {
        let order = self.preview();
        if let Some(active) = self.active.take() {
            log::debug!(
                "Drag released: entry {} moved {} -> {}",
                active.key,
                active.original_index,
                active.placeholder
            );
        }
        order
    }

    /// Abort the drag; the original order stays in place.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            log::debug!("Drag cancelled for entry {}", active.key);
        }
    }
}
