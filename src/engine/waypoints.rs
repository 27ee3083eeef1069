use uuid::Uuid;

use crate::entities::Waypoint;

/// Drag progress. The dragged entry is tracked by id, so removals made while
/// dragging never shift the drag onto a neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging(Uuid),
}

impl Default for DragState {
    fn default() -> Self {
        DragState::Idle
    }
}

#[derive(Clone, Debug)]
struct Entry {
    id: Uuid,
    theme_keyword: String,
}

/// Row as rendered in the waypoint editor.
#[derive(Clone, Debug, PartialEq)]
pub struct WaypointItem {
    pub id: Uuid,
    pub order: u32,
    pub theme_keyword: String,
    pub is_dragging: bool,
}

/// Ordered theme keywords. An entry's order is its position plus one, so
/// orders are always exactly `1..=len`.
#[derive(Clone, Debug, Default)]
pub struct WaypointSequence {
    entries: Vec<Entry>,
    drag: DragState,
}

impl WaypointSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sequence = Self::new();
        for keyword in keywords {
            let order = sequence.append();
            sequence.update(order, keyword);
        }
        sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Waypoint::new(entry.theme_keyword.clone(), order_of(index)))
            .collect()
    }

    pub fn items(&self) -> Vec<WaypointItem> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let order = order_of(index);
                WaypointItem {
                    id: entry.id,
                    order,
                    theme_keyword: entry.theme_keyword.clone(),
                    is_dragging: self.drag == DragState::Dragging(entry.id),
                }
            })
            .collect()
    }

    pub fn has_keywords(&self) -> bool {
        self.entries
            .iter()
            .any(|e| !e.theme_keyword.trim().is_empty())
    }

    /// Adds an empty entry at the end and returns its order.
    pub fn append(&mut self) -> u32 {
        self.entries.push(Entry {
            id: Uuid::new_v4(),
            theme_keyword: String::new(),
        });

        let order = order_of(self.entries.len() - 1);
        tracing::debug!(order, "appended waypoint");
        order
    }

    /// Removes the entry; the survivors close the gap. Removing the dragged
    /// entry ends the drag.
    pub fn remove(&mut self, order: u32) -> bool {
        match self.index_of(order) {
            Some(index) => {
                let removed = self.entries.remove(index);
                if self.drag == DragState::Dragging(removed.id) {
                    self.drag = DragState::Idle;
                }
                tracing::debug!(order, remaining = self.entries.len(), "removed waypoint");
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, order: u32, theme_keyword: impl Into<String>) -> bool {
        match self.index_of(order) {
            Some(index) => {
                self.entries[index].theme_keyword = theme_keyword.into();
                true
            }
            None => false,
        }
    }

    /// Moves the dragged entry into the target's slot, shifting the rest.
    pub fn reorder(&mut self, dragged: u32, target: u32) -> bool {
        if dragged == target {
            return false;
        }

        let (from, to) = match (self.index_of(dragged), self.index_of(target)) {
            (Some(from), Some(to)) => (from, to),
            _ => return false,
        };

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);

        tracing::debug!(dragged, target, "reordered waypoints");
        true
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Current order of the dragged entry.
    pub fn dragging(&self) -> Option<u32> {
        match self.drag {
            DragState::Dragging(id) => self.position_of(id).map(order_of),
            DragState::Idle => None,
        }
    }

    pub fn drag_start(&mut self, order: u32) {
        if let Some(index) = self.index_of(order) {
            self.drag = DragState::Dragging(self.entries[index].id);
        }
    }

    /// Completes a drag over `target`. Returns whether the sequence changed.
    pub fn drop_on(&mut self, target: u32) -> bool {
        let dragged = self.dragging();
        self.drag = DragState::Idle;

        match dragged {
            Some(dragged) => self.reorder(dragged, target),
            None => false,
        }
    }

    pub fn drag_cancel(&mut self) {
        self.drag = DragState::Idle;
    }

    fn position_of(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn index_of(&self, order: u32) -> Option<usize> {
        let index = (order as usize).checked_sub(1)?;
        (index < self.entries.len()).then(|| index)
    }
}

fn order_of(index: usize) -> u32 {
    index as u32 + 1
}
