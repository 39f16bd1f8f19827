//! Heap blocks and the conflicts recorded next to them

use std::fmt;
use std::rc::Rc;

/// Interned allocation/free tag.
pub type Tag = Rc<str>;

/// One allocation in the append-only log.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapBlock {
    pub start_tick: u32,
    /// [`HeapBlock::ALIVE`] until the matching free is recorded
    pub end_tick: u32,
    pub size: u32,
    pub address: u64,
    pub alloc_tag: Tag,
    pub free_tag: Option<Tag>,
    pub highlighted: bool,
}

impl HeapBlock {
    /// End-tick sentinel for blocks that are still live.
    pub const ALIVE: u32 = u32::MAX;

    pub fn new(start_tick: u32, size: u32, address: u64, alloc_tag: Tag) -> Self {
        HeapBlock {
            start_tick,
            end_tick: Self::ALIVE,
            size,
            address,
            alloc_tag,
            free_tag: None,
            highlighted: false,
        }
    }

    pub fn was_freed(&self) -> bool {
        self.end_tick != Self::ALIVE
    }

    /// One past the last byte, saturating at the top of the address space.
    pub fn end_address(&self) -> u64 {
        self.address.saturating_add(self.size as u64)
    }

    /// Whether `(tick, address)` lies inside the block's rectangle. Both
    /// intervals are closed.
    pub fn contains(&self, tick: u32, address: u64) -> bool {
        tick >= self.start_tick
            && tick <= self.end_tick
            && address >= self.address
            && address <= self.end_address()
    }

    /// Human-readable summary for status lines and load dumps.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "Block {:#x}-{:#x} ({} bytes), allocated at tick {}",
            self.address,
            self.end_address(),
            self.size,
            self.start_tick
        );
        if !self.alloc_tag.is_empty() {
            text.push_str(&format!(" [{}]", self.alloc_tag));
        }
        if self.was_freed() {
            text.push_str(&format!(", freed at tick {}", self.end_tick));
            if let Some(tag) = self.free_tag.as_deref().filter(|tag| !tag.is_empty()) {
                text.push_str(&format!(" [{}]", tag));
            }
        } else {
            text.push_str(", still live");
        }
        text
    }
}

/// Which half of the live-block bookkeeping a record contradicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Malloc of an address that is already live
    Allocation,
    /// Free of an address that is not live
    Free,
}

/// A malloc/free record that disagreed with the live-block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConflict {
    pub tick: u32,
    pub address: u64,
    pub heap_id: u8,
    pub kind: ConflictKind,
}

impl fmt::Display for HeapConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ConflictKind::Allocation => "allocation of live address",
            ConflictKind::Free => "free of unknown address",
        };
        write!(
            f,
            "tick {}: {} {:#x} (heap {})",
            self.tick, what, self.address, self.heap_id
        )
    }
}
