//! Device flash memory map
//!
//! Contiguous regions of device flash with their sector sizes and
//! erase permissions. The set of segments is fixed per device family.

use serde::{Deserialize, Serialize};

/// One contiguous region of device flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySegment {
    /// First address of the segment
    pub start: u32,
    /// One past the last address of the segment
    pub end: u32,
    /// Erase granularity within the segment; must be nonzero
    pub sector_size: u32,
    /// Whether sectors in this segment may be erased
    pub eraseable: bool,
}

impl MemorySegment {
    /// Whether `addr` falls inside this segment
    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Base address of the sector containing `addr`
    pub fn sector_start(&self, addr: u32) -> u32 {
        let sector_index = (addr - self.start) / self.sector_size;
        self.start + sector_index * self.sector_size
    }

    /// One past the last address of the sector containing `addr`
    pub fn sector_end(&self, addr: u32) -> u32 {
        self.sector_start(addr) + self.sector_size
    }
}

/// Ordered set of memory segments for one device family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    segments: Vec<MemorySegment>,
}

impl MemoryMap {
    /// Build a map from segments, ordered by start address
    ///
    /// # Panics
    ///
    /// Panics if any segment has a zero `sector_size`; the sector math
    /// divides by it.
    pub fn new(mut segments: Vec<MemorySegment>) -> Self {
        assert!(
            segments.iter().all(|s| s.sector_size > 0),
            "memory segments must have a nonzero sector size"
        );
        segments.sort_by_key(|s| s.start);
        Self { segments }
    }

    /// The segment containing `addr`, if any
    pub fn segment_containing(&self, addr: u32) -> Option<&MemorySegment> {
        self.segments.iter().find(|s| s.contains(addr))
    }

    /// All segments in address order
    pub fn segments(&self) -> &[MemorySegment] {
        &self.segments
    }

    /// Internal flash layout of the STM32F4 parts used on grblHAL boards
    ///
    /// Sector sizes from 0x08000000: 4 x 16 KiB, 1 x 64 KiB, then
    /// 128 KiB sectors up to 1 MiB.
    pub fn stm32f4() -> Self {
        Self::new(vec![
            MemorySegment {
                start: 0x0800_0000,
                end: 0x0801_0000,
                sector_size: 16 * 1024,
                eraseable: true,
            },
            MemorySegment {
                start: 0x0801_0000,
                end: 0x0802_0000,
                sector_size: 64 * 1024,
                eraseable: true,
            },
            MemorySegment {
                start: 0x0802_0000,
                end: 0x0810_0000,
                sector_size: 128 * 1024,
                eraseable: true,
            },
        ])
    }
}
