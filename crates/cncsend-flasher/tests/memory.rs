use cncsend_flasher::{MemoryMap, MemorySegment};

#[test]
fn test_stm32f4_segment_lookup() {
    let map = MemoryMap::stm32f4();

    let small = map.segment_containing(0x0800_0000).expect("16k region");
    assert_eq!(small.sector_size, 16 * 1024);

    let medium = map.segment_containing(0x0801_8000).expect("64k region");
    assert_eq!(medium.sector_size, 64 * 1024);

    let large = map.segment_containing(0x0805_0000).expect("128k region");
    assert_eq!(large.sector_size, 128 * 1024);

    assert!(map.segment_containing(0x0810_0000).is_none());
    assert!(map.segment_containing(0x2000_0000).is_none());
}

#[test]
fn test_sector_alignment_math() {
    let map = MemoryMap::stm32f4();

    let small = *map.segment_containing(0x0800_5000).unwrap();
    assert_eq!(small.sector_start(0x0800_5000), 0x0800_4000);
    assert_eq!(small.sector_end(0x0800_5000), 0x0800_8000);

    // First address of a sector is its own sector start.
    assert_eq!(small.sector_start(0x0800_c000), 0x0800_c000);

    let large = *map.segment_containing(0x0803_0000).unwrap();
    assert_eq!(large.sector_start(0x0803_0000), 0x0802_0000);
    assert_eq!(large.sector_end(0x0803_0000), 0x0804_0000);
}

#[test]
#[should_panic(expected = "nonzero sector size")]
fn test_zero_sector_size_is_rejected_at_construction() {
    MemoryMap::new(vec![MemorySegment {
        start: 0x0800_0000,
        end: 0x0801_0000,
        sector_size: 0,
        eraseable: true,
    }]);
}

#[test]
fn test_segments_are_ordered_by_start() {
    let map = MemoryMap::stm32f4();
    let starts: Vec<u32> = map.segments().iter().map(|s| s.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}
