use framecast_shm::{FrameLayout, ShmRegion};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Unique region name so parallel bench runs never collide.
pub fn temp_region_name(label: &str) -> String {
    let pid = std::process::id();
    format!("/framecast_bench_{label}_{pid}")
}

/// Deterministic frame payload for benches.
pub fn make_frame(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Creates a fresh exactly-sized region, clearing any leftover name first.
pub fn create_bench_region(label: &str, buffer_size: usize, buffer_count: u32) -> ShmRegion {
    let name = temp_region_name(label);
    let _ = ShmRegion::new(&name).unlink();
    let total = FrameLayout::new(buffer_size, buffer_count)
        .expect("bench geometry")
        .required_size();
    let mut region = ShmRegion::new(&name);
    region
        .create_and_init(total, buffer_size, buffer_count)
        .expect("failed to create bench region");
    region
}

/// Unmaps and unlinks a bench region.
pub fn destroy_bench_region(mut region: ShmRegion) {
    let _ = region.unmap_and_close();
    let _ = region.unlink();
}
