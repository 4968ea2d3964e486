/// Wall-clock microseconds since the Unix epoch.
///
/// This is the timestamp committed alongside every frame published through
/// the copy-based and image layers.
#[inline(always)]
pub fn now_micros() -> u64 {
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap();
    t.as_micros() as u64
}
