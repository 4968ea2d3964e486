use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use framecast_image::{ImageFormat, ImageRegion};
use framecast_perf::{create_bench_region, destroy_bench_region, make_frame, temp_region_name};
use framecast_shm::{FrameLayout, VersionCounter, now_micros};

const BUFFER_SIZE: usize = 1 << 20;
const BUFFER_COUNT: u32 = 3;
const FRAME_LEN: usize = 64 * 1024;

fn bench_write_and_switch(c: &mut Criterion) {
    let region = create_bench_region("write_switch", BUFFER_SIZE, BUFFER_COUNT);
    let frame = make_frame(FRAME_LEN);
    let versions = VersionCounter::new();

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Bytes(FRAME_LEN as u64));

    group.bench_function("write_and_switch", |b| {
        b.iter(|| region.write_and_switch(black_box(&frame), versions.next()));
    });

    drop(group);
    destroy_bench_region(region);
}

fn bench_zero_copy_publish(c: &mut Criterion) {
    let region = create_bench_region("zero_copy", BUFFER_SIZE, BUFFER_COUNT);
    let frame = make_frame(FRAME_LEN);
    let versions = VersionCounter::new();

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Bytes(FRAME_LEN as u64));

    group.bench_function("acquire_fill_commit", |b| {
        b.iter(|| {
            let mut guard = region
                .acquire_write_buffer(FRAME_LEN)
                .expect("acquire write buffer");
            guard.as_mut_slice()[..FRAME_LEN].copy_from_slice(black_box(&frame));
            guard
                .commit(FRAME_LEN, versions.next(), now_micros())
                .expect("commit");
        });
    });

    drop(group);
    destroy_bench_region(region);
}

fn bench_try_read_hot(c: &mut Criterion) {
    let region = create_bench_region("read_hot", BUFFER_SIZE, BUFFER_COUNT);
    let frame = make_frame(FRAME_LEN);
    region
        .write_and_switch(&frame, 1)
        .expect("seed frame");
    let mut out = vec![0u8; FRAME_LEN];

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Bytes(FRAME_LEN as u64));

    group.bench_function("try_read_latest (hot)", |b| {
        b.iter(|| black_box(region.try_read_latest(&mut out)));
    });

    drop(group);
    destroy_bench_region(region);
}

fn bench_try_read_empty(c: &mut Criterion) {
    let region = create_bench_region("read_empty", BUFFER_SIZE, BUFFER_COUNT);
    let mut out = vec![0u8; FRAME_LEN];

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_read_latest (empty)", |b| {
        b.iter(|| black_box(region.try_read_latest(&mut out)));
    });

    drop(group);
    destroy_bench_region(region);
}

fn bench_round_trip(c: &mut Criterion) {
    let region = create_bench_region("round_trip", BUFFER_SIZE, BUFFER_COUNT);
    let frame = make_frame(FRAME_LEN);
    let versions = VersionCounter::new();
    let mut out = vec![0u8; FRAME_LEN];

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Bytes(FRAME_LEN as u64));

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            region
                .write_and_switch(black_box(&frame), versions.next())
                .expect("write");
            black_box(region.try_read_latest(&mut out)).expect("read");
        });
    });

    drop(group);
    destroy_bench_region(region);
}

fn bench_framed_round_trip(c: &mut Criterion) {
    let name = temp_region_name("framed");
    let _ = framecast_shm::ShmRegion::new(&name).unlink();
    let total = FrameLayout::new(BUFFER_SIZE, BUFFER_COUNT)
        .expect("bench geometry")
        .required_size();
    let mut region = ImageRegion::new(&name);
    region
        .create_and_init(total, BUFFER_SIZE, BUFFER_COUNT)
        .expect("failed to create framed bench region");

    let frame = make_frame(FRAME_LEN);
    let versions = VersionCounter::new();
    let mut out = vec![0u8; FRAME_LEN];

    let mut group = c.benchmark_group("image");
    group.throughput(Throughput::Bytes(FRAME_LEN as u64));

    group.bench_function("write_read_image", |b| {
        b.iter(|| {
            region
                .write_image(
                    black_box(&frame),
                    640,
                    480,
                    2,
                    versions.next(),
                    ImageFormat::Yuyv,
                    0,
                )
                .expect("write_image");
            black_box(region.read_image(&mut out)).expect("read_image");
        });
    });

    drop(group);
    let _ = region.unmap_and_close();
    let _ = region.unlink();
}

criterion_group!(
    benches,
    bench_write_and_switch,
    bench_zero_copy_publish,
    bench_try_read_hot,
    bench_try_read_empty,
    bench_round_trip,
    bench_framed_round_trip,
);
criterion_main!(benches);
