//! Per-clip pipeline benchmarks
//!
//! Clips are KTH-sized (160 × 120) synthetic gradients so the numbers
//! are comparable to a real training run.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use patchvol::assembly::Assembler;
use patchvol::config::ExtractionConfig;
use patchvol::sampling::{extract, flatten, ClipSeeds, MarginPolicy, Packing, PatchSampler, PatchSize};
use patchvol::source::{SyntheticClip, SyntheticLoader, SyntheticSpec};
use patchvol::volume::VolumeBuilder;
use std::path::PathBuf;

fn kth_clip() -> SyntheticSpec {
    SyntheticSpec::gradient(160, 120, 60)
}

fn bench_volume_build(c: &mut Criterion) {
    let builder = VolumeBuilder::new(16);

    let mut group = c.benchmark_group("volume_build");
    group.throughput(Throughput::Elements(kth_clip().frames as u64));
    group.bench_function("kth_160x120x60", |b| {
        b.iter(|| {
            let mut clip = SyntheticClip::new(kth_clip());
            builder.load(black_box(&mut clip)).unwrap()
        })
    });
    group.finish();
}

fn bench_extract_flatten(c: &mut Criterion) {
    let mut clip = SyntheticClip::new(kth_clip());
    let volume = VolumeBuilder::new(16).load(&mut clip).unwrap();
    let dims = (volume.width(), volume.height(), volume.depth());

    let mut group = c.benchmark_group("extract_flatten");
    for packing in [Packing::RowMajor, Packing::ColumnMajor] {
        let size = PatchSize::new(16, 10);
        let sampler = PatchSampler::new(size, MarginPolicy::default());
        let anchors = sampler
            .sample(dims, 40, &mut ClipSeeds::from_master(7).for_clip(0))
            .unwrap();

        group.throughput(Throughput::Elements(anchors.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("patches_40", format!("{packing:?}")),
            &anchors,
            |b, anchors| {
                b.iter(|| {
                    for &anchor in anchors {
                        let patch = extract(&volume, anchor, size).unwrap();
                        black_box(flatten(&patch, packing));
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let loader = SyntheticLoader::new(kth_clip());
    let clips: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("clip-{i}"))).collect();

    let mut group = c.benchmark_group("assemble");
    group.sample_size(10);
    for workers in [1, 4] {
        let config = ExtractionConfig {
            seed: Some(1),
            workers,
            ..ExtractionConfig::new(16, 10, 40)
        };
        group.bench_with_input(BenchmarkId::new("clips_8", workers), &config, |b, config| {
            b.iter(|| {
                Assembler::new(&loader, config.clone())
                    .assemble(black_box(&clips))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_volume_build, bench_extract_flatten, bench_assemble);
criterion_main!(benches);
