use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use xsum::gate::Gate;
use xsum::hash::{Blake3Provider, HashProvider, Sha256Provider};
use xsum::mask::Mask;
use xsum::walker::walk;

fn bench_hash_providers(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_providers");

    let sizes = [16, 1024, 100_000];
    for size in sizes {
        let data = vec![0u8; size];

        let sha256 = Sha256Provider;
        group.bench_with_input(BenchmarkId::new("sha256_data", size), &size, |b, _| {
            b.iter(|| sha256.data(&mut black_box(&data[..])))
        });

        let blake3 = Blake3Provider;
        group.bench_with_input(BenchmarkId::new("blake3_data", size), &size, |b, _| {
            b.iter(|| blake3.data(&mut black_box(&data[..])))
        });
    }

    group.finish();
}

fn bench_single_file_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_file_walk");

    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("file.bin");
    std::fs::write(&file_path, vec![0u8; 1_000_000]).unwrap();

    let hasher = Sha256Provider;
    let mask = Mask::parse("0000").unwrap();
    let gate = Gate::sized_to_cpus();

    group.bench_function("walk_1mb_file", |b| {
        b.iter(|| walk(black_box(&file_path), false, &gate, &mask, &hasher).unwrap())
    });

    group.finish();
}

fn bench_directory_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("directory_walk");

    let temp_dir = TempDir::new().unwrap();
    for i in 0..50 {
        std::fs::write(
            temp_dir.path().join(format!("file{i}.txt")),
            format!("content {i}"),
        )
        .unwrap();
    }
    let subdir = temp_dir.path().join("subdir");
    std::fs::create_dir(&subdir).unwrap();
    for i in 0..20 {
        std::fs::write(subdir.join(format!("sub{i}.txt")), format!("sub {i}")).unwrap();
    }

    let hasher = Sha256Provider;
    let mask = Mask::parse("0000").unwrap();
    let gate = Gate::sized_to_cpus();

    group.bench_function("walk_flat_and_nested_tree", |b| {
        b.iter(|| walk(black_box(temp_dir.path()), false, &gate, &mask, &hasher).unwrap())
    });

    let mask_full = Mask::parse("0777ugsmcx").unwrap();
    group.bench_function("walk_with_full_mask", |b| {
        b.iter(|| walk(black_box(temp_dir.path()), false, &gate, &mask_full, &hasher).unwrap())
    });

    group.finish();
}

fn bench_deep_tree_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_tree_walk");

    let temp_dir = TempDir::new().unwrap();
    let mut current = temp_dir.path().to_path_buf();
    for i in 0..32 {
        current = current.join(format!("d{i}"));
        std::fs::create_dir(&current).unwrap();
    }
    std::fs::write(current.join("leaf.txt"), b"leaf").unwrap();

    let hasher = Sha256Provider;
    let mask = Mask::parse("0000").unwrap();
    let narrow_gate = Gate::new(2);

    group.bench_function("walk_32_deep_with_2_permits", |b| {
        b.iter(|| walk(black_box(temp_dir.path()), false, &narrow_gate, &mask, &hasher).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_providers,
    bench_single_file_walk,
    bench_directory_walk,
    bench_deep_tree_walk
);
criterion_main!(benches);
