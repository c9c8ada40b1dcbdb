use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use respcache::Cache;

fn keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("/static/file{}.html", i).into_bytes()).collect()
}

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_1kb_cached", |b| {
        let mut cache = Cache::new(1000, 0).unwrap();
        let data = vec![b'x'; 1024];
        let keys = keys(100);

        for key in &keys {
            cache.put(key, "text/html", &data).unwrap();
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.get(&keys[counter % 100]).map(|e| e.payload_len()));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_get_50_put", |b| {
        let mut cache = Cache::new(1000, 0).unwrap();
        let data = vec![b'x'; 1024];
        let keys = keys(2000);

        for key in &keys[..100] {
            cache.put(key, "text/html", &data).unwrap();
        }

        let mut counter = 0usize;
        b.iter(|| {
            let key = &keys[counter % keys.len()];
            if counter % 2 == 0 {
                black_box(cache.get(key).is_some());
            } else {
                black_box(cache.put(key, "text/html", &data).ok());
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_1kb_evicting", |b| {
        let mut cache = Cache::new(10, 0).unwrap(); // Small cache
        let data = vec![b'x'; 1024];
        let keys = keys(100);

        let mut counter = 0;
        b.iter(|| {
            // Every put past the first 10 evicts the tail
            black_box(cache.put(&keys[counter % 100], "text/html", &data).ok());
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_get,
    bench_mixed_50_50,
    bench_eviction_churn
);
criterion_main!(benches);
