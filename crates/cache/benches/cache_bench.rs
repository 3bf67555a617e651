use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tokio::time::Duration;

use ttlmemo_cache::TtlCache;

fn bench_remember_hit_sequential(c: &mut Criterion) {
    let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(60));
    for i in 0..10_000u64 {
        cache.remember(format!("key:{i}"), || i);
    }

    c.bench_function("remember_hit_sequential_10k", |b| {
        b.iter(|| {
            for i in 0..10_000u64 {
                black_box(cache.remember(format!("key:{i}"), || unreachable!()));
            }
        })
    });
}

fn bench_remember_miss_sequential(c: &mut Criterion) {
    c.bench_function("remember_miss_sequential_10k", |b| {
        b.iter(|| {
            let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(60));
            for i in 0..10_000u64 {
                black_box(cache.remember(format!("key:{i}"), || i));
            }
        })
    });
}

fn bench_get_sequential(c: &mut Criterion) {
    let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(60));
    cache.remember("key", || 42);

    c.bench_function("get_sequential_10k", |b| {
        b.iter(|| {
            for _ in 0..10_000 {
                black_box(cache.get("key").ok());
            }
        })
    });
}

fn bench_remember_concurrent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("remember_concurrent_4_tasks_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(60));
                let mut handles = Vec::new();

                for t in 0..4u64 {
                    let cache = cache.clone();
                    handles.push(tokio::spawn(async move {
                        for i in 0..2_500u64 {
                            black_box(cache.remember(format!("key:{}", i % 100), || t));
                        }
                    }));
                }

                for h in handles {
                    h.await.unwrap();
                }
            });
        })
    });
}

criterion_group!(
    benches,
    bench_remember_hit_sequential,
    bench_remember_miss_sequential,
    bench_get_sequential,
    bench_remember_concurrent,
);
criterion_main!(benches);
