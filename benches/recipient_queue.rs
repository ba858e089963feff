//! RecipientQueue / InflightCounter 性能基准测试（内存后端）

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mailshot::dispatch::{InflightCounter, RecipientQueue};
use mailshot::store::{KeySpace, KvStore, MemoryStore};
use std::sync::Arc;

fn recipients(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("user{}@example.com", i)).collect()
}

fn create_queue() -> (RecipientQueue, InflightCounter) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let keys = KeySpace::new("bench:");
    (
        RecipientQueue::new(store.clone(), keys.clone()),
        InflightCounter::new(store, keys),
    )
}

/// 不同规模的收件人列表写入
fn bench_seed(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (queue, _) = create_queue();
    let mut group = c.benchmark_group("queue/seed");

    for size in [1_000, 10_000, 100_000] {
        let list = Arc::new(recipients(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &list, |b, list| {
            b.to_async(&rt).iter(|| {
                let q = queue.clone();
                let list = Arc::clone(list);
                async move { q.seed("c1", &list).await.unwrap() }
            });
        });
    }
    group.finish();
}

/// 按 chunk 弹出，空了就重新填充
fn bench_pop_chunk(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (queue, _) = create_queue();
    let list = Arc::new(recipients(10_000));
    let mut group = c.benchmark_group("queue/pop_chunk");

    for chunk in [10, 30, 100] {
        group.throughput(Throughput::Elements(chunk as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.to_async(&rt).iter(|| {
                let q = queue.clone();
                let list = Arc::clone(&list);
                async move {
                    let popped = q.pop_chunk("c1", chunk).await.unwrap();
                    if popped.len() < chunk {
                        q.seed("c1", &list).await.unwrap();
                    }
                }
            });
        });
    }
    group.finish();
}

/// 模拟一次 chunk 生命周期：弹出、计数、放回、递减
fn bench_chunk_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (queue, inflight) = create_queue();
    let list = Arc::new(recipients(1_000));
    rt.block_on(queue.seed("c1", &list)).unwrap();

    c.bench_function("queue/chunk_cycle", |b| {
        b.to_async(&rt).iter(|| {
            let q = queue.clone();
            let counter = inflight.clone();
            let list = Arc::clone(&list);
            async move {
                let chunk = q.pop_chunk("c1", 30).await.unwrap();
                counter.increment("c1").await.unwrap();
                q.push_front("c1", &chunk[15..]).await.unwrap();
                counter.decrement("c1").await.unwrap();
                if q.remaining("c1").await.unwrap() < 30 {
                    q.seed("c1", &list).await.unwrap();
                }
            }
        });
    });
}

criterion_group!(benches, bench_seed, bench_pop_chunk, bench_chunk_cycle);
criterion_main!(benches);
