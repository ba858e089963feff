//! 点击幂等键与机器人判断性能基准测试

use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use mailshot::tracking::{BotDetector, idempotency_key};
use std::hint::black_box;

fn bench_idempotency_key(c: &mut Criterion) {
    let at = Utc.timestamp_opt(1_700_000_003, 0).single().unwrap();

    c.bench_function("idempotency/key", |b| {
        b.iter(|| {
            idempotency_key(
                black_box("3f2c9a1e-6d4b-4f7a-9a55-0c1d2e3f4a5b"),
                black_box("8b7e6d5c-4a3b-2c1d-0e9f-8a7b6c5d4e3f"),
                black_box(at),
                5,
            )
        });
    });
}

fn bench_bot_detection(c: &mut Criterion) {
    let detector = BotDetector::default();
    let browser =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Version/17.0 Safari/605.1.15";
    let bot = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    c.bench_function("bot/browser", |b| {
        b.iter(|| detector.is_probable_bot(true, black_box(Some(browser))));
    });
    c.bench_function("bot/crawler", |b| {
        b.iter(|| detector.is_probable_bot(true, black_box(Some(bot))));
    });
}

criterion_group!(benches, bench_idempotency_key, bench_bot_detection);
criterion_main!(benches);
