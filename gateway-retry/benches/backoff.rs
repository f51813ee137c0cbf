use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gateway_retry::gateway::{CloseStatus, FailureCause};
use gateway_retry::reconnection::{
    ReconnectContext, RetryEngine, RetryPolicy, compute_backoff, compute_jitter,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MIN: Duration = Duration::from_secs(2);
const MAX: Duration = Duration::from_secs(120);

fn bench_compute_backoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_backoff");

    for iteration in [0u64, 5, 63, u64::MAX].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(iteration),
            iteration,
            |b, &iteration| {
                b.iter(|| compute_backoff(black_box(iteration), MIN, MAX));
            },
        );
    }

    group.finish();
}

fn bench_compute_jitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_jitter");

    for factor in [0.0, 0.1, 0.5, 1.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(factor), factor, |b, &factor| {
            let next = Duration::from_secs(8);
            b.iter(|| compute_jitter(black_box(next), MIN, MAX, factor));
        });
    }

    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    let cases = [
        ("resume", FailureCause::close(CloseStatus::ABNORMAL_CLOSE)),
        ("reconnect", FailureCause::close(CloseStatus::from_code(4000))),
        ("terminal", FailureCause::close(CloseStatus::from_code(4004))),
        ("invalid_session", FailureCause::InvalidSession),
    ];

    for (name, cause) in cases {
        group.bench_function(name, |b| {
            let context = ReconnectContext::new();
            let engine = RetryEngine::new(RetryPolicy::default(), context.clone());
            b.iter(|| {
                context.reset();
                let _ = black_box(engine.decide(Some(cause.clone())));
            });
        });
    }

    group.finish();
}

fn bench_on_failure(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let context = ReconnectContext::new();
    let engine = RetryEngine::new(RetryPolicy::default(), context.clone());
    let cancel = CancellationToken::new();

    c.bench_function("on_failure_immediate_resume", |b| {
        b.to_async(&rt).iter(|| async {
            // The first resume of an outage never waits.
            context.reset();
            let signal = engine
                .on_failure(Some(FailureCause::message("reset by peer")), &cancel)
                .await
                .unwrap();
            black_box(signal);
        });
    });
}

criterion_group!(
    benches,
    bench_compute_backoff,
    bench_compute_jitter,
    bench_decide,
    bench_on_failure
);
criterion_main!(benches);
