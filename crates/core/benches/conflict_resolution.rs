use aura_core::calendar::conflict::resolve_conflicts;
use aura_core::calendar::resolve_query_window;
use aura_domain::{Event, EventStatus, QueryRequest};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn sample_events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|idx| {
            let start = base() + Duration::minutes(45 * idx as i64);
            Event {
                id: idx as i64 + 1,
                title: format!("Event {idx}"),
                description: None,
                start_time: start,
                end_time: start + Duration::minutes(60),
                location: None,
                importance: (idx % 5) as u8 + 1,
                status: if idx % 7 == 0 { EventStatus::Cancelled } else { EventStatus::Active },
                created_at: base(),
            }
        })
        .collect()
}

fn bench_resolve_conflicts(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_conflicts");
    for size in [100_usize, 1_000, 10_000] {
        let events = sample_events(size);
        let start = base() + Duration::hours(20);
        let end = start + Duration::hours(6);
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| resolve_conflicts(black_box(events), start, end, Some(3)));
        });
    }
    group.finish();
}

fn bench_query_window(c: &mut Criterion) {
    let request = QueryRequest::default();
    c.bench_function("resolve_query_window_phrase", |b| {
        b.iter(|| resolve_query_window(black_box("what do I have next week?"), &request, base(), 7));
    });
}

criterion_group!(benches, bench_resolve_conflicts, bench_query_window);
criterion_main!(benches);
