//! Performance benchmarks for value conversion across the bridge.
//!
//! - Scalars: text, bytes, integers, floats
//! - Containers: flat and nested sequences and maps
//! - Dispatch: objects without a native host shape
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use clownfish::prelude::*;
use clownfish::runtime::class;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print accumulated top-level scope timings.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };

    let view = frame_view.lock();
    let scope_collection = view.scope_collection();
    let mut scope_timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;

    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread_info, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                        *scope_timings.entry(details.name().to_string()).or_insert(0) +=
                            scope.record.duration_ns;
                    }
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({} frames) ===", frame_count);
    let mut entries: Vec<_> = scope_timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg_ns = if frame_count > 0 { ns / frame_count } else { ns };
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg_ns as u64)
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

fn nested_value(depth: usize, width: usize) -> Value {
    if depth == 0 {
        return Value::from("leaf");
    }
    let children: Vec<Value> = (0..width).map(|_| nested_value(depth - 1, width)).collect();
    (0..width)
        .map(|i| (format!("k{i}"), Value::Seq(children.clone())))
        .collect()
}

fn scalar_benchmarks(c: &mut Criterion) {
    setup_profiler();
    clownfish::init();

    let mut group = c.benchmark_group("convert/scalars");

    for len in [16usize, 1024, 64 * 1024] {
        let text = Value::Text("x".repeat(len));
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("text_round_trip", len), &text, |b, text| {
            b.iter(|| {
                let obj = host_to_foreign(black_box(text), Some(&class::STRING), false).unwrap();
                let back = foreign_to_host(obj.as_ref());
                end_profiling_frame();
                black_box(back)
            });
        });

        let bytes = Value::bytes(vec![0u8; len]);
        group.bench_with_input(BenchmarkId::new("bytes_round_trip", len), &bytes, |b, bytes| {
            b.iter(|| {
                let obj = host_to_foreign(black_box(bytes), Some(&class::BLOB), false).unwrap();
                black_box(foreign_to_host(obj.as_ref()))
            });
        });
    }

    group.throughput(Throughput::Elements(1));
    group.bench_function("integer_round_trip", |b| {
        b.iter(|| {
            let obj = to_foreign(black_box(i64::MIN), Some(&class::INTEGER), false).unwrap();
            black_box(from_foreign::<i64>(obj.as_ref()).unwrap())
        });
    });
    group.bench_function("u64_range_check", |b| {
        b.iter(|| black_box(to_foreign(black_box(u64::MAX), None, false).is_err()));
    });
    group.bench_function("float_round_trip", |b| {
        b.iter(|| {
            let obj = to_foreign(black_box(f64::NAN), Some(&class::FLOAT), false).unwrap();
            black_box(from_foreign::<f64>(obj.as_ref()).unwrap())
        });
    });

    group.finish();
    print_profiling_stats();
}

fn container_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("convert/containers");

    for len in [8usize, 256, 4096] {
        let seq: Value = (0..len as i64).map(Value::Int).collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("flat_seq", len), &seq, |b, seq| {
            b.iter(|| {
                let obj = host_to_foreign(black_box(seq), None, false).unwrap();
                end_profiling_frame();
                black_box(foreign_to_host(obj.as_ref()))
            });
        });

        let map: Value = (0..len).map(|i| (format!("key{i}"), Value::Int(i as i64))).collect();
        group.bench_with_input(BenchmarkId::new("flat_map", len), &map, |b, map| {
            b.iter(|| {
                let obj = host_to_foreign(black_box(map), None, false).unwrap();
                black_box(foreign_to_host(obj.as_ref()))
            });
        });
    }

    let nested = nested_value(3, 6);
    group.bench_function("nested_depth3_width6", |b| {
        b.iter(|| {
            let obj = host_to_foreign(black_box(&nested), None, false).unwrap();
            end_profiling_frame();
            black_box(foreign_to_host(obj.as_ref()))
        });
    });

    group.finish();
    print_profiling_stats();
}

fn object_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("convert/objects");

    let err = ErrObj::new("benchmark");
    group.bench_function("dispatch_err", |b| {
        b.iter(|| black_box(foreign_to_host(Some(black_box(err.obj())))));
    });

    let held = Value::from(Str::new("held"));
    group.bench_function("share_held_object", |b| {
        b.iter(|| black_box(host_to_foreign(black_box(&held), None, false).unwrap()));
    });

    group.bench_function("trap_foreign_exception", |b| {
        b.iter(|| black_box(run_trapped::<()>(|| throw_foreign("bench")).is_err()));
    });

    group.finish();
    print_profiling_stats();
}

criterion_group!(
    benches,
    scalar_benchmarks,
    container_benchmarks,
    object_benchmarks
);
criterion_main!(benches);
