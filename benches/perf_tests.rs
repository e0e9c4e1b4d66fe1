use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsonline_logger::caller::FixedCaller;
use jsonline_logger::{Config, Detail, Logger, Severity};
use std::io;

fn fixed_caller_logger() -> Logger {
    Logger::new(
        Config::builder()
            .caller_resolver(FixedCaller::new("bench::hot_loop"))
            .build(),
    )
}

fn bench_format(c: &mut Criterion) {
    let logger = fixed_caller_logger();
    let details = [
        Detail::new("user", "alice"),
        Detail::new("retries", "3"),
        Detail::new("region", "eu-west-1"),
    ];

    c.bench_function("format_no_details", |b| {
        b.iter(|| logger.format_record(0, black_box(&Severity::INFO), black_box("request served"), &[]))
    });

    c.bench_function("format_three_details", |b| {
        b.iter(|| logger.format_record(0, black_box(&Severity::WARN), black_box("request slow"), &details))
    });

    logger.config().set_escaping(false);
    c.bench_function("format_three_details_raw", |b| {
        b.iter(|| logger.format_record(0, black_box(&Severity::WARN), black_box("request slow"), &details))
    });
}

fn bench_emit(c: &mut Criterion) {
    let logger = fixed_caller_logger();
    let mut sink = io::sink();

    c.bench_function("log_to_sink", |b| {
        b.iter(|| logger.log_to(&mut sink, &Severity::INFO, black_box("request served"), &[]))
    });

    // Stack capture and symbolisation dominate this one.
    let resolving = Logger::default();
    c.bench_function("log_to_sink_backtrace_caller", |b| {
        b.iter(|| resolving.log_to(&mut sink, &Severity::INFO, black_box("request served"), &[]))
    });
}

criterion_group!(benches, bench_format, bench_emit);
criterion_main!(benches);
