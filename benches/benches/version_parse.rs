use criterion::{criterion_group, criterion_main, Criterion};
use wpkg::version::Version;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_parse");

    group.bench_function("simple", |b| {
        b.iter(|| {
            let _: Version = "1.0".parse().unwrap();
        })
    });

    group.bench_function("revision", |b| {
        b.iter(|| {
            let _: Version = "1.0-1".parse().unwrap();
        })
    });

    group.bench_function("epoch", |b| {
        b.iter(|| {
            let _: Version = "1:1.0".parse().unwrap();
        })
    });

    group.bench_function("full", |b| {
        b.iter(|| {
            let _: Version = "1:1.0-1".parse().unwrap();
        })
    });

    group.bench_function("long", |b| {
        b.iter(|| {
            let _: Version =
                "1:0.0~git20170407.0.55a552f+REALLY.0.0~git20161012.0.5f31782-1+deb8u1"
                    .parse()
                    .unwrap();
        })
    });

    group.bench_function("snapshot", |b| {
        b.iter(|| {
            let _: Version = "1.0+git20230411.3b22df2-1~bpo11+1".parse().unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
