use criterion::{criterion_group, criterion_main, Criterion};
use wpkg::dependency::Dependency;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency");

    group.bench_function("single", |b| {
        b.iter(|| {
            let _: Dependency = "libz".parse().unwrap();
        })
    });

    group.bench_function("versioned", |b| {
        b.iter(|| {
            let _: Dependency = "libz (>= 1.2.8)".parse().unwrap();
        })
    });

    group.bench_function("alternatives", |b| {
        b.iter(|| {
            let _: Dependency = "editor | vi | nano | emacs".parse().unwrap();
        })
    });

    group.bench_function("constrained", |b| {
        b.iter(|| {
            let _: Dependency =
                "gcc (>= 4:10.2) [linux-amd64 !mswindows-i386] <!stage1>, make, libz (>= 1.2.8)"
                    .parse()
                    .unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
