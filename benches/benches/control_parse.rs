use criterion::{criterion_group, criterion_main, Criterion};
use wpkg::control::ControlFile;

static SMALL: &str = "\
Package: wpkg
Version: 1.0-1
Architecture: linux-amd64
Maintainer: Jane Doe <jane@example.com>
Description: a package manager
";

static LARGE: &str = "\
Package: wpkg
Version: 1.0-1
Architecture: linux-amd64
Maintainer: Jane Doe <jane@example.com>
Priority: optional
Section: admin
Essential: no
Installed-Size: 2048
Depends: libz (>= 1.2.8), libssl | libgnutls, libc (>= 2.1)
Pre-Depends: coreutils
Conflicts: oldpkg (<< 0.9)
Replaces: oldpkg
Homepage: https://example.com/wpkg
Description: a package manager
 It installs, removes, upgrades and builds self contained software
 packages on a target filesystem.
 .
 The long description spans several lines to exercise continuation
 handling in the parser.
";

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("control_parse");

    group.bench_function("small", |b| {
        b.iter(|| {
            let _ = ControlFile::parse(SMALL).unwrap();
        })
    });

    group.bench_function("large", |b| {
        b.iter(|| {
            let _ = ControlFile::parse(LARGE).unwrap();
        })
    });

    let parsed = ControlFile::parse(LARGE).unwrap();
    group.bench_function("write", |b| {
        b.iter(|| {
            let _ = parsed.to_string();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
