#![no_main]

use libfuzzer_sys::fuzz_target;
use wpkg::version::Version;

fuzz_target!(|data: &str| {
    let Ok(v) = data.parse::<Version>() else {
        return;
    };
    let _ = v.to_string();
    let _ = v.canonicalize();

    let reference: Version = "100:100.100+100-100onehundred100~100".parse().unwrap();
    let _ = v.cmp(&reference);
    let _ = reference.cmp(&v);
});
