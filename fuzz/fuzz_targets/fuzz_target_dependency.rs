#![no_main]

use libfuzzer_sys::fuzz_target;
use wpkg::dependency::Dependency;

fuzz_target!(|data: &str| {
    let Ok(dependency) = data.parse::<Dependency>() else {
        return;
    };
    // whatever parsed must render and re-parse
    let rendered = dependency.to_string();
    let _ = rendered.parse::<Dependency>();
});
