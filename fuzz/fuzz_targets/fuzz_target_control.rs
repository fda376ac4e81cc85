#![no_main]

use libfuzzer_sys::fuzz_target;
use wpkg::control::ControlFile;

fuzz_target!(|data: &str| {
    let Ok(file) = ControlFile::parse(data) else {
        return;
    };
    // whatever parsed must render and re-parse
    let rendered = file.to_string();
    let _ = ControlFile::parse(&rendered);
});
