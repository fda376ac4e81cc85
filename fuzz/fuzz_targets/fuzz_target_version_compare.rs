#![no_main]

use libfuzzer_sys::fuzz_target;
use wpkg::version::compare_versions;

static OPERATORS: &[&str] = &[
    "<<", "<=", "=", ">=", ">>", "lt", "le", "eq", "ne", "ge", "gt", "lt-nl", "le-nl", "ge-nl",
    "gt-nl",
];

fuzz_target!(|data: &str| {
    let Some((left, right)) = data.split_once('\n') else {
        return;
    };
    for operator in OPERATORS {
        let _ = compare_versions(left, operator, right);
    }
});
