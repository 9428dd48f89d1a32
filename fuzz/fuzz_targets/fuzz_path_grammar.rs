#![no_main]

use autoprop_core::Path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(key) = std::str::from_utf8(data) else {
        return;
    };
    let path = Path::parse(key);
    let text = path.to_string();
    assert_eq!(Path::parse(&text), path);
    let _ = path.binding_names();
});
