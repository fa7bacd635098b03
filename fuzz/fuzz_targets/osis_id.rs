#![no_main]
use libfuzzer_sys::fuzz_target;
use rs_bible::osis::parse_osis_id;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_osis_id(s);
    }
});
