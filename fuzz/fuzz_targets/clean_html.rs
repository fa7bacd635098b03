#![no_main]
use libfuzzer_sys::fuzz_target;
use rs_bible::clean_html;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let once = clean_html(s);
        assert_eq!(clean_html(&once), once);
    }
});
