#![no_main]

use libfuzzer_sys::fuzz_target;
use ricebar_services::parse_free;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let reading = parse_free(&text);
    assert!(reading.percent() <= 100);
    assert!(!reading.gigabytes_label().contains("NaN"));
});
