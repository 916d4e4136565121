#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → canonical form → parse must give the same set.
        if let Ok(set) = avoir::SkipSet::parse(s) {
            let canonical = set.to_string();
            let again = avoir::SkipSet::parse(&canonical).expect("canonical form parses");
            assert_eq!(again, set);
        }
    }
});
