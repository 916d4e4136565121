#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(number) = avoir::CreditNoteNumber::parse(s) {
            let again = avoir::CreditNoteNumber::parse(&number.to_string())
                .expect("formatted number parses");
            assert_eq!(again, number);
        }
    }
});
