#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = synthflow_smt::backends::smtlib_printer::parse_smtlib_output(s);
    }
});
