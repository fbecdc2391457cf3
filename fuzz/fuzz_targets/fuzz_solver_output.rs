#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Solver output is untrusted; parsing must never panic.
        let _ = synthflow_smt::backends::dimacs::parse_solver_output(s);
    }
});
