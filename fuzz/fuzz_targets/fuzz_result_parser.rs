#![no_main]

use libfuzzer_sys::fuzz_target;

use simfleet_core::parser::{IvCurveParser, RowWindow};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Arbitrary text must produce a curve or an error, never a panic.
    for window in [RowWindow::default(), RowWindow { lead: 0, trail: 0 }] {
        let parser = IvCurveParser::with_window(window);
        if let Ok(curve) = parser.parse_str(text) {
            assert_eq!(curve.voltage.len(), curve.current.len());
            assert!(curve.len() <= text.lines().count());
        }
    }
});
