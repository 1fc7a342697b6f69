#![no_main]

use libfuzzer_sys::fuzz_target;

use simfleet_core::batch::BatchDocument;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = BatchDocument::from_json(text) else {
        return;
    };

    // Anything accepted must survive a save and reload.
    let rendered = doc.to_json().expect("accepted document must render");
    let reloaded = BatchDocument::from_json(&rendered).expect("rendered document must parse");
    assert_eq!(reloaded.len(), doc.len());
    assert_eq!(reloaded.jobs().len(), doc.len());
});
