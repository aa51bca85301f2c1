//! Fuzz target: `RequestDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming HTTP decoder, split
//! at an arbitrary point, and asserts that it never panics and never
//! yields a body larger than the configured limit allows.
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use servsens::rpc::codec::RequestDecoder;

const MAX_BODY: usize = 1024;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| b as usize).min(data.len());
    let (head, tail) = data.split_at(split);

    let mut decoder = RequestDecoder::new(MAX_BODY);
    for part in [head, tail] {
        if let Ok(Some(request)) = decoder.feed(part) {
            // Lossy UTF-8 may widen each invalid byte to U+FFFD.
            assert!(request.body().len() <= MAX_BODY * 3);
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    let _ = decoder.feed(data);
});
