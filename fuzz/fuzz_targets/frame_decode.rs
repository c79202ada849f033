//! Fuzz target for Frame::decode
//!
//! Arbitrary bytes arriving on a peer link must never panic the decoder.
//! Anything that does decode must re-encode to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use p2paste_proto::{Frame, FrameHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    let encoded = frame.to_vec().expect("decoded frame must re-encode");
    let used = FrameHeader::SIZE + frame.payload.len();
    assert_eq!(&encoded[..], &data[..used]);
});
