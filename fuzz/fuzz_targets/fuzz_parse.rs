// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let blocks = blockmark_core::parse(input);
        let _ = blockmark_core::serialize(&blocks);
    }
});
