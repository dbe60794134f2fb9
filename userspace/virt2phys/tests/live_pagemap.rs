// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Translation against this process's own /proc/self/pagemap
//!
//! Frame numbers are only visible with CAP_SYS_ADMIN; without them every
//! entry reads as not present and the frame checks return early.

use virt2phys::{HugepageCache, TranslateError, Translator};

fn touched_buffer(pages: usize, page_size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; pages * page_size];
    for page in buffer.chunks_mut(page_size) {
        page[0] = 1;
    }
    std::hint::black_box(buffer)
}

fn open_live() -> Option<Translator> {
    match Translator::open() {
        Ok(translator) => Some(translator),
        Err(err) => {
            eprintln!("skipping: {err}");
            None
        }
    }
}

#[test]
fn resident_page_obeys_offset_law() {
    let Some(translator) = open_live() else { return };
    let page_size = translator.page_size();
    let buffer = touched_buffer(4, page_size as usize);
    let va = buffer.as_ptr() as u64;
    let page = va - va % page_size;

    let phys = match translator.try_translate(page) {
        Ok(phys) => phys,
        Err(TranslateError::NotPresent) => {
            eprintln!("skipping: pagemap frame numbers hidden");
            return;
        }
        Err(err) => panic!("pagemap read failed: {err}"),
    };
    assert_ne!(phys, 0);
    assert_eq!(phys % page_size, 0);
    assert_eq!(translator.translate(page), phys, "stable across calls");
    for k in [1, 64, page_size - 1] {
        assert_eq!(translator.translate(page + k), phys + k);
    }
}

#[test]
fn entries_are_readable_without_frames() {
    let Some(translator) = open_live() else { return };
    let buffer = touched_buffer(1, translator.page_size() as usize);
    let entry = translator.entry(buffer.as_ptr() as u64).expect("pagemap entry");
    assert!(entry.is_present(), "touched page must be present");
}

#[test]
fn untouched_page_has_no_frame() {
    let Some(translator) = open_live() else { return };
    // Page 0 is never mapped in a Linux process.
    assert_eq!(translator.translate(0), 0);
    assert!(matches!(translator.try_translate(0), Err(TranslateError::NotPresent)));
}

#[test]
fn cache_agrees_with_raw_on_live_memory() {
    let Some(translator) = open_live() else { return };
    let buffer = touched_buffer(2, translator.page_size() as usize);
    let va = buffer.as_ptr() as u64 + 5;
    let base = virt2phys::hugepage_base(va);

    let expected = translator.translate(base).wrapping_add(virt2phys::hugepage_offset(va));
    let mut cache = HugepageCache::new(&translator);
    assert_eq!(cache.translate(va), expected);
    assert_eq!(cache.translate(va), expected);
}
