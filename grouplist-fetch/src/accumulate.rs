use alloc::vec::Vec;

use crate::QueryChunk;

/// A placeholder-filled array of `len` slots.
pub fn seed<T>(len: usize) -> Vec<Option<T>> {
    core::iter::repeat_with(|| None).take(len).collect()
}

/// Merges `chunk` into `acc` in place.
///
/// - Without `skipped`, `acc` is cleared first and the chunk lands at offset 0.
/// - `acc` is resized to `total`, padding with placeholders or truncating. An indeterminate total
///   keeps the current length, grown to fit the chunk.
/// - Exactly `items.len()` slots starting at the offset are replaced; items that would land past
///   `total` are dropped.
///
/// Returns the number of dropped items.
pub fn merge_chunk<T>(acc: &mut Vec<Option<T>>, chunk: QueryChunk<T>) -> usize {
    let QueryChunk {
        items,
        total,
        skipped,
    } = chunk;

    let offset = match skipped {
        Some(skipped) => skipped,
        None => {
            acc.clear();
            0
        }
    };
    let len = match total {
        Some(total) => total,
        None => acc.len().max(offset.saturating_add(items.len())),
    };
    acc.resize_with(len, || None);

    let room = len.saturating_sub(offset);
    let dropped = items.len().saturating_sub(room);
    if dropped > 0 {
        fwarn!(
            offset,
            total = len,
            dropped,
            "merge_chunk: items past the reported total were dropped"
        );
    }

    for (slot, item) in acc.iter_mut().skip(offset).zip(items) {
        *slot = Some(item);
    }
    dropped
}
