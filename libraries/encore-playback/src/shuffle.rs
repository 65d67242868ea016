//! Queue randomization
//!
//! In-place Fisher-Yates over the whole queue, then the item that was
//! current is pulled back to the front so playback is not interrupted.

use crate::types::QueueItem;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle `items` and pin the previously current item at index 0
///
/// Returns the new cursor, which is always `0` for a non-empty queue.
/// Queues of one item or fewer are left untouched.
pub fn shuffle_pinned<R: Rng + ?Sized>(
    items: &mut [QueueItem],
    position: usize,
    rng: &mut R,
) -> usize {
    if items.len() <= 1 {
        return position;
    }

    let current = items.get(position).cloned();

    items.shuffle(rng);

    if let Some(current) = current {
        // First match wins when the same song is queued more than once
        if let Some(index) = items.iter().position(|item| item.is_same_song(&current)) {
            items[..=index].rotate_right(1);
        }
    }

    0
}
