//! Property-based tests for the queue engine
//!
//! Uses proptest to check the cursor and ordering invariants across
//! arbitrary edit sequences.

use encore_playback::{
    shuffle_pinned, QueueEngine, QueueItem, RepeatMode, Track, TransitionReason, TransportPort,
    Video,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Transport that accepts everything and tracks only what the queue reads
#[derive(Default)]
struct NullTransport {
    elapsed: f64,
    repeat: RepeatMode,
}

impl TransportPort for NullTransport {
    fn load_and_play(&mut self, item: &QueueItem) {
        self.elapsed = item.track.start_seconds();
    }
    fn cue(&mut self, item: &QueueItem) {
        self.elapsed = item.track.start_seconds();
    }
    fn seek(&mut self, seconds: f64) {
        self.elapsed = seconds;
    }
    fn resume(&mut self) {}
    fn halt(&mut self) {}
    fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }
    fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }
    fn set_transition_reason(&mut self, _reason: TransitionReason) {}
}

fn item(id: i64, video: u8) -> QueueItem {
    QueueItem::new(Track {
        id,
        video: Video {
            id: format!("v{}", video),
            ..Default::default()
        },
        title: format!("Song {}", id),
        artist: "Singer".to_string(),
        is_original: false,
        start_at: None,
        end_at: None,
    })
}

fn arbitrary_items() -> impl Strategy<Value = Vec<QueueItem>> {
    prop::collection::vec((0i64..6, 0u8..3), 0..12)
        .prop_map(|pairs| pairs.into_iter().map(|(id, v)| item(id, v)).collect())
}

#[derive(Debug, Clone)]
enum Op {
    Enqueue(i64, bool),
    Remove(usize),
    Move(usize, usize),
    Jump(usize),
    Next,
    Previous(f64),
    Ended(u8),
    Shuffle(u64),
    Clear,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..6, any::<bool>()).prop_map(|(id, front)| Op::Enqueue(id, front)),
        2 => (0usize..14).prop_map(Op::Remove),
        2 => (0usize..14, 0usize..14).prop_map(|(a, b)| Op::Move(a, b)),
        1 => (0usize..14).prop_map(Op::Jump),
        1 => Just(Op::Next),
        1 => (0.0f64..20.0).prop_map(Op::Previous),
        1 => (0u8..3).prop_map(Op::Ended),
        1 => any::<u64>().prop_map(Op::Shuffle),
        1 => Just(Op::Clear),
    ]
}

fn sorted_keys(items: &[QueueItem]) -> Vec<(i64, String)> {
    let mut keys: Vec<(i64, String)> = items
        .iter()
        .map(|i| (i.track.id, i.track.video.id.clone()))
        .collect();
    keys.sort();
    keys
}

proptest! {
    /// Property: the cursor is always inside the queue (or 0 when empty)
    #[test]
    fn cursor_stays_in_range(
        items in arbitrary_items(),
        operations in prop::collection::vec(arbitrary_op(), 1..40)
    ) {
        let mut queue = QueueEngine::new();
        let mut transport = NullTransport::default();
        queue.set_queue(items);

        for op in operations {
            let len_before = queue.len();
            match op {
                Op::Enqueue(id, front) => {
                    queue.enqueue(item(id, 0), front, &mut transport);
                    prop_assert_eq!(queue.len(), len_before + 1);
                }
                Op::Remove(index) => {
                    let removed = queue.remove_at(index, &mut transport);
                    prop_assert_eq!(removed, index < len_before);
                }
                Op::Move(from, to) => {
                    queue.move_item(from, to);
                    prop_assert_eq!(queue.len(), len_before);
                }
                Op::Jump(index) => {
                    let jumped = queue.jump_to(index, &mut transport);
                    if jumped {
                        prop_assert_eq!(queue.position(), index);
                    }
                }
                Op::Next => {
                    queue.advance(&mut transport);
                }
                Op::Previous(elapsed) => {
                    transport.elapsed = elapsed;
                    queue.retreat(&mut transport);
                }
                Op::Ended(mode) => {
                    transport.repeat = match mode {
                        0 => RepeatMode::Off,
                        1 => RepeatMode::One,
                        _ => RepeatMode::All,
                    };
                    queue.advance_with_repeat(&mut transport);
                }
                Op::Shuffle(seed) => {
                    queue.shuffle_with(&mut StdRng::seed_from_u64(seed));
                    if !queue.is_empty() {
                        prop_assert_eq!(queue.position(), 0);
                    }
                }
                Op::Clear => {
                    queue.clear();
                    prop_assert!(queue.is_empty());
                }
            }

            if queue.is_empty() {
                prop_assert_eq!(queue.position(), 0);
                prop_assert!(queue.now_playing().is_none());
            } else {
                prop_assert!(queue.position() < queue.len());
                prop_assert!(queue.now_playing().is_some());
            }
        }
    }

    /// Property: shuffling permutes the items and pins the current one first
    #[test]
    fn shuffle_is_a_pinned_permutation(
        mut items in arbitrary_items(),
        position in 0usize..12,
        seed in any::<u64>()
    ) {
        let before = sorted_keys(&items);
        let current = items.get(position).cloned();

        let new_position = shuffle_pinned(&mut items, position, &mut StdRng::seed_from_u64(seed));

        prop_assert_eq!(sorted_keys(&items), before);
        if items.len() > 1 {
            prop_assert_eq!(new_position, 0);
            if let Some(current) = current {
                prop_assert!(items[0].is_same_song(&current));
            }
        }
    }

    /// Property: moving an item back undoes the move, cursor included
    #[test]
    fn move_then_move_back_is_identity(
        items in arbitrary_items(),
        from in 0usize..12,
        to in 0usize..12,
        jump in 0usize..12
    ) {
        let mut queue = QueueEngine::new();
        let mut transport = NullTransport::default();
        queue.set_queue(items);
        queue.jump_to(jump, &mut transport);

        let order = queue.items().to_vec();
        let position = queue.position();
        let current = queue.now_playing().cloned();

        if queue.move_item(from, to) {
            prop_assert_eq!(queue.now_playing().cloned(), current);
            prop_assert!(queue.move_item(to, from));
        }

        prop_assert_eq!(queue.items(), order.as_slice());
        prop_assert_eq!(queue.position(), position);
    }
}
