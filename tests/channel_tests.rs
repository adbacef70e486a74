//! Unit tests for channels, same-domain FIFOs and cross-domain FIFOs.

use pcie_injector::stream::{async_fifo, Buffer, Channel, StreamSink, StreamSource, SyncFifo};

/// Tests that a pushed word is only visible after the tick boundary.
#[test]
fn test_channel_push_visible_after_commit() {
    let mut ch = Channel::new(2);
    assert!(ch.push(7u32));
    assert!(!ch.valid());
    assert_eq!(ch.level(), 1);

    ch.commit();
    assert_eq!(ch.peek(), Some(&7));
}

/// Tests that a channel accepts at most one word per tick.
#[test]
fn test_channel_one_push_per_tick() {
    let mut ch = Channel::new(4);
    assert!(ch.push(1u32));
    assert!(!ch.ready());
    assert!(!ch.push(2));

    ch.commit();
    assert!(ch.push(2));
    ch.commit();
    assert_eq!(ch.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
}

/// Tests that a full channel deasserts ready and that a freed slot is only
/// reusable after the tick boundary.
#[test]
fn test_channel_full_until_commit() {
    let mut ch = Channel::new(2);
    ch.push(1u32);
    ch.commit();
    ch.push(2);
    ch.commit();
    assert!(!ch.ready());
    assert!(!ch.push(3));

    assert_eq!(ch.pop(), Some(1));
    assert!(!ch.ready());

    ch.commit();
    assert!(ch.ready());
    assert!(ch.push(3));
}

/// Tests that a consumer takes at most one word per tick.
#[test]
fn test_channel_one_pop_per_tick() {
    let mut ch = Channel::new(4);
    ch.push(1u32);
    ch.commit();
    ch.push(2);
    ch.commit();

    assert_eq!(ch.pop(), Some(1));
    assert_eq!(ch.peek(), None);
    assert_eq!(ch.pop(), None);

    ch.commit();
    assert_eq!(ch.pop(), Some(2));
}

/// Tests that flushing drops committed and staged words.
#[test]
fn test_channel_flush() {
    let mut ch = Channel::new(4);
    ch.push(1u32);
    ch.commit();
    ch.push(2);
    ch.flush();
    ch.commit();

    assert!(ch.is_empty());
    assert!(!ch.valid());
}

/// Tests that a zero capacity is raised to one slot.
#[test]
fn test_channel_minimum_capacity() {
    let ch: Channel<u32> = Channel::new(0);
    assert_eq!(ch.capacity(), 1);
}

/// Tests the immediate visibility of the same-domain FIFO.
#[test]
fn test_sync_fifo_immediate() {
    let mut fifo: SyncFifo<u32> = SyncFifo::new(2);
    assert!(fifo.push(1u32));
    assert!(fifo.push(2));
    assert!(fifo.is_full());
    assert!(!fifo.push(3));

    assert_eq!(fifo.peek(), Some(&1));
    assert_eq!(fifo.pop(), Some(1));
    assert_eq!(fifo.pop(), Some(2));
    assert_eq!(fifo.pop(), None);
}

/// Tests that the reader sees a word only after its own tick boundary.
#[test]
fn test_async_fifo_reader_commit() {
    let (mut w, mut r) = async_fifo::<u32>(4);
    assert!(w.push(0xAB));
    assert!(!r.valid());

    r.commit();
    assert_eq!(r.peek(), Some(&0xAB));
    assert_eq!(r.pop(), Some(0xAB));
    assert_eq!(r.pop(), None);
}

/// Tests that the cross-domain FIFO holds exactly its capacity.
#[test]
fn test_async_fifo_capacity() {
    let (mut w, mut r) = async_fifo::<u32>(4);
    for i in 0..3 {
        assert!(w.push(i));
        w.commit();
    }
    assert!(!w.ready());

    r.commit();
    assert!(w.ready());
    assert!(w.push(3));
    w.commit();
    assert!(!w.ready());
    assert_eq!(r.len(), 4);
    assert_eq!(w.capacity(), 4);
}

/// Tests that the writer pushes at most one word per tick.
#[test]
fn test_async_fifo_one_push_per_tick() {
    let (mut w, _r) = async_fifo::<u32>(8);
    assert!(w.push(1));
    assert!(!w.ready());
    assert!(!w.push(2));
    w.commit();
    assert!(w.push(2));
}

/// Tests an ordered, lossless transfer between two threads.
#[test]
fn test_async_fifo_across_threads() {
    const COUNT: u32 = 1000;
    let (mut w, mut r) = async_fifo::<u32>(8);

    let received = std::thread::scope(|s| {
        s.spawn(move || {
            let mut next = 0;
            while next < COUNT {
                if w.push(next) {
                    next += 1;
                }
                w.commit();
            }
        });

        let mut out = Vec::new();
        while out.len() < COUNT as usize {
            r.commit();
            if let Some(word) = r.pop() {
                out.push(word);
            }
        }
        out
    });

    assert_eq!(received, (0..COUNT).collect::<Vec<_>>());
}
