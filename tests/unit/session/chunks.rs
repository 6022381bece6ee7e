use super::*;

#[test]
fn unowned_buffer_refuses_chunks() {
    let mut buf = ChunkBuffer::new();
    assert!(!buf.push(RecorderId(1), vec![1, 2, 3]));
    assert!(buf.is_empty());
    assert_eq!(buf.owner(), None);
}

#[test]
fn stale_owner_is_refused_after_reset() {
    let mut buf = ChunkBuffer::new();
    buf.reset_for(RecorderId(1));
    assert!(buf.push(RecorderId(1), vec![1; 10]));
    assert!(buf.push(RecorderId(1), vec![1; 5]));

    let discarded = buf.reset_for(RecorderId(2));
    assert_eq!(discarded, (2, 15));
    assert!(!buf.push(RecorderId(1), vec![1; 7]));
    assert!(buf.push(RecorderId(2), vec![2; 7]));
    assert_eq!(buf.len(), 1);
    assert_eq!(buf.byte_len(), 7);
}

#[test]
fn take_drains_in_order_and_keeps_owner() {
    let mut buf = ChunkBuffer::new();
    buf.reset_for(RecorderId(3));
    buf.push(RecorderId(3), vec![1]);
    buf.push(RecorderId(3), vec![2, 2]);

    let chunks = buf.take();
    assert_eq!(chunks, vec![vec![1], vec![2, 2]]);
    assert!(buf.is_empty());
    assert_eq!(buf.byte_len(), 0);
    assert_eq!(buf.owner(), Some(RecorderId(3)));
    assert!(buf.push(RecorderId(3), vec![9]));
}
