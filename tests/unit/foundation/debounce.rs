use super::*;

fn timer() -> Debounce {
    Debounce::new(
        Duration::from_millis(100),
        Duration::from_millis(500),
        Duration::from_millis(2000),
    )
}

#[tokio::test(start_paused = true)]
async fn ready_value_settles_after_min_wait() {
    let (_tx, mut rx) = watch::channel(3usize);
    let start = Instant::now();
    let out = timer().settle(&mut rx, |n| *n > 0).await;
    assert_eq!(out, Settled::Quiet);
    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn never_ready_hits_cap() {
    let (_tx, mut rx) = watch::channel(0usize);
    let start = Instant::now();
    let out = timer().settle(&mut rx, |n| *n > 0).await;
    assert_eq!(out, Settled::CapReached);
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn late_update_extends_quiet_window() {
    let (tx, mut rx) = watch::channel(0usize);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        let _ = tx.send(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(2);
        // Keep the sender alive past the settle point.
        tokio::time::sleep(Duration::from_secs(10)).await;
    });
    let start = Instant::now();
    let out = timer().settle(&mut rx, |n| *n > 0).await;
    assert_eq!(out, Settled::Quiet);
    assert_eq!(start.elapsed(), Duration::from_millis(850));
    assert_eq!(*rx.borrow(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropped_sender_reports_closed() {
    let (tx, mut rx) = watch::channel(0usize);
    drop(tx);
    let out = timer().settle(&mut rx, |n| *n > 0).await;
    assert_eq!(out, Settled::Closed);
}
