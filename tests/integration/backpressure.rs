use crate::*;

/// More datagrams than capacity before any read: at most `capacity` are
/// kept, the rest are dropped and counted.
#[tokio::test]
async fn test_overflow_is_dropped_not_blocked() -> Result<()> {
    let input = loopback_input(3).await?;
    let tx = sender()?;

    let payloads: [&[u8]; 6] = [b"1", b"2", b"3", b"4", b"5", b"6"];
    send_all(&tx, input.local_addr(), &payloads)?;
    input.connect().await?;

    let stats = wait_for_stats(&input, |s| s.received == 6).await?;
    assert_eq!(stats.dropped, 3);
    assert_eq!(stats.enqueued(), 3);

    for expected in &payloads[..3] {
        let (message, _ack) = input.read_timeout(WAIT).await?;
        assert_eq!(&message.payload()[..], *expected);
    }
    let extra = input.read_timeout(Duration::from_millis(100)).await;
    assert!(matches!(extra, Err(ref e) if e.is_cancelled()), "got {extra:?}");

    input.close().await?;
    Ok(())
}

/// max_in_flight=2, "one" "two" "three" rapid-fire: reads return "one" (1)
/// and "two" (2), "three" is never seen, then close ends the input.
#[tokio::test]
async fn test_two_slot_queue_scenario() -> Result<()> {
    let input = loopback_input(2).await?;
    let tx = sender()?;

    send_all(&tx, input.local_addr(), &[b"one", b"two", b"three"])?;
    input.connect().await?;
    wait_for_stats(&input, |s| s.received == 3).await?;

    let (first, _ack) = input.read_timeout(WAIT).await?;
    assert_eq!(&first.payload()[..], b"one");
    assert_eq!(first.meta("count").as_deref(), Some("1"));

    let (second, _ack) = input.read_timeout(WAIT).await?;
    assert_eq!(&second.payload()[..], b"two");
    assert_eq!(second.meta("count").as_deref(), Some("2"));

    input.close().await?;
    let end = input.read_timeout(WAIT).await;
    assert!(matches!(end, Err(ref e) if e.is_end_of_input()), "got {end:?}");

    assert_eq!(input.stats().dropped, 1);
    Ok(())
}

/// The queue frees a slot per read, so traffic after a drain is accepted.
#[tokio::test]
async fn test_capacity_recovers_after_reads() -> Result<()> {
    let input = loopback_input(1).await?;
    input.connect().await?;
    let tx = sender()?;

    for round in 0..3u8 {
        send_all(&tx, input.local_addr(), &[&[round]])?;
        let (message, _ack) = input.read_timeout(WAIT).await?;
        assert_eq!(&message.payload()[..], &[round]);
        assert_eq!(message.sequence_number(), round as u64 + 1);
    }
    assert_eq!(input.stats().dropped, 0);

    input.close().await?;
    Ok(())
}
