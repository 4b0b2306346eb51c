use std::collections::HashSet;

use sluice_core::{META_COUNT, META_SOURCE_ADDRESS};

use crate::*;

/// N datagrams sent before any read, capacity >= N: all come back in send
/// order, numbered 1..=N.
#[tokio::test]
async fn test_all_datagrams_delivered_in_order() -> Result<()> {
    let input = loopback_input(8).await?;
    let tx = sender()?;

    let payloads: [&[u8]; 5] = [b"a", b"bb", b"ccc", b"dddd", b"eeeee"];
    send_all(&tx, input.local_addr(), &payloads)?;
    input.connect().await?;

    for (i, expected) in payloads.iter().enumerate() {
        let (message, ack) = input.read_timeout(WAIT).await?;
        assert_eq!(&message.payload()[..], *expected);
        assert_eq!(message.sequence_number(), i as u64 + 1);
        assert_eq!(message.meta(META_COUNT), Some((i + 1).to_string()));
        ack.ack(None)?;
    }

    let stats = input.stats();
    assert_eq!(stats.received, 5);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.delivered, 5);

    input.close().await?;
    Ok(())
}

/// source_address metadata is exactly the sender's ip:port.
#[tokio::test]
async fn test_source_address_metadata() -> Result<()> {
    let input = loopback_input(1).await?;
    input.connect().await?;

    let tx = sender()?;
    send_all(&tx, input.local_addr(), &[b"who"])?;

    let (message, _ack) = input.read_timeout(WAIT).await?;
    let expected = tx.local_addr()?.to_string();
    assert_eq!(message.meta(META_SOURCE_ADDRESS), Some(expected));
    assert_eq!(message.source(), tx.local_addr()?);

    input.close().await?;
    Ok(())
}

/// A read issued before anything arrives blocks until a datagram does.
#[tokio::test]
async fn test_read_waits_for_first_datagram() -> Result<()> {
    let input = loopback_input(1).await?;
    input.connect().await?;

    let early = input.read_timeout(Duration::from_millis(100)).await;
    assert!(matches!(early, Err(ref e) if e.is_cancelled()), "got {early:?}");

    let tx = sender()?;
    let addr = input.local_addr();
    let (read, sent) = tokio::join!(input.read_timeout(WAIT), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        send_all(&tx, addr, &[b"late"])
    });
    sent?;
    let (message, _ack) = read?;
    assert_eq!(&message.payload()[..], b"late");
    assert_eq!(message.sequence_number(), 1);

    input.close().await?;
    Ok(())
}

/// Concurrent reads each get a different envelope and a different count.
#[tokio::test]
async fn test_concurrent_reads_get_distinct_messages() -> Result<()> {
    let input = loopback_input(4).await?;
    input.connect().await?;

    let reads = futures::future::join_all((0..4).map(|_| input.read_timeout(WAIT)));
    let tx = sender()?;
    let addr = input.local_addr();
    let (results, sent) = tokio::join!(reads, async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        send_all(&tx, addr, &[b"w", b"x", b"y", b"z"])
    });
    sent?;

    let mut payloads = HashSet::new();
    let mut counts = HashSet::new();
    for result in results {
        let (message, _ack) = result?;
        payloads.insert(message.payload().clone());
        counts.insert(message.sequence_number());
    }
    assert_eq!(payloads.len(), 4);
    assert_eq!(counts, (1..=4).collect());

    input.close().await?;
    Ok(())
}

/// Empty datagrams are still messages.
#[tokio::test]
async fn test_empty_datagram_is_delivered() -> Result<()> {
    let input = loopback_input(1).await?;
    input.connect().await?;

    let tx = sender()?;
    send_all(&tx, input.local_addr(), &[b""])?;

    let (message, _ack) = input.read_timeout(WAIT).await?;
    assert!(message.payload().is_empty());

    input.close().await?;
    Ok(())
}
