//! Bounded, closable work queue between the target supply and the workers.
//!
//! Multi-producer multi-consumer: each worker holds a clone of the receiver.
//! `recv_async` only reports disconnection once every sender is dropped *and*
//! the buffer is drained, so closing never loses queued work.

/// Producer half; dropping the last clone closes the queue.
pub type WorkSender = flume::Sender<String>;
/// Consumer half, cloned once per worker.
pub type WorkReceiver = flume::Receiver<String>;

pub fn work_queue(capacity: usize) -> (WorkSender, WorkReceiver) {
    flume::bounded(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drains_after_close() {
        let (tx, rx) = work_queue(3);
        tx.send_async("a".to_string()).await.unwrap();
        tx.send_async("b".to_string()).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv_async().await.unwrap(), "a");
        assert_eq!(rx.recv_async().await.unwrap(), "b");
        assert!(rx.recv_async().await.is_err());
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let (tx, rx) = work_queue(1);
        tx.send_async("first".to_string()).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), tx.send_async("second".to_string()))
                .await;
        assert!(blocked.is_err(), "send should wait while the queue is full");

        assert_eq!(rx.recv_async().await.unwrap(), "first");
        tx.send_async("third".to_string()).await.unwrap();
        assert_eq!(rx.recv_async().await.unwrap(), "third");
    }

    #[tokio::test]
    async fn test_each_item_delivered_once_across_consumers() {
        let (tx, rx) = work_queue(2);
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let rx = rx.clone();
                tokio::spawn(async move {
                    let mut got = 0u32;
                    while rx.recv_async().await.is_ok() {
                        got += 1;
                    }
                    got
                })
            })
            .collect();
        drop(rx);

        for i in 0..50 {
            tx.send_async(i.to_string()).await.unwrap();
        }
        drop(tx);

        let mut total = 0;
        for c in consumers {
            total += c.await.unwrap();
        }
        assert_eq!(total, 50);
    }
}
