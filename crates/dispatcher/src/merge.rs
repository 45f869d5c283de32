//! Fan-in of several error streams into one

use tokio::sync::mpsc;

/// Merge several receivers into a single receiver
///
/// Every item from every source is forwarded exactly once. Ordering is only
/// preserved within one source. The output closes after all sources have
/// closed and been drained; with no sources it is closed immediately.
pub fn merge<T, I>(sources: I) -> mpsc::UnboundedReceiver<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = mpsc::UnboundedReceiver<T>>,
{
    let (tx, rx) = mpsc::unbounded_channel();

    for mut source in sources {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(item) = source.recv().await {
                if tx.send(item).is_err() {
                    // output dropped; nothing left to forward to
                    break;
                }
            }
        });
    }

    rx
}
