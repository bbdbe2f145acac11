//! Conflated change subscriptions over `tokio::sync::watch`.
//!
//! Observable store reads hand out a [`Subscription`] per registration.
//! Each subscription starts at the publisher's current value and then
//! yields the latest value after every change; intermediate values may be
//! conflated, subscribers always converge on the newest state.

use tokio::sync::watch;

/// A live registration on an observable value.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Latest published value.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next change and return the new value.
    /// Returns `None` once the publisher has gone away.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// End the registration.
    pub fn cancel(self) {}
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn next_yields_updates_until_publisher_drops() {
        let (tx, rx) = watch::channel(1);
        let mut sub = Subscription::new(rx);
        assert_eq!(sub.current(), 1);

        tx.send_replace(2);
        assert_eq!(sub.next().await, Some(2));

        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn subscriptions_are_independent() {
        let (tx, rx) = watch::channel("a".to_string());
        let mut first = Subscription::new(rx.clone());
        let second = Subscription::new(rx);

        tx.send_replace("b".to_string());
        assert_eq!(first.next().await.as_deref(), Some("b"));
        // An unpolled subscriber still observes the latest value.
        assert_eq!(second.current(), "b");
    }

    #[tokio::test]
    async fn conflates_to_the_newest_value() {
        let (tx, rx) = watch::channel(0);
        let mut sub = Subscription::new(rx);

        tx.send_replace(1);
        tx.send_replace(2);
        tx.send_replace(3);
        assert_eq!(sub.next().await, Some(3));
    }
}
