//! Debounced values on tokio watch channels.
//!
//! A [`Debouncer`] takes a rapidly changing input and publishes it only
//! after it has been quiet for the configured delay. Every new input
//! restarts the quiet period, and the value published is always the
//! latest one, so a superseded value is never delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default delay for search input.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: Arc<watch::Sender<T>>,
    delay: Duration,
    task: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a debouncer holding `initial`.
    ///
    /// A zero delay is a pass-through: [`Debouncer::set`] publishes
    /// immediately and no task is spawned. Otherwise this must be called
    /// from within a tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, rx) = watch::channel(initial.clone());
        let (output, _) = watch::channel(initial);
        let output = Arc::new(output);

        let task = (!delay.is_zero()).then(|| tokio::spawn(run(rx, output.clone(), delay)));

        Self {
            input,
            output,
            delay,
            task,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new input value and restart the quiet period.
    pub fn set(&self, value: T) {
        if self.task.is_none() {
            publish(&self.output, value.clone());
        }
        self.input.send_replace(value);
    }

    /// Publish the latest input now, skipping the rest of the quiet period.
    pub fn flush(&self) {
        publish(&self.output, self.input.borrow().clone());
    }

    /// The last published value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// The latest input, published or not.
    pub fn latest_input(&self) -> T {
        self.input.borrow().clone()
    }

    /// Receiver that is notified each time a new value is published.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn publish<T: PartialEq>(output: &watch::Sender<T>, value: T) {
    output.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

async fn run<T>(mut rx: watch::Receiver<T>, output: Arc<watch::Sender<T>>, delay: Duration)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    loop {
        if rx.changed().await.is_err() {
            return;
        }

        // Wait until the input has been quiet for `delay`.
        loop {
            match tokio::time::timeout(delay, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return,
                Err(_) => break,
            }
        }

        let value = rx.borrow_and_update().clone();
        publish(&output, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_settles_once_to_last_value() {
        let debouncer = Debouncer::new(String::new(), ms(300));
        let mut rx = debouncer.subscribe();

        for text in ["a", "ac", "acm", "acme"] {
            debouncer.set(text.to_string());
            tokio::time::sleep(ms(100)).await;
        }
        assert_eq!(debouncer.current(), "");
        assert!(!rx.has_changed().unwrap());

        // 300ms after the last update.
        tokio::time::sleep(ms(199)).await;
        assert_eq!(debouncer.current(), "");
        tokio::time::sleep(ms(2)).await;
        assert_eq!(debouncer.current(), "acme");

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "acme");

        tokio::time::sleep(ms(1000)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_publish_separately() {
        let debouncer = Debouncer::new(0u32, ms(300));

        debouncer.set(1);
        tokio::time::sleep(ms(400)).await;
        assert_eq!(debouncer.current(), 1);

        debouncer.set(2);
        debouncer.set(3);
        tokio::time::sleep(ms(400)).await;
        assert_eq!(debouncer.current(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_published_value_does_not_notify() {
        let debouncer = Debouncer::new("x".to_string(), ms(300));
        let rx = debouncer.subscribe();

        debouncer.set("xy".to_string());
        debouncer.set("x".to_string());
        tokio::time::sleep(ms(400)).await;

        assert_eq!(debouncer.current(), "x");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_zero_delay_is_pass_through() {
        let debouncer = Debouncer::new(String::new(), Duration::ZERO);
        debouncer.set("now".to_string());
        assert_eq!(debouncer.current(), "now");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_publishes_pending_input() {
        let debouncer = Debouncer::new(String::new(), ms(300));
        debouncer.set("acme".to_string());
        assert_eq!(debouncer.latest_input(), "acme");

        debouncer.flush();
        assert_eq!(debouncer.current(), "acme");

        let rx = debouncer.subscribe();
        tokio::time::sleep(ms(400)).await;
        assert!(!rx.has_changed().unwrap());
    }
}
