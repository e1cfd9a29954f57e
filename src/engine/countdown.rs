// src/engine/countdown.rs

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Countdown cadence.
pub const TICK: Duration = Duration::from_secs(1);

/// Spawns a task that calls `on_tick` once per `TICK`, starting one tick from now,
/// until it returns `ControlFlow::Break` or the task is aborted.
pub(crate) fn spawn_ticker<F, Fut>(mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + TICK, TICK);
        loop {
            ticks.tick().await;
            if on_tick().await.is_break() {
                break;
            }
        }
    })
}

/// `MM:SS`, minutes unbounded.
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(30), "00:30");
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(305), "05:05");
        assert_eq!(format_remaining(6000), "100:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_on_break() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let handle = spawn_ticker(move || {
            let seen = Arc::clone(&seen);
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });

        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
