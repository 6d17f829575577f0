//! Cancellable one-shot timers.
//!
//! A timer does not run any monitor code itself. When it expires it posts a
//! [`MonitorEvent`] back into the monitor's queue, so the wakeup is handled
//! on the same serialized path as host commands and change notifications.
//! Recurring work re-arms a fresh timer at the end of each tick.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::monitor::{EventSender, MonitorEvent};

/// Handle to a pending wakeup. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TimerHandle {
    cancel_token: CancellationToken,
}

impl TimerHandle {
    /// Posts `event` to `events` after `delay`, unless cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(delay: Duration, events: EventSender, event: MonitorEvent) -> Self {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!(?event, "Timer cancelled before expiry");
                }

                _ = tokio::time::sleep(delay) => {
                    if !events.send(event) {
                        debug!("Timer expired after monitor shut down");
                    }
                }
            }
        });

        Self { cancel_token }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorCommand;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = TimerHandle::schedule(
            Duration::from_millis(100),
            EventSender::new(&tx),
            MonitorEvent::ReporterTick { generation: 1 },
        );

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(MonitorCommand::Event(MonitorEvent::ReporterTick { generation: 1 }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TimerHandle::schedule(
            Duration::from_millis(100),
            EventSender::new(&tx),
            MonitorEvent::DeferredStart { generation: 1 },
        );
        timer.cancel();
        assert!(timer.is_cancelled());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(TimerHandle::schedule(
            Duration::from_millis(10),
            EventSender::new(&tx),
            MonitorEvent::ReporterTick { generation: 7 },
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
