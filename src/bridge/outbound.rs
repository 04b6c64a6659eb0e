//! What the connection loop sends next

use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::serial::queue::{Line, LineQueue};

/// Next action for the connected peer
#[derive(Debug)]
pub enum Outbound {
    /// A serial line to notify
    Line(Line),
    /// The stats interval elapsed
    ReportDue,
}

/// Wait for a line to notify or for the next stats report.
///
/// `report_due` is polled first, so a queue that never drains cannot hold
/// back the report. Lines are only taken while `subscribed`; otherwise they
/// stay queued.
pub async fn next_outbound<M: RawMutex, T: Future>(
    queue: &LineQueue<M>,
    subscribed: bool,
    report_due: T,
) -> Outbound {
    let line = async {
        if subscribed {
            queue.dequeue().await
        } else {
            core::future::pending().await
        }
    };

    match select(report_due, line).await {
        Either::First(_) => Outbound::ReportDue,
        Either::Second(line) => Outbound::Line(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::future::{pending, ready};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures::executor::block_on;

    #[test]
    fn test_queued_line_is_taken() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        queue.enqueue(Line::new(b"hello"));

        match block_on(next_outbound(&queue, true, pending::<()>())) {
            Outbound::Line(line) => assert_eq!(line.as_bytes(), b"hello"),
            other => panic!("expected a line, got {:?}", other),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_report_wins_over_waiting_line() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        queue.enqueue(Line::new(b"hello"));

        let next = block_on(next_outbound(&queue, true, ready(())));

        assert!(matches!(next, Outbound::ReportDue));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_unsubscribed_keeps_lines_queued() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        queue.enqueue(Line::new(b"hello"));

        let next = block_on(next_outbound(&queue, false, ready(())));

        assert!(matches!(next, Outbound::ReportDue));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_reports_continue_under_steady_traffic() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        let mut lines = 0;
        let mut reports = 0;

        // The interval fires on every fifth pass while a line is always waiting
        for pass in 0..20 {
            queue.enqueue(Line::new(b"busy"));
            let tick = async move {
                if pass % 5 == 4 {
                    return;
                }
                pending::<()>().await
            };
            match block_on(next_outbound(&queue, true, tick)) {
                Outbound::Line(_) => lines += 1,
                Outbound::ReportDue => reports += 1,
            }
        }

        assert_eq!(reports, 4);
        assert_eq!(lines, 16);
    }
}
