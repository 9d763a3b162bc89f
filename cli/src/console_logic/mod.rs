use std::future::Future;

pub mod commands;
pub mod config;
pub mod render;

/// Runs `work` unless `interrupt` completes first, in which case `work` is
/// dropped and `None` is returned.
pub async fn until_interrupted<W, I>(work: W, interrupt: I) -> Option<W::Output>
where
    W: Future,
    I: Future,
{
    tokio::select! {
        biased;
        _ = interrupt => None,
        output = work => Some(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    #[tokio::test(start_paused = true)]
    async fn interrupt_cuts_a_slow_command_short() {
        let started = Instant::now();
        let outcome = until_interrupted(sleep(Duration::from_secs(10)), sleep(Duration::from_millis(200))).await;
        assert!(outcome.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn finished_work_is_returned() {
        let outcome = until_interrupted(async { 42 }, std::future::pending::<()>()).await;
        assert_eq!(outcome, Some(42));
    }
}
