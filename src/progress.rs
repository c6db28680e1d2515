//! Live progress line for a batch, driven by lifecycle events.
//!
//! [`Progress`] subscribes to the [`EventBus`] and counts transitions as the
//! invoker emits them. When drawing is enabled it redraws a status line on
//! stderr, so stdout stays clean for results.

use std::io::Write;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

use crate::events::{Event, EventBus, Terminal};

const FRAMES: &[char] = &['|', '/', '-', '\\'];

const REDRAW: Duration = Duration::from_millis(100);

/// Counts of invocations seen on the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub running: usize,
    pub finished: usize,
    pub failed: usize,
}

impl Tally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, event: &Event) {
        match event {
            Event::Spawning { .. } => {}
            Event::Running { .. } => self.running += 1,
            Event::Exited { .. } => self.running = self.running.saturating_sub(1),
            Event::Finished { terminal, .. } => {
                self.finished += 1;
                if *terminal != Terminal::Succeeded {
                    self.failed += 1;
                }
            }
        }
    }

    pub fn label(&self, elapsed: Duration) -> String {
        format!(
            "predicting {}/{} done, {} failed, {} running ({:.1}s)",
            self.finished,
            self.total,
            self.failed,
            self.running,
            elapsed.as_secs_f64()
        )
    }
}

/// Background task following one batch of `total` invocations.
pub struct Progress {
    handle: JoinHandle<Tally>,
    stop: oneshot::Sender<()>,
}

impl Progress {
    /// Subscribe to `bus` now, so no event emitted after this call is missed.
    /// With `draw` off the tally is still kept, just not shown.
    pub fn start(bus: &EventBus, total: usize, draw: bool) -> Self {
        let mut rx = bus.subscribe();
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut tally = Tally::new(total);
            let mut ticker = tokio::time::interval(REDRAW);
            let mut frame = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if draw {
                            let symbol = FRAMES[frame % FRAMES.len()];
                            eprint!("\x1b[2K\r{} {}", symbol, tally.label(started.elapsed()));
                            let _ = std::io::stderr().flush();
                        }
                        frame += 1;
                    }
                    event = rx.recv() => match event {
                        Ok(event) => tally.record(&event),
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                    _ = &mut stop_rx => break,
                }
            }

            loop {
                match rx.try_recv() {
                    Ok(event) => tally.record(&event),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }

            if draw {
                eprint!("\x1b[2K\r");
                let _ = std::io::stderr().flush();
            }
            tally
        });

        Self {
            handle,
            stop: stop_tx,
        }
    }

    /// Stop following, clear the line and return the final counts.
    pub async fn stop(self) -> Result<Tally, JoinError> {
        let _ = self.stop.send(());
        self.handle.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tally_tracks_running_and_terminal_states() {
        let mut tally = Tally::new(2);
        tally.record(&Event::Spawning {
            id: 0,
            path: PathBuf::from("dist/exe"),
        });
        tally.record(&Event::Running { id: 0, pid: Some(10) });
        assert_eq!(tally.running, 1);

        tally.record(&Event::Exited { id: 0, code: Some(0) });
        tally.record(&Event::Finished {
            id: 0,
            terminal: Terminal::Succeeded,
        });
        tally.record(&Event::Finished {
            id: 1,
            terminal: Terminal::SpawnFailed,
        });

        assert_eq!(
            tally,
            Tally {
                total: 2,
                running: 0,
                finished: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn label_reports_counts_and_elapsed() {
        let tally = Tally {
            total: 5,
            running: 3,
            finished: 2,
            failed: 1,
        };
        assert_eq!(
            tally.label(Duration::from_millis(1300)),
            "predicting 2/5 done, 1 failed, 3 running (1.3s)"
        );
    }

    #[tokio::test]
    async fn follows_events_emitted_on_the_bus() {
        let bus = EventBus::default();
        let progress = Progress::start(&bus, 3, false);

        bus.emit(Event::Running { id: 0, pid: None });
        bus.emit(Event::Exited { id: 0, code: Some(1) });
        bus.emit(Event::Finished {
            id: 0,
            terminal: Terminal::ExecutionFailed,
        });
        bus.emit(Event::Finished {
            id: 1,
            terminal: Terminal::Succeeded,
        });

        let tally = progress.stop().await.unwrap();
        assert_eq!(tally.finished, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.running, 0);
        assert_eq!(tally.total, 3);
    }

    #[tokio::test]
    async fn stops_when_bus_is_dropped() {
        let bus = EventBus::default();
        let progress = Progress::start(&bus, 1, false);
        bus.emit(Event::Finished {
            id: 0,
            terminal: Terminal::Succeeded,
        });
        drop(bus);

        let tally = progress.stop().await.unwrap();
        assert_eq!(tally.finished, 1);
    }

    #[tokio::test]
    async fn drawing_does_not_panic() {
        let bus = EventBus::default();
        let progress = Progress::start(&bus, 1, true);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(progress.stop().await.unwrap(), Tally::new(1));
    }
}
