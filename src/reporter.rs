//! Periodic snapshot output.

use anyhow::{Context, Result};
use log::{debug, error};
use std::io::Write;
use std::time::Duration;
use traveller_common::{OutputFormat, Snapshot};

use crate::board::Board;
use crate::shutdown::Shutdown;

/// Takes a snapshot of the board on every cycle and writes it out.
pub struct Reporter<W: Write> {
    writer: W,
    format: OutputFormat,
    /// Number of snapshots taken so far.
    counter: u64,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format, counter: 0 }
    }

    pub fn counter(&self) -> u64 { self.counter }

    /// One cycle: capture and clear under the board lock, then write the block.
    pub fn report(&mut self, board: &Board) -> Result<Snapshot> {
        self.counter += 1;
        let snapshot = board.take_snapshot(self.counter);
        debug!(
            "Snapshot {}: {} travellers, {} moves, {} trails",
            snapshot.sequence, snapshot.traveller_count, snapshot.moves, snapshot.trace_count()
        );

        match self.format {
            OutputFormat::Text => {
                self.writer
                    .write_all(snapshot.render_report().as_bytes())
                    .context("Failed to write snapshot")?;
            }
            OutputFormat::Json => {
                let line = snapshot.to_json_line().context("Failed to serialize snapshot")?;
                writeln!(self.writer, "{}", line).context("Failed to write snapshot")?;
            }
        }
        self.writer.flush().context("Failed to flush snapshot output")?;

        Ok(snapshot)
    }

    /// Reports immediately, then once per `interval`, until shutdown or a write failure.
    pub fn run(&mut self, board: &Board, interval: Duration, shutdown: &Shutdown) {
        loop {
            if let Err(e) = self.report(board) {
                error!("Reporter stopped: {:#}", e);
                return;
            }
            if !shutdown.sleep(interval) {
                return;
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;
    use std::io;
    use traveller_common::{Direction, Position};

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn text_reports_are_numbered_from_one_and_clear_trails() {
        let board = Board::new(2, 2);
        let key = board.lock().place(4, Position::new(0, 0)).unwrap();
        assert!(board.try_move(key, Direction::East));

        let mut reporter = Reporter::new(Vec::new(), OutputFormat::Text);
        let first = reporter.report(&board).unwrap();
        let second = reporter.report(&board).unwrap();
        assert_eq!((first.sequence, second.sequence), (1, 2));
        assert_eq!(first.moves, 1);
        assert_eq!(second.trace_count(), 0);

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            out,
            "SNAPSHOT - 1\n\nxx|04 \n      \nxx xx \n\n\n\
             SNAPSHOT - 2\n\nxx 04 \n      \nxx xx \n\n\n"
        );
    }

    #[test]
    fn json_reports_are_one_object_per_line() {
        let board = Board::new(1, 2);
        board.lock().place(1, Position::new(0, 1)).unwrap();

        let mut reporter = Reporter::new(Vec::new(), OutputFormat::Json);
        reporter.report(&board).unwrap();
        reporter.report(&board).unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<Snapshot> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].sequence, 2);
        assert_eq!(lines[0].cells, vec![None, Some(1)]);
    }

    #[test]
    fn run_ends_on_write_failure() {
        let board = Board::new(1, 1);
        let (_trigger, signal) = shutdown::channel();
        let mut reporter = Reporter::new(BrokenPipe, OutputFormat::Text);

        reporter.run(&board, Duration::from_secs(30), &signal);
        assert_eq!(reporter.counter(), 1);
    }
}
