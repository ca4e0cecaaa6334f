//! Running the media engine as a child process.
//!
//! Both entry points block the calling thread until the process exits; run
//! them from a worker (see [`crate::export::export_project`]).

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use reelcut_common::{parse_clock_stamp, ProgressThrottle, ReelcutError, ReelcutResult};

/// How often cancellation is checked while waiting for output.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Progress that does not move for this long gets a warning.
const STALL_WARNING: Duration = Duration::from_secs(10);

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 40;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl AsRef<Path>, args: Vec<String>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args,
        }
    }

    /// Program followed by its arguments, as reported in failures.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Same command asking ffmpeg for `key=value` progress on stdout.
    ///
    /// The flags go right before the last argument, which is the output.
    pub fn with_progress_pipe(&self) -> Self {
        let mut args = self.args.clone();
        let at = args.len().saturating_sub(1);
        args.splice(
            at..at,
            ["-progress", "pipe:1", "-nostats"].map(String::from),
        );
        Self {
            program: self.program.clone(),
            args,
        }
    }

    fn spawn(&self, stdout: Stdio) -> ReelcutResult<Child> {
        tracing::debug!(args = ?self.argv(), "Spawning process");
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelcutError::render(format!(
                    "Failed to start {}: {e}",
                    self.program.display()
                ))
            })
    }
}

/// Keep the last `limit` lines of a stream.
fn read_tail(reader: impl Read, limit: usize) -> String {
    let mut tail = VecDeque::with_capacity(limit);
    for line in BufReader::new(reader).lines() {
        let Ok(line) = line else { break };
        if tail.len() == limit {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}

/// Run to completion; a non-zero exit becomes
/// [`ReelcutError::ProcessFailed`] carrying the exit code, the full argument
/// vector and the tail of stderr.
pub fn run(command: &EngineCommand) -> ReelcutResult<()> {
    let mut child = command.spawn(Stdio::null())?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelcutError::render("Failed to capture process stderr"))?;
    let stderr_tail = read_tail(stderr, STDERR_TAIL_LINES);

    let status = child
        .wait()
        .map_err(|e| ReelcutError::render(format!("Failed to wait on process: {e}")))?;
    if !status.success() {
        return Err(ReelcutError::ProcessFailed {
            code: status.code(),
            args: command.argv(),
            stderr: stderr_tail,
        });
    }
    Ok(())
}

/// Seconds of output written so far, from one progress line.
///
/// Understands `out_time_us=` / `out_time_ms=` counters (both microseconds
/// in practice) and `time=HH:MM:SS[.frac]` stamps; the counter wins when a
/// line carries both.
pub fn parse_progress_seconds(line: &str) -> Option<f64> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }

    let counter = text.split_whitespace().find_map(|token| {
        let value = token
            .strip_prefix("out_time_us=")
            .or_else(|| token.strip_prefix("out_time_ms="))?;
        value.parse::<u64>().ok()
    });
    if let Some(micros) = counter {
        return Some(micros as f64 / 1_000_000.0);
    }

    text.split_whitespace().find_map(|token| {
        let (_, stamp) = token.split_once("time=")?;
        parse_clock_stamp(stamp)
    })
}

/// Turns raw progress lines into a clamped, non-decreasing, throttled
/// sequence of positions.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    /// Upper bound for positions; `None` when no duration hint was given.
    total: Option<f64>,
    last: f64,
    throttle: ProgressThrottle,
    started: Instant,
    last_advance: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(total: f64, throttle: ProgressThrottle) -> Self {
        let now = Instant::now();
        Self {
            total: known_total(total),
            last: 0.0,
            throttle,
            started: now,
            last_advance: now,
        }
    }

    /// Position to report for `line`, if any.
    ///
    /// Values are clamped to `[0, total]`, or only floored at 0 without a
    /// duration hint; anything behind the last position seen is dropped.
    pub(crate) fn observe(&mut self, line: &str) -> Option<f64> {
        let seconds = parse_progress_seconds(line)?.max(0.0);
        let position = match self.total {
            Some(total) => seconds.min(total),
            None => seconds,
        };
        if position < self.last {
            return None;
        }
        if position > self.last + 1e-3 {
            self.last_advance = Instant::now();
        }
        self.last = position;

        let now_ns = u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.throttle.should_emit(position, now_ns).then_some(position)
    }

    pub(crate) fn position(&self) -> f64 {
        self.last
    }

    fn stalled_for(&self) -> Duration {
        self.last_advance.elapsed()
    }

    fn reset_stall(&mut self) {
        self.last_advance = Instant::now();
    }
}

/// A usable duration hint, or `None` for zero, negative or non-finite ones.
fn known_total(total: f64) -> Option<f64> {
    (total.is_finite() && total > 0.0).then_some(total)
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "Process already exited before kill");
    }
    child.wait().ok();
}

/// Run while reporting progress as `(position_sec, total_sec)`.
///
/// - Always reports `(0, total)` first and `(total, total)` on success.
/// - Reported positions never decrease and never exceed `total`.
/// - A `total_duration` of 0 means the length is unknown: positions are
///   reported unbounded and the last report on success carries the final
///   position seen, still paired with `0`.
/// - `should_cancel` is polled at every tick; once it returns true the
///   process is killed and [`ReelcutError::Cancelled`] is returned.
/// - A non-zero exit is [`ReelcutError::ProcessFailed`] with the stderr
///   tail attached.
pub fn run_with_progress<P, C>(
    command: &EngineCommand,
    total_duration: f64,
    on_progress: P,
    should_cancel: C,
) -> ReelcutResult<()>
where
    P: FnMut(f64, f64),
    C: Fn() -> bool,
{
    run_with_progress_throttled(
        command,
        total_duration,
        ProgressThrottle::default(),
        on_progress,
        should_cancel,
    )
}

/// [`run_with_progress`] with an explicit pacing policy.
pub fn run_with_progress_throttled<P, C>(
    command: &EngineCommand,
    total_duration: f64,
    throttle: ProgressThrottle,
    mut on_progress: P,
    should_cancel: C,
) -> ReelcutResult<()>
where
    P: FnMut(f64, f64),
    C: Fn() -> bool,
{
    let command = command.with_progress_pipe();
    let total = known_total(total_duration).unwrap_or(0.0);
    let started = Instant::now();

    let mut child = command.spawn(Stdio::piped())?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ReelcutError::render("Failed to capture process stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelcutError::render("Failed to capture process stderr"))?;

    tracing::info!(
        pid = child.id(),
        args_len = command.args.len(),
        total_secs = total,
        "Process started"
    );

    // Drain stderr concurrently so the child never blocks on a full pipe.
    let stderr_task = std::thread::spawn(move || read_tail(stderr, STDERR_TAIL_LINES));

    let (tx, rx) = mpsc::channel::<String>();
    let stdout_task = std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    on_progress(0.0, total);
    let mut tracker = ProgressTracker::new(total, throttle);

    loop {
        if should_cancel() {
            tracing::info!(
                position_secs = tracker.position(),
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Cancelling process"
            );
            stop(&mut child);
            return Err(ReelcutError::Cancelled);
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if let Some(position) = tracker.observe(&line) {
                    on_progress(position, total);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if tracker.stalled_for() >= STALL_WARNING {
            tracing::warn!(
                position_secs = tracker.position(),
                elapsed_secs = started.elapsed().as_secs_f64(),
                "No progress advancement for 10s"
            );
            tracker.reset_stall();
        }
    }

    let status = child
        .wait()
        .map_err(|e| ReelcutError::render(format!("Failed to wait on process: {e}")))?;
    stdout_task.join().ok();
    let stderr_tail = stderr_task
        .join()
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

    if !status.success() {
        return Err(ReelcutError::ProcessFailed {
            code: status.code(),
            args: command.argv(),
            stderr: stderr_tail,
        });
    }

    let end = if total > 0.0 { total } else { tracker.position() };
    on_progress(end, total);
    tracing::info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Process finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counter_lines() {
        assert_eq!(parse_progress_seconds("out_time_us=1500000"), Some(1.5));
        assert_eq!(parse_progress_seconds("out_time_ms=2000000"), Some(2.0));
        assert_eq!(parse_progress_seconds("out_time_us=N/A"), None);
    }

    #[test]
    fn test_parse_clock_stamp_lines() {
        let stats = "frame=  100 fps= 25 q=28.0 size=512kB time=00:01:02.50 bitrate=67.1kbits/s";
        assert_eq!(parse_progress_seconds(stats), Some(62.5));
        assert_eq!(parse_progress_seconds("out_time=00:00:03.250000"), Some(3.25));
        assert_eq!(parse_progress_seconds("progress=continue"), None);
        assert_eq!(parse_progress_seconds("   "), None);
    }

    #[test]
    fn test_counter_preferred_over_stamp() {
        assert_eq!(
            parse_progress_seconds("time=00:00:09.00 out_time_us=1000000"),
            Some(1.0)
        );
    }

    #[test]
    fn test_tracker_is_monotone_and_clamped() {
        let mut tracker = ProgressTracker::new(5.0, ProgressThrottle::unthrottled());
        let lines = [
            "out_time_us=1000000",
            "out_time_us=500000",
            "out_time_us=2000000",
            "garbage",
            "out_time_us=9000000",
        ];
        let emitted: Vec<f64> = lines.iter().filter_map(|l| tracker.observe(l)).collect();
        assert_eq!(emitted, vec![1.0, 2.0, 5.0]);
        assert_eq!(tracker.position(), 5.0);
    }

    #[test]
    fn test_tracker_without_hint_is_only_floored() {
        let mut tracker = ProgressTracker::new(0.0, ProgressThrottle::unthrottled());
        let lines = ["out_time_us=1000000", "out_time_us=3000000", "out_time_us=2000000"];
        let emitted: Vec<f64> = lines.iter().filter_map(|l| tracker.observe(l)).collect();
        assert_eq!(emitted, vec![1.0, 3.0]);
        assert_eq!(tracker.position(), 3.0);

        let mut tracker = ProgressTracker::new(f64::NAN, ProgressThrottle::unthrottled());
        assert_eq!(tracker.observe("out_time_us=7000000"), Some(7.0));
    }

    #[test]
    fn test_tracker_throttles_small_steps() {
        let mut tracker = ProgressTracker::new(100.0, ProgressThrottle::new(0, 1.0));
        assert_eq!(tracker.observe("out_time_us=100000"), Some(0.1));
        assert_eq!(tracker.observe("out_time_us=200000"), None);
        assert_eq!(tracker.observe("out_time_us=1200000"), Some(1.2));
    }

    #[test]
    fn test_progress_pipe_goes_before_output() {
        let command = EngineCommand::new("ffmpeg", vec!["-y".into(), "out.mp4".into()]);
        assert_eq!(
            command.with_progress_pipe().argv(),
            vec!["ffmpeg", "-y", "-progress", "pipe:1", "-nostats", "out.mp4"]
        );
    }
}
