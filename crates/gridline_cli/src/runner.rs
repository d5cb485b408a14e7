//! Frame loop driving a replay engine to the terminal.

use crate::config::DisplayConfig;
use crate::input::ControlSource;
use crate::render;
use anyhow::{Context, Result};
use gridline_replay::ReplayEngine;
use std::io::Write;
use std::ops::ControlFlow;
use std::thread;
use std::time::Instant;

/// How a replay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every event was played.
    Finished { frames: u64 },
    /// The viewer quit.
    Quit { frames: u64 },
}

impl RunOutcome {
    pub fn frames(&self) -> u64 {
        match self {
            RunOutcome::Finished { frames } | RunOutcome::Quit { frames } => *frames,
        }
    }
}

/// Options for a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Hold the starting grid on screen before playback.
    pub intro: bool,
}

/// Plays an engine back at its configured frame rate.
pub struct ReplayRunner<W: Write> {
    engine: ReplayEngine,
    display: DisplayConfig,
    out: W,
    frames: u64,
}

impl<W: Write> ReplayRunner<W> {
    pub fn new(engine: ReplayEngine, display: DisplayConfig, out: W) -> Self {
        Self {
            engine,
            display,
            out,
            frames: 0,
        }
    }

    fn draw(&mut self, frame: &gridline_replay::Frame) -> Result<()> {
        let screen = render::render(frame, &self.engine.session().info().name, &self.display);
        // Raw mode turns off the newline to carriage-return translation.
        let screen = screen.replace('\n', "\r\n");
        self.out
            .write_all(screen.as_bytes())
            .and_then(|()| self.out.flush())
            .context("Failed to write frame")
    }

    /// Run until the stream is drained or the viewer quits.
    pub fn run(&mut self, input: &mut impl ControlSource, options: RunOptions) -> Result<RunOutcome> {
        if options.intro {
            let preview = self.engine.preview();
            self.draw(&preview)?;
            thread::sleep(self.display.intro_hold());
        }

        let frame_duration = self.engine.config().frame_duration();
        tracing::info!(
            frame_rate = self.engine.config().frame_rate,
            speed = self.engine.clock().speed(),
            "playback started"
        );

        loop {
            let tick = Instant::now();

            for action in input.poll()? {
                let flow = self.engine.control(action).with_context(|| {
                    format!("Failed to apply {action:?} at {}", self.engine.race_time())
                })?;
                if flow == ControlFlow::Break(()) {
                    tracing::info!(race_time = %self.engine.race_time(), "quit by viewer");
                    return Ok(RunOutcome::Quit {
                        frames: self.frames,
                    });
                }
            }

            let frame = self.engine.frame().with_context(|| {
                format!(
                    "Replay failed at race time {} (event {}, speed {:.2}x)",
                    self.engine.race_time(),
                    self.engine.dispatcher().next_index(),
                    self.engine.clock().speed()
                )
            })?;
            self.draw(&frame)?;
            self.frames = frame.frame_number;

            if frame.finished {
                tracing::info!(race_time = %frame.race_time, frames = self.frames, "replay finished");
                return Ok(RunOutcome::Finished {
                    frames: self.frames,
                });
            }

            let spent = tick.elapsed();
            thread::sleep(frame_duration.saturating_sub(spent));
        }
    }

    pub fn into_inner(self) -> (ReplayEngine, W) {
        (self.engine, self.out)
    }
}
