//! Render/network scheduler.
//!
//! The render pump runs on the calling thread at the tick rate: it applies
//! display updates that arrived from the network side, pumps one frame,
//! feeds captured keys to the input mapper and polls the auto-repeat timer.
//! The network side runs independently on the [`NetworkBridge`] runtime and
//! only meets the render side through the input queue and the update
//! channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::KeyEventKind;
use tokio::sync::mpsc;

use crate::adapter::{NetworkBridge, ServerConfig};
use crate::input::{AutoRepeatTimer, InputMapper, InputQueue};
use crate::term::{KeyBatch, Renderer, SurfaceError};
use crate::types::{
    DisplayUpdate, DEFAULT_DAS_MS, DEFAULT_KEY_RELEASE_TIMEOUT_MS, DEFAULT_REPEAT_CAPACITY,
    TICK_MS,
};

/// How held keys are released on terminals without release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTimeout {
    /// Use the default timeout only when the surface lacks release events.
    Auto,
    Off,
    After(Duration),
}

impl ReleaseTimeout {
    pub fn resolve(self, reports_key_release: bool) -> Option<Duration> {
        match self {
            ReleaseTimeout::Auto if reports_key_release => None,
            ReleaseTimeout::Auto => Some(Duration::from_millis(DEFAULT_KEY_RELEASE_TIMEOUT_MS as u64)),
            ReleaseTimeout::Off => None,
            ReleaseTimeout::After(d) => Some(d),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub server: ServerConfig,
    pub das: Duration,
    pub tick: Duration,
    pub repeat_capacity: usize,
    pub key_release_timeout: ReleaseTimeout,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            das: Duration::from_millis(DEFAULT_DAS_MS as u64),
            tick: Duration::from_millis(TICK_MS as u64),
            repeat_capacity: DEFAULT_REPEAT_CAPACITY,
            key_release_timeout: ReleaseTimeout::Auto,
        }
    }
}

impl DisplayConfig {
    /// Create from environment variables; unparsable values keep defaults.
    pub fn from_env() -> Self {
        use std::env;

        fn ms(name: &str) -> Option<u64> {
            env::var(name).ok().and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        let key_release_timeout = match ms("TETRIS_DISPLAY_RELEASE_TIMEOUT_MS") {
            None => ReleaseTimeout::Auto,
            Some(0) => ReleaseTimeout::Off,
            Some(n) => ReleaseTimeout::After(Duration::from_millis(n)),
        };

        Self {
            server: ServerConfig::from_env(),
            das: ms("TETRIS_DISPLAY_DAS_MS").map_or(defaults.das, Duration::from_millis),
            tick: ms("TETRIS_DISPLAY_TICK_MS")
                .filter(|&n| n > 0)
                .map_or(defaults.tick, Duration::from_millis),
            repeat_capacity: env::var("TETRIS_DISPLAY_REPEAT_CAPACITY")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.repeat_capacity),
            key_release_timeout,
        }
    }
}

/// Where display updates come from.
pub trait UpdateSource {
    fn try_next(&mut self) -> Option<DisplayUpdate>;
}

impl UpdateSource for NetworkBridge {
    fn try_next(&mut self) -> Option<DisplayUpdate> {
        self.try_recv()
    }
}

impl UpdateSource for mpsc::UnboundedReceiver<DisplayUpdate> {
    fn try_next(&mut self) -> Option<DisplayUpdate> {
        self.try_recv().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The surface was closed; the scheduler should stop.
    Closed,
}

pub struct Scheduler<R, U> {
    renderer: R,
    source: U,
    mapper: InputMapper,
    timer: AutoRepeatTimer,
    tick: Duration,
}

impl<R: Renderer, U: UpdateSource> Scheduler<R, U> {
    pub fn new(renderer: R, source: U, queue: Arc<InputQueue>, config: &DisplayConfig) -> Self {
        let release_timeout = config
            .key_release_timeout
            .resolve(renderer.reports_key_release());
        if let Some(timeout) = release_timeout {
            log::info!("no key release events; releasing held keys after {:?}", timeout);
        }
        Self {
            mapper: InputMapper::new(Arc::clone(&queue)).with_key_release_timeout(release_timeout),
            timer: AutoRepeatTimer::with_config(queue, config.das, config.tick),
            renderer,
            source,
            tick: config.tick,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn mapper(&self) -> &InputMapper {
        &self.mapper
    }

    pub fn into_parts(self) -> (R, U) {
        (self.renderer, self.source)
    }

    /// Apply pending updates and pump one frame. `None` means closed.
    fn pump(&mut self) -> Result<Option<KeyBatch>> {
        while let Some(update) = self.source.try_next() {
            self.renderer.apply(&update);
        }
        match self.renderer.pump_frame(self.tick) {
            Ok(keys) => Ok(Some(keys)),
            Err(SurfaceError::Closed) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Feed captured keys and run the repeat timer at `now`.
    fn advance(&mut self, keys: &KeyBatch, now: Instant) -> StepOutcome {
        for key in keys {
            match key.kind {
                KeyEventKind::Press => {
                    if let Some(cmd) = self.mapper.on_key_press(key.code, now) {
                        log::trace!("key {:?} -> {}", key.code, cmd);
                    }
                }
                KeyEventKind::Release => self.mapper.on_key_release(key.code),
                // The repeat timer owns repetition.
                KeyEventKind::Repeat => {}
            }
        }
        self.mapper.expire_stale(now);
        self.timer.poll(self.mapper.held(), now);

        if self.renderer.is_open() {
            StepOutcome::Continue
        } else {
            StepOutcome::Closed
        }
    }

    /// One scheduler step with an explicit clock.
    pub fn step(&mut self, now: Instant) -> Result<StepOutcome> {
        match self.pump()? {
            Some(keys) => Ok(self.advance(&keys, now)),
            None => Ok(StepOutcome::Closed),
        }
    }

    fn step_now(&mut self) -> Result<StepOutcome> {
        match self.pump()? {
            Some(keys) => Ok(self.advance(&keys, Instant::now())),
            None => Ok(StepOutcome::Closed),
        }
    }

    /// Run until the surface closes.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.step_now()? == StepOutcome::Closed {
                log::info!("surface closed, stopping");
                return Ok(());
            }
        }
    }

    /// Run at most `frames` steps; returns how many ran before closing.
    pub fn run_frames(&mut self, frames: usize) -> Result<usize> {
        for n in 0..frames {
            if self.step_now()? == StepOutcome::Closed {
                return Ok(n + 1);
            }
        }
        Ok(frames)
    }
}
