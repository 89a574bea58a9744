//! The self-scheduling draw loop.
//!
//! A [`FrameDriver`] asks its [`FrameScheduler`] for the next display
//! refresh before it draws the current one, so a frame that fails to draw
//! does not stall the loop. `stop()` is terminal: nothing is re-armed after it.

use instant::{Duration, Instant};

/// The host's frame-timing facility.
pub trait FrameScheduler {
    /// Requests one more frame callback at the next display refresh.
    fn request_frame(&self);
}

impl FrameScheduler for winit::window::Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct FrameDriver {
    state: LoopState,
    frames: u64,
    last_frame: Option<Instant>,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
            last_frame: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Moves from `Idle` to `Running` and requests the first frame.
    /// Does nothing in any other state.
    pub fn start(&mut self, scheduler: &dyn FrameScheduler) {
        if self.state != LoopState::Idle {
            return;
        }
        log::debug!("frame driver started");
        self.state = LoopState::Running;
        self.last_frame = Some(Instant::now());
        scheduler.request_frame();
    }

    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::debug!("frame driver stopped after {} frames", self.frames);
        }
        self.state = LoopState::Stopped;
    }

    /// Handles one frame callback: re-arms the scheduler, then calls `draw`
    /// with the time since the previous frame. Returns `Ok(false)` without
    /// drawing unless the driver is running.
    pub fn on_frame<E>(
        &mut self,
        scheduler: &dyn FrameScheduler,
        draw: impl FnOnce(Duration) -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.state != LoopState::Running {
            return Ok(false);
        }
        scheduler.request_frame();

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        self.frames += 1;
        draw(dt)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct CountingScheduler {
        requests: Cell<u32>,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    /// Pumps pending frame requests like a display would, up to `ticks` times.
    fn pump(driver: &mut FrameDriver, scheduler: &CountingScheduler, ticks: u32) -> u32 {
        let mut draws = 0;
        for _ in 0..ticks {
            if scheduler.requests.get() == 0 {
                break;
            }
            scheduler.requests.set(scheduler.requests.get() - 1);
            driver
                .on_frame(scheduler, |_| {
                    draws += 1;
                    Ok::<(), ()>(())
                })
                .unwrap();
        }
        draws
    }

    #[test]
    fn idle_driver_draws_nothing() {
        let scheduler = CountingScheduler::default();
        let mut driver = FrameDriver::new();
        let drawn = driver.on_frame(&scheduler, |_| Ok::<(), ()>(())).unwrap();
        assert!(!drawn);
        assert_eq!(scheduler.requests.get(), 0);
        assert_eq!(driver.state(), LoopState::Idle);
    }

    #[test]
    fn running_driver_draws_once_per_tick() {
        let scheduler = CountingScheduler::default();
        let mut driver = FrameDriver::new();
        driver.start(&scheduler);
        driver.start(&scheduler);
        assert_eq!(scheduler.requests.get(), 1);

        assert_eq!(pump(&mut driver, &scheduler, 120), 120);
        assert_eq!(driver.frames(), 120);
        // the next frame is always armed
        assert_eq!(scheduler.requests.get(), 1);
    }

    #[test]
    fn stopped_driver_is_not_rearmed() {
        let scheduler = CountingScheduler::default();
        let mut driver = FrameDriver::new();
        driver.start(&scheduler);
        pump(&mut driver, &scheduler, 10);
        driver.stop();
        assert_eq!(pump(&mut driver, &scheduler, 10), 0);
        assert_eq!(scheduler.requests.get(), 0);
        assert_eq!(driver.frames(), 10);

        driver.start(&scheduler);
        assert_eq!(driver.state(), LoopState::Stopped);
    }

    #[test]
    fn draw_errors_are_returned_but_the_loop_stays_armed() {
        let scheduler = CountingScheduler::default();
        let mut driver = FrameDriver::new();
        driver.start(&scheduler);
        let result = driver.on_frame(&scheduler, |_| Err("surface lost"));
        assert_eq!(result, Err("surface lost"));
        assert_eq!(scheduler.requests.get(), 2);
        assert_eq!(driver.state(), LoopState::Running);
    }
}
