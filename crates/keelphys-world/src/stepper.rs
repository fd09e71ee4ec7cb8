use keelphys_core::Scalar;

/// Largest backlog the accumulator will hold; frame time beyond this is
/// dropped so a long stall cannot trigger a catch-up spiral.
const MAX_ACCUMULATED: Scalar = 0.25;

/// Fixed-timestep accumulator decoupling variable frame rate from
/// deterministic physics ticks: frame time accumulates, and the callback
/// runs once per whole fixed dt in the backlog.
pub struct FixedTimestep {
    fixed_dt: Scalar,
    accumulator: Scalar,
}

impl FixedTimestep {
    pub fn new(fixed_dt: Scalar) -> Self {
        Self { fixed_dt, accumulator: 0.0 }
    }

    #[inline] pub fn fixed_dt(&self) -> Scalar { self.fixed_dt }
    #[inline] pub fn backlog(&self) -> Scalar { self.accumulator }

    /// Feed one frame's wall-clock delta and run `tick` once per elapsed
    /// fixed step. Returns the number of ticks executed.
    pub fn advance(&mut self, frame_dt: Scalar, mut tick: impl FnMut(Scalar)) -> u32 {
        self.accumulator = (self.accumulator + frame_dt.max(0.0)).min(MAX_ACCUMULATED);
        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt {
            tick(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_frames() {
        let mut stepper = FixedTimestep::new(0.016);
        let mut ran = 0;
        assert_eq!(stepper.advance(0.010, |_| ran += 1), 0);
        assert_eq!(stepper.advance(0.010, |_| ran += 1), 1);
        assert_eq!(ran, 1);
        assert!(stepper.backlog() < 0.016);
    }

    #[test]
    fn long_frame_runs_multiple_ticks() {
        let mut stepper = FixedTimestep::new(0.016);
        let mut total = 0.0;
        let ticks = stepper.advance(0.050, |dt| total += dt);
        assert_eq!(ticks, 3);
        assert!((total - 0.048).abs() < 1.0e-6);
    }

    #[test]
    fn stall_backlog_is_capped() {
        let mut stepper = FixedTimestep::new(0.016);
        let ticks = stepper.advance(10.0, |_| {});
        assert!(ticks <= (MAX_ACCUMULATED / 0.016) as u32 + 1);
    }
}
