// Motor sink capability: the only thing the drive assumes about a motor

/// Anything that accepts a normalized motor command in [-1, 1].
pub trait MotorSink {
    fn set(&mut self, value: f64);
}

impl<M: MotorSink + ?Sized> MotorSink for &mut M {
    fn set(&mut self, value: f64) {
        (**self).set(value)
    }
}

impl<M: MotorSink + ?Sized> MotorSink for Box<M> {
    fn set(&mut self, value: f64) {
        (**self).set(value)
    }
}

/// Simulated motor that remembers the last command it was given
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordingMotor {
    value: f64,
    writes: u64,
}

impl RecordingMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded value (0 before the first write)
    pub fn get(&self) -> f64 {
        self.value
    }

    /// Number of commands received
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl MotorSink for RecordingMotor {
    fn set(&mut self, value: f64) {
        self.value = value;
        self.writes += 1;
    }
}
