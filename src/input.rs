// ==============================================================================
// input.rs — DRIVER INPUT SNAPSHOTS
// ------------------------------------------------------------------------------
// The core never talks to devices. An `InputSource` is polled once per step and
// `InputSampler` turns the raw values into a clamped `VehicleInputState`,
// deriving the brake press edge from consecutive samples.
// ==============================================================================

use serde::{Deserialize, Serialize};

/// Raw axis values as a device layer reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInput {
    pub throttle: f32,
    pub brake: f32,
    pub steer: f32,
    pub handbrake: f32,
}

/// Anything that can report the current pedal/steering position.
pub trait InputSource {
    fn read(&mut self) -> RawInput;
}

impl<S: InputSource + ?Sized> InputSource for Box<S> {
    fn read(&mut self) -> RawInput {
        (**self).read()
    }
}

/// Per-step input seen by the drivetrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VehicleInputState {
    pub throttle: f32,   // 0..1
    pub brake: f32,      // 0..1
    pub steer: f32,      // -1..1
    pub handbrake: f32,  // 0..1
    /// Brake went from released to pressed on this step.
    pub brake_just_pressed: bool,
}

impl VehicleInputState {
    pub fn from_raw(raw: RawInput, brake_just_pressed: bool) -> Self {
        Self {
            throttle: sanitize(raw.throttle, 0.0, 1.0),
            brake: sanitize(raw.brake, 0.0, 1.0),
            steer: sanitize(raw.steer, -1.0, 1.0),
            handbrake: sanitize(raw.handbrake, 0.0, 1.0),
            brake_just_pressed,
        }
    }
}

#[inline]
fn sanitize(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { 0.0 }
}

/// Polls a source and tracks the brake edge.
///
/// The edge is only armed once a released brake has been observed, so a pedal
/// that is already down when sampling starts does not count as a press.
pub struct InputSampler<S: InputSource> {
    source: S,
    previous_brake: Option<f32>,
}

impl<S: InputSource> InputSampler<S> {
    pub fn new(source: S) -> Self {
        Self { source, previous_brake: None }
    }

    pub fn sample(&mut self) -> VehicleInputState {
        let raw = self.source.read();
        let mut state = VehicleInputState::from_raw(raw, false);

        state.brake_just_pressed = matches!(self.previous_brake, Some(prev) if prev == 0.0)
            && state.brake > 0.0;
        self.previous_brake = Some(state.brake);

        state
    }

    /// Forget edge history (e.g. after a vehicle reset).
    pub fn reset(&mut self) {
        self.previous_brake = None;
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

// ------------------------------------------------------------------------------
// Scripted input: a list of (start_time, input) segments, each held until the
// next one begins. Used by the headless host and tests.
// ------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSegment {
    pub at: f32, // seconds
    pub input: RawInput,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    segments: Vec<InputSegment>,
    dt: f32,
    steps: u64,
}

impl ScriptedInput {
    /// `dt` is the step length the script advances by on every `read`.
    pub fn new(mut segments: Vec<InputSegment>, dt: f32) -> Self {
        segments.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { segments, dt, steps: 0 }
    }

    /// Hold one input forever.
    pub fn constant(input: RawInput, dt: f32) -> Self {
        Self::new(vec![InputSegment { at: 0.0, input }], dt)
    }

    /// Script time of the next `read`, `steps × dt`.
    pub fn time(&self) -> f32 {
        (self.steps as f64 * f64::from(self.dt)) as f32
    }

    fn current(&self) -> RawInput {
        // a boundary that lands on a step must fire on that step
        let now = self.time() + self.dt * 1e-3;
        self.segments
            .iter()
            .rev()
            .find(|s| s.at <= now)
            .map(|s| s.input)
            .unwrap_or_default()
    }
}

impl InputSource for ScriptedInput {
    fn read(&mut self) -> RawInput {
        let input = self.current();
        self.steps += 1;
        input
    }
}
