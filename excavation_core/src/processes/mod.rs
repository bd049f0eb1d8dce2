//! Time-driven fossil processes: the break fade and the post-excavation fall.
//!
//! Each process holds the id of the fossil it drives and is stepped from the
//! host tick. A process whose fossil is gone is dropped without running.

use excavation_rules::{EntityId, FossilConfig};

/// Whether a process needs more ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Finished,
}

/// Hold, then fade opacity linearly to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeOut {
    hold: f32,
    duration: f32,
    elapsed: f32,
}

impl FadeOut {
    pub fn new(hold: f32, duration: f32) -> Self {
        Self {
            hold: hold.max(0.0),
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds, returning the current opacity.
    pub fn step(&mut self, dt: f32) -> (f32, ProcessStatus) {
        self.elapsed += dt.max(0.0);

        let fading_for = self.elapsed - self.hold;
        if fading_for <= 0.0 {
            return (1.0, ProcessStatus::Running);
        }
        if self.duration <= 0.0 || fading_for >= self.duration {
            return (0.0, ProcessStatus::Finished);
        }
        (1.0 - fading_for / self.duration, ProcessStatus::Running)
    }
}

/// Decides when a falling body has come to rest.
///
/// Stillness is accumulated while each step moves less than `epsilon` and is
/// reset by any larger movement.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleWatch {
    window: f32,
    epsilon: f32,
    previous_y: f32,
    still_for: f32,
}

impl SettleWatch {
    pub fn new(window: f32, epsilon: f32, start_y: f32) -> Self {
        Self {
            window,
            epsilon,
            previous_y: start_y,
            still_for: 0.0,
        }
    }

    /// Record the height after a step of `dt` seconds.
    pub fn observe(&mut self, y: f32, dt: f32) -> ProcessStatus {
        if (y - self.previous_y).abs() < self.epsilon {
            self.still_for += dt;
        } else {
            self.still_for = 0.0;
        }
        self.previous_y = y;

        if self.still_for >= self.window {
            ProcessStatus::Finished
        } else {
            ProcessStatus::Running
        }
    }
}

/// Vertical-only fall under gravity with linear damping.
#[derive(Debug, Clone, PartialEq)]
pub struct FallMotion {
    gravity: f32,
    damping: f32,
    velocity: f32,
    settle: SettleWatch,
}

impl FallMotion {
    pub fn new(config: &FossilConfig, start_y: f32) -> Self {
        Self {
            gravity: config.gravity,
            damping: config.linear_damping.max(0.0),
            velocity: 0.0,
            settle: SettleWatch::new(config.settle_window, config.settle_epsilon, start_y),
        }
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Advance by `dt` seconds from height `y`, resting no lower than `rest_y`.
    pub fn step(&mut self, dt: f32, y: f32, rest_y: f32) -> (f32, ProcessStatus) {
        let dt = dt.max(0.0);
        self.velocity -= self.gravity * dt;
        self.velocity *= 1.0 / (1.0 + self.damping * dt);

        let mut next = y + self.velocity * dt;
        if next <= rest_y {
            next = rest_y;
            self.velocity = 0.0;
        }
        (next, self.settle.observe(next, dt))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessKind {
    Fade(FadeOut),
    Fall(FallMotion),
}

/// A process bound to one fossil.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub target: EntityId,
    pub kind: ProcessKind,
}

/// Running processes, in start order.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
}

impl ProcessTable {
    pub fn start_fade(&mut self, target: EntityId, config: &FossilConfig) {
        self.processes.push(Process {
            target,
            kind: ProcessKind::Fade(FadeOut::new(config.fade_hold, config.fade_duration)),
        });
    }

    pub fn start_fall(&mut self, target: EntityId, config: &FossilConfig, start_y: f32) {
        self.processes.push(Process {
            target,
            kind: ProcessKind::Fall(FallMotion::new(config, start_y)),
        });
    }

    /// Check whether a fossil has a running process of the given kind.
    pub fn is_fading(&self, target: EntityId) -> bool {
        self.processes
            .iter()
            .any(|p| p.target == target && matches!(p.kind, ProcessKind::Fade(_)))
    }

    pub fn is_falling(&self, target: EntityId) -> bool {
        self.processes
            .iter()
            .any(|p| p.target == target && matches!(p.kind, ProcessKind::Fall(_)))
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Take every process out for stepping.
    pub(crate) fn take(&mut self) -> Vec<Process> {
        std::mem::take(&mut self.processes)
    }

    /// Put surviving processes back, ahead of any started while stepping.
    pub(crate) fn restore(&mut self, mut survivors: Vec<Process>) {
        survivors.append(&mut self.processes);
        self.processes = survivors;
    }
}
