use crate::geometry::{move_towards, normalize_angle, round_to_step, rotate_point, Pose};

/// Coarse interaction state of a piece or group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Dragging,
    Rotating,
}

/// What a pointer release did to a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// A tap: a quarter-turn rotation has begun.
    StartedRotation,
    /// A drag ended; solution poses should be evaluated.
    Dropped,
    /// A drag ended while a rotation is still running; evaluation waits for the settle.
    DroppedWhileRotating,
    /// A tap arrived while already rotating; ignored.
    Ignored,
}

/// Drag/rotate/stacking state shared by lone pieces and groups. The pose it
/// moves is owned by the caller so the same logic drives both.
#[derive(Clone, Debug)]
pub struct Motion {
    pub depth: f32,
    pub unstacked_depth: f32,
    pub(crate) touch_offset: (f32, f32),
    pub(crate) dragged: bool,
    pub(crate) rotating: bool,
    pub(crate) target_rotation: f32,
    pub(crate) pivot: (f32, f32),
}

impl Motion {
    pub fn new(depth: f32) -> Self {
        Self {
            depth,
            unstacked_depth: depth,
            touch_offset: (0.0, 0.0),
            dragged: false,
            rotating: false,
            target_rotation: 0.0,
            pivot: (0.0, 0.0),
        }
    }

    pub fn is_dragged(&self) -> bool {
        self.dragged
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn state(&self) -> MotionState {
        if self.rotating {
            MotionState::Rotating
        } else if self.dragged {
            MotionState::Dragging
        } else {
            MotionState::Idle
        }
    }

    pub fn target_rotation(&self) -> Option<f32> {
        self.rotating.then_some(self.target_rotation)
    }

    pub fn begin_touch(&mut self, pose: &Pose, point: (f32, f32)) {
        self.touch_offset = (pose.position.0 - point.0, pose.position.1 - point.1);
    }

    /// Moves the pose so the touch point stays under `point`. A running
    /// rotation carries its pivot along.
    pub fn drag(&mut self, pose: &mut Pose, point: (f32, f32)) {
        self.dragged = true;
        let next = (point.0 + self.touch_offset.0, point.1 + self.touch_offset.1);
        if self.rotating {
            self.pivot.0 += next.0 - pose.position.0;
            self.pivot.1 += next.1 - pose.position.1;
        }
        pose.position = next;
    }

    pub fn finish_touch(&mut self, pose: &Pose, pivot: (f32, f32), increment: f32) -> ReleaseOutcome {
        if !self.rotating && !self.dragged {
            self.rotating = true;
            self.target_rotation = pose.rotation + increment;
            self.pivot = pivot;
            return ReleaseOutcome::StartedRotation;
        }
        if self.dragged {
            self.dragged = false;
            if self.rotating {
                return ReleaseOutcome::DroppedWhileRotating;
            }
            return ReleaseOutcome::Dropped;
        }
        ReleaseOutcome::Ignored
    }

    /// Advances a running rotation by at most `max_step` degrees about the
    /// stored pivot. Returns true on the step the rotation settles, at which
    /// point the pose sits exactly on a multiple of `increment`.
    pub fn step_rotation(
        &mut self,
        pose: &mut Pose,
        max_step: f32,
        settle_tolerance: f32,
        increment: f32,
    ) -> bool {
        if !self.rotating {
            return false;
        }
        let next = move_towards(pose.rotation, self.target_rotation, max_step);
        turn_about(pose, self.pivot, next - pose.rotation);
        if (pose.rotation - self.target_rotation).abs() > settle_tolerance {
            return false;
        }
        let snapped = round_to_step(pose.rotation, increment);
        turn_about(pose, self.pivot, snapped - pose.rotation);
        pose.rotation = normalize_angle(snapped);
        self.rotating = false;
        true
    }
}

fn turn_about(pose: &mut Pose, pivot: (f32, f32), delta: f32) {
    if delta == 0.0 {
        return;
    }
    pose.position = rotate_point(pose.position, pivot, delta);
    pose.rotation += delta;
}
