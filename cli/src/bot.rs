use std::error::Error;

use jigsnap_core::geometry::angle_matches;
use jigsnap_core::{scramble, PieceId, Rect, ReleaseOutcome, Table, TableError};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

const PROGRESS_EVERY: u32 = 25;
const TAPS_PER_PAIR_MAX: u32 = 4;
const SCRAMBLE_SPREAD: f32 = 2.0;

#[derive(Clone, Copy, Debug)]
pub(super) struct BotRunConfig {
    pub max_gestures: u32,
    pub drag_steps: u32,
    /// Drop error as a fraction of the solve tolerance.
    pub jitter: f32,
    pub settle_ticks_max: u32,
}

impl Default for BotRunConfig {
    fn default() -> Self {
        Self {
            max_gestures: 10_000,
            drag_steps: 6,
            jitter: 0.5,
            settle_ticks_max: 200,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct BotReport {
    pub taps: u32,
    pub drags: u32,
    pub ticks: u32,
    pub complete: bool,
}

impl BotReport {
    fn gestures(&self) -> u32 {
        self.taps + self.drags
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragPlan {
    piece: PieceId,
    neighbor: PieceId,
    from: (f32, f32),
    to: (f32, f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BotActionPlan {
    Rotate { piece: PieceId },
    Drag(DragPlan),
}

/// Turns every piece by a random number of quarter turns and, optionally,
/// spreads them over an area twice the size of the solved picture.
pub(super) fn scramble_table(table: &mut Table, seed: u32, shuffle_positions: bool) -> Result<(), TableError> {
    let total = table.len();
    let increment = table.config().rotation_increment_deg;
    let rotations = scramble::quarter_turns(seed, total, increment);
    let mut positions = Vec::with_capacity(total);
    let mut extent: Option<Rect> = None;
    let mut largest = 0.0f32;
    for index in 0..total {
        let id = PieceId(index);
        positions.push(table.world_pose(id)?.position);
        let bounds = table.world_bounds(id)?;
        largest = largest.max(bounds.width()).max(bounds.height());
        extent = Some(match extent {
            Some(rect) => Rect::new(
                (rect.min.0.min(bounds.min.0), rect.min.1.min(bounds.min.1)),
                (rect.max.0.max(bounds.max.0), rect.max.1.max(bounds.max.1)),
            ),
            None => bounds,
        });
    }
    if shuffle_positions {
        let area = match (table.config().play_area, extent) {
            (Some(area), _) => area,
            (None, Some(rect)) => Rect::from_center(
                rect.center(),
                (rect.width() * SCRAMBLE_SPREAD, rect.height() * SCRAMBLE_SPREAD),
            ),
            (None, None) => return Ok(()),
        };
        positions = scramble::positions(seed, total, area, (largest, largest));
    }
    for (index, (position, rotation)) in positions.into_iter().zip(rotations).enumerate() {
        table.place(PieceId(index), position, rotation)?;
    }
    Ok(())
}

/// Solves the table through the same press/drag/release gestures a player
/// would use, ticking the simulation in between.
pub(super) fn run_bot(
    table: &mut Table,
    config: BotRunConfig,
    rng: &mut StdRng,
) -> Result<BotReport, Box<dyn Error>> {
    validate_bot_config(config)?;
    let mut report = BotReport::default();
    let mut next_progress = PROGRESS_EVERY;
    while !table.is_complete() && report.gestures() < config.max_gestures {
        let Some(plan) = choose_solver_action(table, rng, config.jitter) else {
            break;
        };
        match plan {
            BotActionPlan::Rotate { piece } => {
                let mut taps = 0;
                loop {
                    tap(table, piece, config, &mut report)?;
                    taps += 1;
                    if taps >= TAPS_PER_PAIR_MAX {
                        break;
                    }
                    match choose_pair_action(table, piece, rng, config.jitter) {
                        Some(BotActionPlan::Rotate { .. }) => {}
                        _ => break,
                    }
                }
            }
            BotActionPlan::Drag(drag) => drag_and_drop(table, drag, config, &mut report)?,
        }
        if report.gestures() >= next_progress {
            next_progress += PROGRESS_EVERY;
            eprintln!(
                "progress: gestures={} groups={} completion={:.2}",
                report.gestures(),
                table.group_count(),
                table.completion_ratio()
            );
        }
    }
    report.complete = table.is_complete();
    if report.complete {
        eprintln!("bot run finished: puzzle is complete");
    }
    Ok(report)
}

fn validate_bot_config(config: BotRunConfig) -> Result<(), Box<dyn Error>> {
    if config.drag_steps == 0 {
        return Err("drag_steps must be at least 1".into());
    }
    if !(0.0..1.0).contains(&config.jitter) {
        return Err("jitter must be in [0, 1)".into());
    }
    if config.settle_ticks_max == 0 {
        return Err("settle_ticks_max must be at least 1".into());
    }
    Ok(())
}

/// Picks a random loose body and plans the next step towards joining it with
/// one of its solved neighbors.
fn choose_solver_action(table: &Table, rng: &mut StdRng, jitter: f32) -> Option<BotActionPlan> {
    let bodies = table.bodies();
    if bodies.len() <= 1 {
        return None;
    }
    let start = rng.random_range(0..bodies.len());
    for offset in 0..bodies.len() {
        let body = bodies[(start + offset) % bodies.len()];
        let Ok(members) = table.members(body) else {
            continue;
        };
        for piece in members {
            if let Some(plan) = choose_pair_action(table, piece, rng, jitter) {
                return Some(plan);
            }
        }
    }
    None
}

fn choose_pair_action(table: &Table, piece: PieceId, rng: &mut StdRng, jitter: f32) -> Option<BotActionPlan> {
    let body = table.body_of(piece).ok()?;
    let own = table.world_pose(piece).ok()?;
    let tolerance = table.config().solve_tolerance;
    for pose in table.piece(piece).ok()?.solution_poses() {
        if table.body_of(pose.neighbor).ok()? == body {
            continue;
        }
        let neighbor = table.world_pose(pose.neighbor).ok()?;
        if !angle_matches(own.rotation, neighbor.rotation, tolerance) {
            return Some(BotActionPlan::Rotate { piece });
        }
        let target = neighbor.transform_point(pose.local_offset);
        let reach = tolerance * jitter;
        let to = if reach > 0.0 {
            (
                target.0 + rng.random_range(-reach..=reach),
                target.1 + rng.random_range(-reach..=reach),
            )
        } else {
            target
        };
        return Some(BotActionPlan::Drag(DragPlan {
            piece,
            neighbor: pose.neighbor,
            from: own.position,
            to,
        }));
    }
    None
}

fn tap(table: &mut Table, piece: PieceId, config: BotRunConfig, report: &mut BotReport) -> Result<(), Box<dyn Error>> {
    let point = table.world_pose(piece)?.position;
    table.begin_touch(piece, point)?;
    let outcome = table.finish_touch(piece, point)?;
    report.taps += 1;
    debug!("tap {piece}: {outcome:?}");
    if outcome != ReleaseOutcome::StartedRotation {
        return Ok(());
    }
    for _ in 0..config.settle_ticks_max {
        let body = table.body_of(piece)?;
        if !table.body_motion(body)?.is_rotating() {
            return Ok(());
        }
        table.update();
        table.fixed_update();
        report.ticks += 1;
    }
    Err(format!("piece {piece} did not settle within {} ticks", config.settle_ticks_max).into())
}

fn drag_and_drop(table: &mut Table, plan: DragPlan, config: BotRunConfig, report: &mut BotReport) -> Result<(), Box<dyn Error>> {
    table.begin_touch(plan.piece, plan.from)?;
    for step in 1..=config.drag_steps {
        let t = step as f32 / config.drag_steps as f32;
        let point = (
            lerp_f32(plan.from.0, plan.to.0, t),
            lerp_f32(plan.from.1, plan.to.1, t),
        );
        table.drag(plan.piece, point)?;
        table.update();
    }
    let outcome = table.finish_touch(plan.piece, plan.to)?;
    table.fixed_update();
    report.drags += 1;
    report.ticks += 1;
    debug!(
        "drag {} towards {}: {outcome:?}, {} bodies left",
        plan.piece,
        plan.neighbor,
        table.bodies().len()
    );
    Ok(())
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
