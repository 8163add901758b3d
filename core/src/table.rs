use log::{debug, info, trace, warn};

use crate::action::Gesture;
use crate::config::TableConfig;
use crate::contact::{ContactEntry, ContactSet};
use crate::error::TableError;
use crate::event::TableEvent;
use crate::geometry::{normalize_angle, round_to_step, Pose, Rect};
use crate::group::{Group, GroupId};
use crate::motion::{Motion, ReleaseOutcome};
use crate::neighborhood::NeighborhoodScan;
use crate::piece::{Piece, PieceId, PieceSpec, SolutionPose};

/// The thing a gesture actually moves: a lone piece, or the group owning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Body {
    Piece(PieceId),
    Group(GroupId),
}

/// Arena of pieces and groups plus the contact state between them. Pieces and
/// groups refer to each other by index only.
pub struct Table {
    config: TableConfig,
    pieces: Vec<Piece>,
    groups: Vec<Option<Group>>,
    contacts: ContactSet,
    contact_entries: Vec<ContactEntry>,
    events: Vec<TableEvent>,
    completed: bool,
}

impl Table {
    /// Builds a table from pieces laid out in their solved arrangement. Call
    /// [`Table::init_neighborhoods`] before scrambling.
    pub fn new(config: TableConfig, specs: &[PieceSpec]) -> Result<Self, TableError> {
        config.validate()?;
        if specs.is_empty() {
            return Err(TableError::EmptyTable);
        }
        let pieces: Vec<Piece> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Piece::new(PieceId(index), *spec))
            .collect();
        let cell_size = specs
            .iter()
            .map(|spec| spec.size.0.max(spec.size.1))
            .fold(0.0f32, f32::max)
            + config.contact_skin * 2.0;
        let mut table = Self {
            config,
            contacts: ContactSet::new(pieces.len(), cell_size),
            pieces,
            groups: Vec::new(),
            contact_entries: Vec::new(),
            events: Vec::new(),
            completed: false,
        };
        table.refresh_contacts();
        table.check_completion();
        Ok(table)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn piece(&self, id: PieceId) -> Result<&Piece, TableError> {
        self.pieces.get(id.index()).ok_or(TableError::UnknownPiece(id))
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().flatten()
    }

    pub fn group(&self, id: GroupId) -> Result<&Group, TableError> {
        self.groups
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TableError::UnknownGroup(id))
    }

    pub fn group_count(&self) -> usize {
        self.groups().count()
    }

    pub fn group_of(&self, id: PieceId) -> Result<Option<GroupId>, TableError> {
        Ok(self.piece(id)?.group)
    }

    pub fn body_of(&self, id: PieceId) -> Result<Body, TableError> {
        Ok(match self.piece(id)?.group {
            Some(group) => Body::Group(group),
            None => Body::Piece(id),
        })
    }

    /// Lone pieces and live groups, in piece-id order of first appearance.
    pub fn bodies(&self) -> Vec<Body> {
        let mut bodies = Vec::new();
        for piece in &self.pieces {
            let body = match piece.group {
                Some(group) => Body::Group(group),
                None => Body::Piece(piece.id),
            };
            if !bodies.contains(&body) {
                bodies.push(body);
            }
        }
        bodies
    }

    pub fn members(&self, body: Body) -> Result<Vec<PieceId>, TableError> {
        match body {
            Body::Piece(id) => self.piece(id).map(|_| vec![id]),
            Body::Group(id) => self.group(id).map(|group| group.members.clone()),
        }
    }

    pub fn body_pose(&self, body: Body) -> Result<Pose, TableError> {
        match body {
            Body::Piece(id) => self.piece(id).map(|piece| piece.pose),
            Body::Group(id) => self.group(id).map(|group| group.pose),
        }
    }

    pub fn body_motion(&self, body: Body) -> Result<&Motion, TableError> {
        match body {
            Body::Piece(id) => self.piece(id).map(|piece| &piece.motion),
            Body::Group(id) => self.group(id).map(|group| &group.motion),
        }
    }

    pub fn world_pose(&self, id: PieceId) -> Result<Pose, TableError> {
        self.piece(id)?;
        Ok(self.piece_world_pose(id))
    }

    /// Rendering/hit-test depth of a piece; smaller is nearer the viewer.
    pub fn stack_depth(&self, id: PieceId) -> Result<f32, TableError> {
        self.piece(id)?;
        Ok(self.piece_depth(id))
    }

    pub fn world_bounds(&self, id: PieceId) -> Result<Rect, TableError> {
        let piece = self.piece(id)?;
        Ok(Rect::around_pose(self.piece_world_pose(id), piece.size))
    }

    pub fn touching(&self, id: PieceId) -> Result<&[PieceId], TableError> {
        self.piece(id)?;
        Ok(self.contacts.touching(id))
    }

    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records the piece's solution table from the current (solved) layout.
    /// Must run after every piece is in place and before any is moved.
    pub fn init_solution_neighborhood(&mut self, id: PieceId) -> Result<(), TableError> {
        let piece = self.piece(id)?;
        if piece.solution_poses.is_some() {
            return Err(TableError::NeighborhoodAlreadyInitialized(id));
        }
        let poses = self.scan().solution_poses(id.index());
        debug!("piece {id} has {} solved neighbors", poses.len());
        self.pieces[id.index()].solution_poses = Some(poses);
        Ok(())
    }

    /// Initializes every piece that has no solution table yet.
    pub fn init_neighborhoods(&mut self) {
        let scan = self.scan();
        for piece in &mut self.pieces {
            if piece.solution_poses.is_none() {
                piece.solution_poses = Some(scan.solution_poses(piece.id.index()));
            }
        }
        debug!("initialized solution neighborhoods for {} pieces", self.pieces.len());
    }

    fn scan(&self) -> NeighborhoodScan {
        let poses = (0..self.pieces.len())
            .map(|index| self.piece_world_pose(PieceId(index)))
            .collect();
        let sizes = self.pieces.iter().map(|piece| piece.size).collect();
        NeighborhoodScan::new(poses, sizes)
    }

    /// Moves a lone piece, e.g. when scrambling. Rotation is snapped to the
    /// nearest rotation increment.
    pub fn place(&mut self, id: PieceId, position: (f32, f32), rotation: f32) -> Result<(), TableError> {
        let increment = self.config.rotation_increment_deg;
        let piece = self
            .pieces
            .get_mut(id.index())
            .ok_or(TableError::UnknownPiece(id))?;
        if piece.group.is_some() {
            return Err(TableError::PieceGrouped(id));
        }
        piece.pose = Pose::new(position, normalize_angle(round_to_step(rotation, increment)));
        self.refresh_contacts();
        Ok(())
    }

    pub fn apply(&mut self, gesture: Gesture) -> Result<(), TableError> {
        match gesture {
            Gesture::Press { piece, point } => self.begin_touch(piece, point),
            Gesture::Drag { piece, point } => self.drag(piece, point),
            Gesture::Release { piece, point } => self.finish_touch(piece, point).map(|_| ()),
        }
    }

    pub fn begin_touch(&mut self, id: PieceId, point: (f32, f32)) -> Result<(), TableError> {
        let body = self.body_of(id)?;
        if let Some((pose, motion)) = self.body_parts_mut(body) {
            motion.begin_touch(pose, point);
        }
        Ok(())
    }

    pub fn drag(&mut self, id: PieceId, point: (f32, f32)) -> Result<(), TableError> {
        let body = self.body_of(id)?;
        if let Some((pose, motion)) = self.body_parts_mut(body) {
            motion.drag(pose, point);
        }
        self.clamp_to_play_area(body, id);
        self.sync_member_flags(body);
        self.refresh_contacts();
        self.update_stack_order(body);
        Ok(())
    }

    /// Ends a touch. A tap starts a quarter turn; the end of a drag evaluates
    /// the solution poses of everything that was moved. A release never moves
    /// the body, so the release point is not used.
    pub fn finish_touch(&mut self, id: PieceId, _point: (f32, f32)) -> Result<ReleaseOutcome, TableError> {
        let body = self.body_of(id)?;
        let pivot = self.piece_world_pose(id).position;
        let increment = self.config.rotation_increment_deg;
        let outcome = match self.body_parts_mut(body) {
            Some((pose, motion)) => motion.finish_touch(pose, pivot, increment),
            None => ReleaseOutcome::Ignored,
        };
        self.sync_member_flags(body);
        match outcome {
            ReleaseOutcome::Dropped => {
                self.refresh_contacts();
                self.check_body_solutions(id);
            }
            ReleaseOutcome::StartedRotation => trace!("{body:?} started rotating"),
            ReleaseOutcome::DroppedWhileRotating | ReleaseOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Per-frame update: keeps whatever is being dragged or turned in front of
    /// what it touches.
    pub fn update(&mut self) {
        for body in self.bodies() {
            let active = self
                .body_motion(body)
                .map(|motion| motion.is_dragged() || motion.is_rotating())
                .unwrap_or(false);
            if active {
                self.update_stack_order(body);
            }
        }
    }

    pub fn fixed_update(&mut self) {
        self.fixed_update_by(self.config.fixed_timestep);
    }

    /// One simulation step: advance rotations, rebuild contacts, then evaluate
    /// solutions for every body whose rotation settled during this step.
    pub fn fixed_update_by(&mut self, dt: f32) {
        let max_step = self.config.rotation_speed_deg * dt.max(0.0);
        let settle = self.config.rotation_settle_tolerance_deg;
        let increment = self.config.rotation_increment_deg;
        let mut settled = Vec::new();
        for body in self.bodies() {
            let Some((pose, motion)) = self.body_parts_mut(body) else {
                continue;
            };
            if motion.step_rotation(pose, max_step, settle, increment) {
                let rotation = pose.rotation;
                settled.push((body, rotation));
            }
        }
        let mut representatives = Vec::with_capacity(settled.len());
        for (body, rotation) in settled {
            self.sync_member_flags(body);
            trace!("{body:?} settled at {rotation}");
            self.events.push(TableEvent::RotationSettled { body, rotation });
            if let Some(first) = self.members(body).ok().and_then(|m| m.first().copied()) {
                representatives.push(first);
            }
        }
        self.refresh_contacts();
        for piece in representatives {
            self.check_body_solutions(piece);
            if let Ok(body) = self.body_of(piece) {
                self.update_stack_order(body);
            }
        }
    }

    pub fn refresh_contacts(&mut self) {
        let mut entries = std::mem::take(&mut self.contact_entries);
        entries.clear();
        for piece in &self.pieces {
            entries.push(ContactEntry {
                piece: piece.id,
                bounds: Rect::around_pose(self.piece_world_pose(piece.id), piece.size),
                group: piece.group,
            });
        }
        self.contacts.rebuild(&entries, self.config.contact_skin);
        trace!("rebuilt contacts for {} pieces", entries.len());
        self.contact_entries = entries;
    }

    /// Evaluates the solution poses of the piece (or its whole group) against
    /// the current contacts, interlocking every match. Returns how many
    /// interlocks happened.
    pub fn check_solution_poses(&mut self, id: PieceId) -> Result<usize, TableError> {
        self.piece(id)?;
        Ok(self.check_body_solutions(id))
    }

    fn check_body_solutions(&mut self, acting: PieceId) -> usize {
        let mut interlocks = 0;
        loop {
            let Ok(members) = self.body_of(acting).and_then(|body| self.members(body)) else {
                break;
            };
            let mut merged = false;
            for member in members {
                let poses: Vec<SolutionPose> = self.pieces[member.index()].solution_poses().to_vec();
                for pose in poses {
                    if self.contacts.are_touching(pose.piece, pose.neighbor)
                        && self.ready_to_solve(&pose)
                    {
                        self.interlock(&pose);
                        self.refresh_contacts();
                        interlocks += 1;
                        merged = true;
                    }
                }
            }
            if !merged {
                break;
            }
        }
        if interlocks > 0 {
            if let Ok(body) = self.body_of(acting) {
                self.update_stack_order(body);
            }
            self.check_completion();
        }
        interlocks
    }

    /// False once both pieces share a group; otherwise whether the piece sits
    /// at its recorded offset from the neighbor with a matching rotation.
    pub fn ready_to_solve(&self, pose: &SolutionPose) -> bool {
        let (Some(piece), Some(neighbor)) = (
            self.pieces.get(pose.piece.index()),
            self.pieces.get(pose.neighbor.index()),
        ) else {
            return false;
        };
        if piece.group.is_some() && piece.group == neighbor.group {
            return false;
        }
        if self.body_in_motion(piece) || self.body_in_motion(neighbor) {
            return false;
        }
        let piece_world = self.piece_world_pose(pose.piece);
        let neighbor_world = self.piece_world_pose(pose.neighbor);
        let current = neighbor_world.inverse_transform_point(piece_world.position);
        pose.matches(
            current,
            piece_world.rotation,
            neighbor_world.rotation,
            self.config.solve_tolerance,
        )
    }

    /// Whether the body owning `piece` is being dragged or turned. Such a body
    /// never interlocks until it is released or settles.
    fn body_in_motion(&self, piece: &Piece) -> bool {
        let motion = match piece.group.and_then(|group| self.groups[group.0].as_ref()) {
            Some(group) => &group.motion,
            None => &piece.motion,
        };
        motion.is_rotating() || motion.is_dragged()
    }

    fn interlock(&mut self, pose: &SolutionPose) {
        let neighbor_world = self.piece_world_pose(pose.neighbor);
        let snap = neighbor_world.transform_point(pose.local_offset);
        let piece_world = self.piece_world_pose(pose.piece);
        let shift = (snap.0 - piece_world.position.0, snap.1 - piece_world.position.1);
        let piece_group = self.pieces[pose.piece.index()].group;
        let neighbor_group = self.pieces[pose.neighbor.index()].group;

        let group = match (piece_group, neighbor_group) {
            (None, None) => {
                let piece = &mut self.pieces[pose.piece.index()];
                piece.pose.position = snap;
                let seed = piece.pose;
                let depth = piece.motion.depth;
                let unstacked = piece.motion.unstacked_depth;
                let group = GroupId(self.groups.len());
                self.groups.push(Some(Group::new(group, seed, depth, unstacked)));
                self.events.push(TableEvent::GroupCreated { group });
                self.add_piece(group, pose.piece);
                self.add_piece(group, pose.neighbor);
                group
            }
            (None, Some(group)) => {
                self.pieces[pose.piece.index()].pose.position = snap;
                self.add_piece(group, pose.piece);
                group
            }
            (Some(group), None) => {
                self.shift_group(group, shift);
                self.add_piece(group, pose.neighbor);
                group
            }
            (Some(acting), Some(other)) => {
                self.shift_group(acting, shift);
                let acting_len = self.groups[acting.0].as_ref().map(Group::len).unwrap_or(0);
                let other_len = self.groups[other.0].as_ref().map(Group::len).unwrap_or(0);
                if other_len > acting_len {
                    self.merge_groups(other, acting);
                    other
                } else {
                    self.merge_groups(acting, other);
                    acting
                }
            }
        };
        debug!(
            "interlocked piece {} with {} into {group}",
            pose.piece, pose.neighbor
        );
        self.events.push(TableEvent::Interlocked {
            piece: pose.piece,
            neighbor: pose.neighbor,
            group,
        });
    }

    fn shift_group(&mut self, group: GroupId, shift: (f32, f32)) {
        if let Some(group) = self.groups.get_mut(group.0).and_then(Option::as_mut) {
            group.pose.position.0 += shift.0;
            group.pose.position.1 += shift.1;
        }
    }

    /// Reparents the piece into the group's frame, keeping its world pose.
    /// The piece's own depth and motion give way to the group's.
    fn add_piece(&mut self, group: GroupId, id: PieceId) {
        let world = self.piece_world_pose(id);
        let Some(target) = self.groups.get_mut(group.0).and_then(Option::as_mut) else {
            return;
        };
        if !target.insert(id) {
            return;
        }
        let local = target.pose.relative(world);
        let (dragged, rotating, depth) = (
            target.motion.dragged,
            target.motion.rotating,
            target.motion.depth,
        );
        let piece = &mut self.pieces[id.index()];
        piece.pose = local;
        piece.group = Some(group);
        piece.motion.depth = depth;
        piece.motion.dragged = dragged;
        piece.motion.rotating = rotating;
    }

    fn merge_groups(&mut self, into: GroupId, from: GroupId) {
        if into == from {
            warn!("refusing to merge {into} into itself");
            return;
        }
        let Some(absorbed) = self.groups.get_mut(from.0).and_then(Option::take) else {
            return;
        };
        // Members still point at the absorbed group until re-added, so their
        // world pose must be resolved against it.
        for &member in &absorbed.members {
            let world = absorbed.pose.compose(self.pieces[member.index()].pose);
            let piece = &mut self.pieces[member.index()];
            piece.group = None;
            piece.pose = world;
            self.add_piece(into, member);
        }
        debug!("merged {from} ({} pieces) into {into}", absorbed.members.len());
        self.events.push(TableEvent::GroupsMerged { into, from });
    }

    fn update_stack_order(&mut self, body: Body) {
        let Ok(members) = self.members(body) else {
            return;
        };
        let mut nearest: Option<f32> = None;
        for member in &members {
            for &other in self.contacts.touching(*member) {
                if self.body_of(other).ok() == Some(body) {
                    continue;
                }
                let depth = self.piece_depth(other);
                nearest = Some(nearest.map_or(depth, |current| current.min(depth)));
            }
        }
        let thickness = self.config.piece_thickness;
        if let Some((_, motion)) = self.body_parts_mut(body) {
            motion.depth = match nearest {
                Some(depth) => motion.unstacked_depth.min(depth) - thickness,
                None => motion.unstacked_depth,
            };
        }
        if let Body::Group(group) = body {
            let depth = self.groups[group.0].as_ref().map(|g| g.motion.depth);
            if let Some(depth) = depth {
                for member in members {
                    self.pieces[member.index()].motion.depth = depth;
                }
            }
        }
    }

    fn clamp_to_play_area(&mut self, body: Body, touched: PieceId) {
        let Some(area) = self.config.play_area else {
            return;
        };
        let center = self.piece_world_pose(touched).position;
        if area.contains(center) {
            return;
        }
        let clamped = area.clamp(center);
        let shift = (clamped.0 - center.0, clamped.1 - center.1);
        if let Some((pose, _)) = self.body_parts_mut(body) {
            pose.position.0 += shift.0;
            pose.position.1 += shift.1;
        }
    }

    fn sync_member_flags(&mut self, body: Body) {
        let Body::Group(group) = body else {
            return;
        };
        let Some(group) = self.groups.get(group.0).and_then(Option::as_ref) else {
            return;
        };
        let (dragged, rotating) = (group.motion.dragged, group.motion.rotating);
        for member in group.members.clone() {
            let motion = &mut self.pieces[member.index()].motion;
            motion.dragged = dragged;
            motion.rotating = rotating;
        }
    }

    fn body_parts_mut(&mut self, body: Body) -> Option<(&mut Pose, &mut Motion)> {
        match body {
            Body::Piece(id) => self
                .pieces
                .get_mut(id.index())
                .map(|piece| (&mut piece.pose, &mut piece.motion)),
            Body::Group(id) => self
                .groups
                .get_mut(id.0)
                .and_then(Option::as_mut)
                .map(|group| (&mut group.pose, &mut group.motion)),
        }
    }

    fn piece_world_pose(&self, id: PieceId) -> Pose {
        let piece = &self.pieces[id.index()];
        match piece.group.and_then(|group| self.groups[group.0].as_ref()) {
            Some(group) => group.pose.compose(piece.pose),
            None => piece.pose,
        }
    }

    fn piece_depth(&self, id: PieceId) -> f32 {
        let piece = &self.pieces[id.index()];
        match piece.group.and_then(|group| self.groups[group.0].as_ref()) {
            Some(group) => group.motion.depth,
            None => piece.motion.depth,
        }
    }

    /// True once every piece belongs to a single group.
    pub fn is_complete(&self) -> bool {
        if self.pieces.len() == 1 {
            return true;
        }
        let mut groups = self.groups();
        match (groups.next(), groups.next()) {
            (Some(group), None) => group.len() == self.pieces.len(),
            _ => false,
        }
    }

    /// 0.0 with every piece loose, 1.0 when complete.
    pub fn completion_ratio(&self) -> f32 {
        let total = self.pieces.len();
        if total <= 1 {
            return 1.0;
        }
        let bodies = self.bodies().len().max(1);
        let numerator = (bodies - 1) as f32;
        let denom = (total - 1) as f32;
        (1.0 - numerator / denom).clamp(0.0, 1.0)
    }

    fn check_completion(&mut self) {
        if !self.completed && self.is_complete() {
            self.completed = true;
            info!("puzzle complete: {} pieces in one group", self.pieces.len());
            self.events.push(TableEvent::Completed);
        }
    }
}
