//! Grid A* planner with line-of-sight smoothing
//!
//! The grid is implicit: cells are derived from the obstacle set's interior
//! rectangle and the configured cell size on every call, so there is nothing
//! to invalidate when obstacles move.

use crate::config::NavConfig;
use crate::obstacle::ObstacleSet;
use crate::path::NavPath;
use log::{debug, trace};
use prowl_math::{Rect, Vec2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Cell offset explored from each A* node
#[derive(Debug, Clone, Copy, PartialEq)]
struct NeighborOffset {
    dx: i32,
    dz: i32,
    len: f32,
}

/// Radius-limited neighbor fan, closest first, capped at `max`
fn neighbor_offsets(radius: f32, max: usize) -> Vec<NeighborOffset> {
    let reach = radius.ceil().max(1.0) as i32;
    let mut offsets = Vec::new();
    for dz in -reach..=reach {
        for dx in -reach..=reach {
            if dx == 0 && dz == 0 {
                continue;
            }
            let len = ((dx * dx + dz * dz) as f32).sqrt();
            if len <= radius.max(1.0) {
                offsets.push(NeighborOffset { dx, dz, len });
            }
        }
    }
    offsets.sort_by(|a, b| {
        a.len
            .partial_cmp(&b.len)
            .unwrap_or(Ordering::Equal)
            .then((a.dz, a.dx).cmp(&(b.dz, b.dx)))
    });
    offsets.truncate(max.max(1));
    offsets
}

/// Uniform grid over an interior rectangle
#[derive(Debug, Clone, Copy)]
struct Grid {
    origin: Vec2,
    cell: f32,
    width: usize,
    height: usize,
}

impl Grid {
    fn over(bounds: Rect, cell: f32) -> Option<Self> {
        if bounds.is_degenerate() || cell <= 0.0 {
            return None;
        }
        let width = (bounds.width() / cell).floor() as usize + 1;
        let height = (bounds.depth() / cell).floor() as usize + 1;
        Some(Self {
            origin: Vec2::new(bounds.min_x, bounds.min_z),
            cell,
            width,
            height,
        })
    }

    fn len(&self) -> usize {
        self.width * self.height
    }

    fn index(&self, ix: usize, iz: usize) -> usize {
        iz * self.width + ix
    }

    fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    fn position(&self, index: usize) -> Vec2 {
        let (ix, iz) = self.coords(index);
        self.origin + Vec2::new(ix as f32 * self.cell, iz as f32 * self.cell)
    }

    /// Closest cell to a point, clamped to the grid
    fn cell_of(&self, p: Vec2) -> usize {
        let ix = ((p.x - self.origin.x) / self.cell).round();
        let iz = ((p.z - self.origin.z) / self.cell).round();
        let ix = ix.clamp(0.0, (self.width - 1) as f32) as usize;
        let iz = iz.clamp(0.0, (self.height - 1) as f32) as usize;
        self.index(ix, iz)
    }

    fn offset(&self, index: usize, dx: i32, dz: i32) -> Option<usize> {
        let (ix, iz) = self.coords(index);
        let nx = ix as i64 + dx as i64;
        let nz = iz as i64 + dz as i64;
        if nx < 0 || nz < 0 || nx >= self.width as i64 || nz >= self.height as i64 {
            return None;
        }
        Some(self.index(nx as usize, nz as usize))
    }
}

/// Open-set entry; ordered so the heap pops the lowest f first
#[derive(Clone, Copy)]
struct Node {
    index: usize,
    f_score: f32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.f_score == other.f_score
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// A* planner over an implicit grid
#[derive(Debug, Clone)]
pub struct GridPlanner {
    config: NavConfig,
    offsets: Vec<NeighborOffset>,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self::new(NavConfig::default())
    }
}

impl GridPlanner {
    pub fn new(config: NavConfig) -> Self {
        let offsets = neighbor_offsets(config.neighbor_radius, config.max_neighbors);
        Self { config, offsets }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Clearance used by every planning and steering query
    pub fn clearance(&self) -> f32 {
        self.config.path_clearance()
    }

    /// Plan from `start` to `goal`
    ///
    /// Returns `[start, goal]` when the straight line is clear, an empty path
    /// when the goal is blocked or unreachable, and a smoothed grid route
    /// otherwise. A start inside an inflated obstacle keeps its snapped free
    /// point as the second waypoint, so the first edge only walks outward.
    pub fn compute_path(&self, start: Vec2, goal: Vec2, obstacles: &ObstacleSet) -> NavPath {
        let clearance = self.clearance();
        if obstacles.is_blocked(goal, clearance) {
            debug!("No path: goal ({:.2}, {:.2}) is blocked", goal.x, goal.z);
            return NavPath::empty();
        }
        if obstacles.has_clear_exit_line(start, goal, clearance) {
            return NavPath::new(vec![start, goal]);
        }

        let Some(grid) = Grid::over(obstacles.bounds, self.config.cell_size) else {
            debug!("No path: planning grid is degenerate");
            return NavPath::empty();
        };

        let free_start = self.nearest_free(&grid, start, obstacles, clearance);
        let snapped = free_start != start;
        let start_id = grid.cell_of(free_start);
        let goal_id = grid.cell_of(goal);
        if start_id == goal_id {
            if snapped && obstacles.has_clear_travel_line(free_start, goal, clearance) {
                return NavPath::new(vec![start, free_start, goal]);
            }
            debug!("No path: start and goal share a cell but are not connected");
            return NavPath::empty();
        }

        // Endpoint cells stand at the exact points so every edge is validated
        // against the positions the agent will actually travel between.
        let node_position = |index: usize| {
            if index == start_id {
                free_start
            } else if index == goal_id {
                goal
            } else {
                grid.position(index)
            }
        };

        let Some(chain) = self.astar(&grid, start_id, goal_id, &node_position, obstacles, clearance) else {
            debug!(
                "No path: ({:.2}, {:.2}) -> ({:.2}, {:.2}) unreachable",
                start.x, start.z, goal.x, goal.z
            );
            return NavPath::empty();
        };

        let mut points: Vec<Vec2> = chain.into_iter().map(node_position).collect();
        if let Some(last) = points.last_mut() {
            *last = goal;
        }
        let mut smoothed = self.smooth(&points, obstacles, clearance);
        if snapped {
            smoothed.insert(0, start);
        }
        trace!("Planned {} grid nodes, {} after smoothing", points.len(), smoothed.len());
        NavPath::new(smoothed)
    }

    fn astar(
        &self,
        grid: &Grid,
        start: usize,
        goal: usize,
        position: &dyn Fn(usize) -> Vec2,
        obstacles: &ObstacleSet,
        clearance: f32,
    ) -> Option<Vec<usize>> {
        let size = grid.len();
        let mut g_score = vec![f32::INFINITY; size];
        let mut came_from = vec![usize::MAX; size];
        let mut closed = vec![false; size];
        let mut open_set = BinaryHeap::new();

        let goal_pos = position(goal);
        g_score[start] = 0.0;
        open_set.push(Node {
            index: start,
            f_score: position(start).distance(goal_pos),
        });

        while let Some(current) = open_set.pop() {
            if current.index == goal {
                let mut chain = vec![goal];
                let mut cursor = goal;
                while came_from[cursor] != usize::MAX {
                    cursor = came_from[cursor];
                    chain.push(cursor);
                }
                chain.reverse();
                return Some(chain);
            }
            if closed[current.index] {
                continue;
            }
            closed[current.index] = true;

            let current_pos = position(current.index);
            let current_g = g_score[current.index];
            for offset in &self.offsets {
                let Some(neighbor) = grid.offset(current.index, offset.dx, offset.dz) else {
                    continue;
                };
                if closed[neighbor] {
                    continue;
                }
                let neighbor_pos = position(neighbor);
                if obstacles.is_blocked(neighbor_pos, clearance) {
                    continue;
                }
                let clear = if current.index == start {
                    obstacles.has_clear_exit_line(current_pos, neighbor_pos, clearance)
                } else {
                    obstacles.has_clear_travel_line(current_pos, neighbor_pos, clearance)
                };
                if !clear {
                    continue;
                }
                let tentative = current_g + current_pos.distance(neighbor_pos);
                if tentative >= g_score[neighbor] {
                    continue;
                }
                came_from[neighbor] = current.index;
                g_score[neighbor] = tentative;
                open_set.push(Node {
                    index: neighbor,
                    f_score: tentative + neighbor_pos.distance(goal_pos),
                });
            }
        }
        None
    }

    /// Point itself when free, otherwise the closest free grid node within
    /// the snap ring cap that `p` can walk out to (or the point unchanged
    /// when none is found)
    fn nearest_free(&self, grid: &Grid, p: Vec2, obstacles: &ObstacleSet, clearance: f32) -> Vec2 {
        if !obstacles.is_blocked(p, clearance) {
            return p;
        }
        let center = grid.cell_of(p);
        for ring in 1..=self.config.snap_rings as i32 {
            let mut best: Option<(f32, Vec2)> = None;
            for dz in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dz.abs() != ring {
                        continue;
                    }
                    let Some(index) = grid.offset(center, dx, dz) else {
                        continue;
                    };
                    let candidate = grid.position(index);
                    if obstacles.is_blocked(candidate, clearance)
                        || !obstacles.has_clear_exit_line(p, candidate, clearance)
                    {
                        continue;
                    }
                    let d = candidate.distance_squared(p);
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, candidate));
                    }
                }
            }
            if let Some((_, point)) = best {
                return point;
            }
        }
        p
    }

    /// String-pull: from each kept point jump to the farthest point still in
    /// clear line of sight
    ///
    /// Consecutive points are kept without a check, so they must already be
    /// connected.
    pub fn smooth(&self, points: &[Vec2], obstacles: &ObstacleSet, clearance: f32) -> Vec<Vec2> {
        if points.len() <= 2 {
            return points.to_vec();
        }
        let mut out = vec![points[0]];
        let mut i = 0;
        while i < points.len() - 1 {
            let mut j = points.len() - 1;
            while j > i + 1 && !self.segment_clear(i, points[i], points[j], obstacles, clearance) {
                j -= 1;
            }
            out.push(points[j]);
            i = j;
        }
        out
    }

    /// Re-validate every segment of an existing path against `obstacles`
    ///
    /// The first segment may start inside an inflated obstacle as long as it
    /// walks out of it.
    pub fn is_path_traversable(&self, path: &NavPath, obstacles: &ObstacleSet, clearance: f32) -> bool {
        path.len() >= 2
            && path
                .segments()
                .enumerate()
                .all(|(i, (a, b))| self.segment_clear(i, a, b, obstacles, clearance))
    }

    fn segment_clear(&self, index: usize, a: Vec2, b: Vec2, obstacles: &ObstacleSet, clearance: f32) -> bool {
        if index == 0 {
            obstacles.has_clear_exit_line(a, b, clearance)
        } else {
            obstacles.has_clear_travel_line(a, b, clearance)
        }
    }

    /// Goal is free and a traversable path to it exists
    pub fn can_reach(&self, start: Vec2, goal: Vec2, obstacles: &ObstacleSet) -> bool {
        let clearance = self.clearance();
        if obstacles.is_blocked(goal, clearance) {
            return false;
        }
        if start.distance_squared(goal) < self.config.goal_epsilon * self.config.goal_epsilon {
            return true;
        }
        let path = self.compute_path(start, goal, obstacles);
        self.is_path_traversable(&path, obstacles, clearance)
    }
}
