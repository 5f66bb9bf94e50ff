//! Outline of the region holding data.
//!
//! Data split into several 8-connected components is first joined into one
//! region: every component is bridged to the first one by a path of cells
//! running along its first row, then along the first component's column. The
//! single ring traced afterwards therefore encloses every finite cell.
//!
//! The tracer walks the lattice of cell corners counter-clockwise with the
//! data region on its left. It starts at the south-west corner of the first
//! finite cell in row-major order heading east, so the ring runs along the
//! south edge first, then east, north and west. At every corner it prefers a
//! right turn, then straight ahead, then a left turn; preferring the right
//! turn joins cells that only touch at a corner. Only corners where the
//! heading changes are emitted, so collinear runs collapse to their ends.

use tracing::debug;

use crate::error::Result;
use crate::grid::ElevationGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// A closed ring: the last vertex repeats the first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryTrace {
    vertices: Vec<Vertex>,
    components: usize,
    bounding_box_fallback: bool,
}

impl BoundaryTrace {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    /// Number of 8-connected data components the ring encloses.
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// `true` if the grid had no data and the ring is its bounding box.
    pub fn is_bounding_box_fallback(&self) -> bool {
        self.bounding_box_fallback
    }

    /// Shoelace area; positive for the counter-clockwise rings traced here.
    pub fn signed_area(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum::<f64>()
            / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East,
    North,
    West,
    South,
}

impl Heading {
    fn delta(self) -> (i64, i64) {
        match self {
            Heading::East => (1, 0),
            Heading::North => (0, 1),
            Heading::West => (-1, 0),
            Heading::South => (0, -1),
        }
    }

    fn left(self) -> Self {
        match self {
            Heading::East => Heading::North,
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
        }
    }

    fn right(self) -> Self {
        match self {
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
            Heading::North => Heading::East,
        }
    }

    /// Cells ahead-left and ahead-right of corner `(px, py)`.
    fn ahead(self, px: i64, py: i64) -> ((i64, i64), (i64, i64)) {
        match self {
            Heading::East => ((px, py), (px, py - 1)),
            Heading::North => ((px - 1, py), (px, py)),
            Heading::West => ((px - 1, py - 1), (px - 1, py)),
            Heading::South => ((px, py - 1), (px - 1, py - 1)),
        }
    }
}

impl ElevationGrid {
    /// Trace one outer ring enclosing every finite cell.
    ///
    /// Cells connected through a shared corner count as connected. Separate
    /// components are bridged to the first one (row 0 first, then west to
    /// east), so bridge cells lie inside the ring too. Holes are not
    /// reported. A grid without data yields its bounding box.
    pub fn trace_boundary(&self) -> Result<BoundaryTrace> {
        let (width, height) = (self.width(), self.height());
        let mut mask = vec![false; width * height];
        for y in 0..height {
            for x in 0..width {
                mask[y * width + x] = self.has_elevation(x as i64, y as i64)?;
            }
        }

        let seeds = component_seeds(&mask, width, height);
        let Some(&(anchor_x, anchor_y)) = seeds.first() else {
            let bbox = self.bounding_box();
            return Ok(BoundaryTrace {
                vertices: bbox
                    .ring()
                    .into_iter()
                    .map(|(x, y)| Vertex { x, y })
                    .collect(),
                components: 0,
                bounding_box_fallback: true,
            });
        };

        // Bridges stay at or after the anchor in row-major order, so the
        // anchor remains the first inside cell and a valid start.
        for &(seed_x, seed_y) in &seeds[1..] {
            for x in seed_x.min(anchor_x)..=seed_x.max(anchor_x) {
                mask[seed_y * width + x] = true;
            }
            for y in anchor_y..=seed_y {
                mask[y * width + anchor_x] = true;
            }
        }

        let inside = |(x, y): (i64, i64)| -> bool {
            x >= 0
                && y >= 0
                && (x as usize) < width
                && (y as usize) < height
                && mask[y as usize * width + x as usize]
        };

        let start = (anchor_x as i64, anchor_y as i64);
        let mut corners = vec![start];
        let mut position = start;
        let mut heading = Heading::East;

        // Each directed lattice edge is walked at most once
        let max_steps = 2 * (width + 1) * (height + 1) + 4;
        for _ in 0..max_steps {
            let (dx, dy) = heading.delta();
            position = (position.0 + dx, position.1 + dy);

            let (left_cell, right_cell) = heading.ahead(position.0, position.1);
            let next = if inside(right_cell) {
                heading.right()
            } else if inside(left_cell) {
                heading
            } else {
                heading.left()
            };

            if position == start && next == Heading::East {
                break;
            }
            if next != heading {
                corners.push(position);
            }
            heading = next;
        }
        corners.push(start);

        debug!(
            corners = corners.len() - 1,
            components = seeds.len(),
            start_x = anchor_x,
            start_y = anchor_y,
            "traced data boundary"
        );

        let vertices = corners
            .into_iter()
            .map(|(px, py)| Vertex {
                x: self.cell_min_x(px),
                y: self.cell_min_y(py),
            })
            .collect();
        Ok(BoundaryTrace {
            vertices,
            components: seeds.len(),
            bounding_box_fallback: false,
        })
    }
}

/// First cell, in row-major order, of each 8-connected component of `mask`.
fn component_seeds(mask: &[bool], width: usize, height: usize) -> Vec<(usize, usize)> {
    let mut seen = vec![false; mask.len()];
    let mut seeds = Vec::new();
    let mut stack = Vec::new();

    for index in 0..mask.len() {
        if !mask[index] || seen[index] {
            continue;
        }
        seeds.push((index % width, index / width));
        seen[index] = true;
        stack.push(index);

        while let Some(cell) = stack.pop() {
            let (cx, cy) = (cell % width, cell / width);
            for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                    let neighbour = ny * width + nx;
                    if mask[neighbour] && !seen[neighbour] {
                        seen[neighbour] = true;
                        stack.push(neighbour);
                    }
                }
            }
        }
    }
    seeds
}
