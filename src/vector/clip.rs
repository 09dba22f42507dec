//! Rectangular viewport clipping.
//!
//! The plane around the viewport splits into nine sectors:
//!
//! ```text
//!   TL | T | TR
//!   ---+---+---
//!   L  | I | R
//!   ---+---+---
//!   BL | B | BR
//! ```
//!
//! Walking a vertex run, every sector change synthesizes the border
//! points the visible geometry needs: a single crossing when one end is
//! inside, corner points or paired crossings when the segment skirts or
//! traverses the viewport entirely off-screen.

use glam::DVec2;

/// Floor for the slope divisor in the border-point formulas.
const SLOPE_EPSILON: f64 = 1e-6;

/// An ordered run of screen-space vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPolygon {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl ScreenPolygon {
    pub fn open(points: Vec<DVec2>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    pub fn ring(points: Vec<DVec2>) -> Self {
        Self {
            points,
            closed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    TopLeft,
    Top,
    TopRight,
    Left,
    Inside,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Sector {
    fn is_corner(self) -> bool {
        matches!(
            self,
            Sector::TopLeft | Sector::TopRight | Sector::BottomLeft | Sector::BottomRight
        )
    }

    /// Vertical edge sectors sit left or right of the viewport.
    fn is_vertical_edge(self) -> bool {
        matches!(self, Sector::Left | Sector::Right)
    }

    fn is_horizontal_edge(self) -> bool {
        matches!(self, Sector::Top | Sector::Bottom)
    }
}

pub struct RectClipper {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl RectClipper {
    /// Clip bounds sit one pixel outside the canvas so geometry touching
    /// the outermost pixel row is kept intact.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            left: -1.0,
            right: width as f64,
            top: -1.0,
            bottom: height as f64,
        }
    }

    pub fn sector(&self, p: DVec2) -> Sector {
        let col = if p.x < self.left {
            0
        } else if p.x > self.right {
            2
        } else {
            1
        };
        let row = if p.y < self.top {
            0
        } else if p.y > self.bottom {
            2
        } else {
            1
        };
        match (row, col) {
            (0, 0) => Sector::TopLeft,
            (0, 1) => Sector::Top,
            (0, 2) => Sector::TopRight,
            (1, 0) => Sector::Left,
            (1, 1) => Sector::Inside,
            (1, 2) => Sector::Right,
            (2, 0) => Sector::BottomLeft,
            (2, 1) => Sector::Bottom,
            _ => Sector::BottomRight,
        }
    }

    /// Clips one run. Open input yields a new sub-path per re-entry;
    /// closed input accumulates a single spliced ring. Sub-paths with
    /// fewer than 2 (open) or 3 (closed) points are dropped.
    pub fn clip(&self, input: &ScreenPolygon) -> Vec<ScreenPolygon> {
        if input.points.len() < 2 {
            return Vec::new();
        }
        let mut run = ClipRun {
            clipper: self,
            closed: input.closed,
            out: Vec::new(),
            current: Vec::new(),
            last_border: None,
        };

        let mut last_point = input.points[0];
        let mut last_sector = self.sector(last_point);
        if last_sector == Sector::Inside {
            run.current.push(last_point);
        }

        // For rings the wrap-around segment gets the same treatment,
        // without re-emitting the first vertex.
        let total = input.points.len() + usize::from(input.closed);
        for i in 1..total {
            let wrap = i == input.points.len();
            let point = if wrap {
                input.points[0]
            } else {
                input.points[i]
            };
            let sector = self.sector(point);
            if sector != last_sector {
                if sector == Sector::Inside || last_sector == Sector::Inside {
                    let off = if sector == Sector::Inside {
                        last_sector
                    } else {
                        sector
                    };
                    let bp = self.border_point(last_point, point, off);
                    if sector == Sector::Inside && !run.closed {
                        run.flush();
                    }
                    run.current.push(bp);
                    run.last_border = Some(bp);
                } else {
                    run.off_screen(last_point, point, last_sector, sector);
                }
            }
            if sector == Sector::Inside && !wrap {
                run.current.push(point);
            }
            last_point = point;
            last_sector = sector;
        }

        run.flush();
        run.out
    }

    /// Single crossing for a segment with one end inside: "rise over
    /// run" per off-screen sector, clamped to the corner for the
    /// diagonal sectors.
    fn border_point(&self, a: DVec2, b: DVec2, offscreen: Sector) -> DVec2 {
        let mut divisor = b.x - a.x;
        if divisor.abs() < SLOPE_EPSILON {
            divisor = SLOPE_EPSILON.copysign(divisor);
        }
        let mut m = (b.y - a.y) / divisor;
        if m.abs() < SLOPE_EPSILON {
            m = SLOPE_EPSILON.copysign(m);
        }
        let at_y = |edge_x: f64| m * (edge_x - a.x) + a.y;
        let at_x = |edge_y: f64| a.x + (edge_y - a.y) / m;

        match offscreen {
            Sector::Top => DVec2::new(at_x(self.top), self.top),
            Sector::Bottom => DVec2::new(at_x(self.bottom), self.bottom),
            Sector::Left => DVec2::new(self.left, at_y(self.left)),
            Sector::Right => DVec2::new(self.right, at_y(self.right)),
            Sector::TopLeft => DVec2::new(
                at_x(self.top).max(self.left),
                at_y(self.left).max(self.top),
            ),
            Sector::TopRight => DVec2::new(
                at_x(self.top).min(self.right),
                at_y(self.right).max(self.top),
            ),
            Sector::BottomLeft => DVec2::new(
                at_x(self.bottom).max(self.left),
                at_y(self.left).min(self.bottom),
            ),
            Sector::BottomRight => DVec2::new(
                at_x(self.bottom).min(self.right),
                at_y(self.right).min(self.bottom),
            ),
            Sector::Inside => b,
        }
    }

    /// Intersections of segment a→b with the four clip edges, ordered
    /// along the segment. Both endpoints off-screen means 0 or 2 hits.
    fn segment_crossings(&self, a: DVec2, b: DVec2) -> Vec<DVec2> {
        let d = b - a;
        let mut hits: Vec<(f64, DVec2)> = Vec::new();

        let mut push = |t: f64, p: DVec2| {
            if (0.0..=1.0).contains(&t)
                && p.x >= self.left
                && p.x <= self.right
                && p.y >= self.top
                && p.y <= self.bottom
                && !hits.iter().any(|&(_, q)| (q - p).length_squared() < 1e-12)
            {
                hits.push((t, p));
            }
        };

        if d.x.abs() > SLOPE_EPSILON {
            for edge_x in [self.left, self.right] {
                let t = (edge_x - a.x) / d.x;
                push(t, DVec2::new(edge_x, a.y + t * d.y));
            }
        }
        if d.y.abs() > SLOPE_EPSILON {
            for edge_y in [self.top, self.bottom] {
                let t = (edge_y - a.y) / d.y;
                push(t, DVec2::new(a.x + t * d.x, edge_y));
            }
        }

        hits.sort_by(|p, q| p.0.total_cmp(&q.0));
        hits.into_iter().map(|(_, p)| p).collect()
    }

    fn corner(&self, sector: Sector) -> Option<DVec2> {
        match sector {
            Sector::TopLeft => Some(DVec2::new(self.left, self.top)),
            Sector::TopRight => Some(DVec2::new(self.right, self.top)),
            Sector::BottomLeft => Some(DVec2::new(self.left, self.bottom)),
            Sector::BottomRight => Some(DVec2::new(self.right, self.bottom)),
            _ => None,
        }
    }
}

/// Mutable state for one clip pass.
struct ClipRun<'a> {
    clipper: &'a RectClipper,
    closed: bool,
    out: Vec<ScreenPolygon>,
    current: Vec<DVec2>,
    last_border: Option<DVec2>,
}

impl ClipRun<'_> {
    fn flush(&mut self) {
        let min = if self.closed { 3 } else { 2 };
        if self.current.len() >= min {
            self.out.push(ScreenPolygon {
                points: std::mem::take(&mut self.current),
                closed: self.closed,
            });
        } else {
            self.current.clear();
        }
    }

    /// Transition between two off-screen sectors. Adjacent edge pairs
    /// use the corner-aware slope construction; everything else falls
    /// back to the paired edge crossings, or to the traversed corner
    /// when the segment misses the viewport.
    fn off_screen(&mut self, a: DVec2, b: DVec2, from: Sector, to: Sector) {
        let adjacent_edges = (from.is_vertical_edge() && to.is_horizontal_edge())
            || (from.is_horizontal_edge() && to.is_vertical_edge());
        if adjacent_edges {
            self.edge_pair(a, b, from, to);
            return;
        }

        let crossings = self.clipper.segment_crossings(a, b);
        if crossings.len() >= 2 {
            self.emit_traversal(crossings[0], crossings[1]);
        } else if self.closed {
            if let Some(c) = self.clipper.corner(to) {
                self.current.push(c);
            }
        }
    }

    /// One of the eight vertical↔horizontal edge transitions: the
    /// segment either passes behind the shared corner or crosses both
    /// edges near it.
    fn edge_pair(&mut self, a: DVec2, b: DVec2, from: Sector, to: Sector) {
        let clip = self.clipper;
        let vertical = if from.is_vertical_edge() { from } else { to };
        let horizontal = if from.is_horizontal_edge() { from } else { to };
        let edge_x = if vertical == Sector::Left {
            clip.left
        } else {
            clip.right
        };
        let edge_y = if horizontal == Sector::Top {
            clip.top
        } else {
            clip.bottom
        };

        let mut divisor = b.x - a.x;
        if divisor.abs() < SLOPE_EPSILON {
            divisor = SLOPE_EPSILON.copysign(divisor);
        }
        let mut m = (b.y - a.y) / divisor;
        if m.abs() < SLOPE_EPSILON {
            m = SLOPE_EPSILON.copysign(m);
        }
        let xa = a.x + (edge_y - a.y) / m;
        let ya = m * (edge_x - a.x) + a.y;

        let misses_x = if vertical == Sector::Left {
            xa < clip.left
        } else {
            xa > clip.right
        };
        let misses_y = if horizontal == Sector::Top {
            ya < clip.top
        } else {
            ya > clip.bottom
        };

        if misses_x && misses_y {
            // Passes behind the corner: only a ring needs the splice.
            if self.closed {
                self.current.push(DVec2::new(edge_x, edge_y));
            }
            return;
        }

        let on_vertical = DVec2::new(edge_x, ya);
        let on_horizontal = DVec2::new(xa, edge_y);
        if self.closed {
            // Order by the edge the ring last left through; with no
            // crossing seen yet, entry first along the walk direction.
            let vertical_first = match self.last_border {
                Some(lb) => (lb.x - edge_x).abs() < SLOPE_EPSILON,
                None => {
                    (on_vertical - a).length_squared()
                        <= (on_horizontal - a).length_squared()
                }
            };
            if vertical_first {
                self.current.push(on_vertical);
                self.current.push(on_horizontal);
                self.last_border = Some(on_horizontal);
            } else {
                self.current.push(on_horizontal);
                self.current.push(on_vertical);
                self.last_border = Some(on_vertical);
            }
        } else {
            // Entry point first along the walk direction.
            if (on_vertical - a).length_squared() <= (on_horizontal - a).length_squared() {
                self.emit_traversal(on_vertical, on_horizontal);
            } else {
                self.emit_traversal(on_horizontal, on_vertical);
            }
        }
    }

    /// A visible segment between two off-screen vertices. A ring splices
    /// it in place; an open run emits it as its own sub-path.
    fn emit_traversal(&mut self, entry: DVec2, exit: DVec2) {
        if self.closed {
            self.current.push(entry);
            self.current.push(exit);
            self.last_border = Some(exit);
        } else {
            self.flush();
            self.current.push(entry);
            self.current.push(exit);
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clipper() -> RectClipper {
        RectClipper::new(100, 100)
    }

    fn inside(clip: &RectClipper, p: DVec2) -> bool {
        clip.sector(p) == Sector::Inside
    }

    #[test]
    fn sector_classification_covers_all_nine() {
        let c = clipper();
        assert_eq!(c.sector(DVec2::new(-5.0, -5.0)), Sector::TopLeft);
        assert_eq!(c.sector(DVec2::new(50.0, -5.0)), Sector::Top);
        assert_eq!(c.sector(DVec2::new(120.0, -5.0)), Sector::TopRight);
        assert_eq!(c.sector(DVec2::new(-5.0, 50.0)), Sector::Left);
        assert_eq!(c.sector(DVec2::new(50.0, 50.0)), Sector::Inside);
        assert_eq!(c.sector(DVec2::new(120.0, 50.0)), Sector::Right);
        assert_eq!(c.sector(DVec2::new(-5.0, 120.0)), Sector::BottomLeft);
        assert_eq!(c.sector(DVec2::new(50.0, 120.0)), Sector::Bottom);
        assert_eq!(c.sector(DVec2::new(120.0, 120.0)), Sector::BottomRight);
    }

    #[test]
    fn fully_inside_ring_is_unchanged() {
        let c = clipper();
        let ring = ScreenPolygon::ring(vec![
            DVec2::new(10.0, 10.0),
            DVec2::new(90.0, 10.0),
            DVec2::new(90.0, 90.0),
            DVec2::new(10.0, 90.0),
        ]);
        let out = c.clip(&ring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], ring);
    }

    #[test]
    fn fully_outside_yields_nothing() {
        let c = clipper();
        let line = ScreenPolygon::open(vec![
            DVec2::new(-50.0, -50.0),
            DVec2::new(-10.0, -60.0),
        ]);
        assert!(c.clip(&line).is_empty());

        // Off-screen on one side, never crossing.
        let ring = ScreenPolygon::ring(vec![
            DVec2::new(-50.0, 10.0),
            DVec2::new(-10.0, 10.0),
            DVec2::new(-10.0, 90.0),
        ]);
        assert!(c.clip(&ring).is_empty());
    }

    #[test]
    fn single_edge_crossing_gives_one_clamped_subpath() {
        let c = clipper();
        let line = ScreenPolygon::open(vec![
            DVec2::new(50.0, 50.0),
            DVec2::new(150.0, 50.0),
        ]);
        let out = c.clip(&line);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].points.len(), 2);
        assert!(out[0].points.iter().all(|&p| inside(&c, p)));
        assert!((out[0].points[1].x - 100.0).abs() < 1e-3);
        assert!((out[0].points[1].y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn open_run_starts_new_subpath_on_reentry() {
        let c = clipper();
        // In, out the right side, back in.
        let line = ScreenPolygon::open(vec![
            DVec2::new(50.0, 20.0),
            DVec2::new(150.0, 20.0),
            DVec2::new(150.0, 80.0),
            DVec2::new(50.0, 80.0),
        ]);
        let out = c.clip(&line);
        assert_eq!(out.len(), 2);
        for sub in &out {
            assert!(!sub.closed);
            assert!(sub.points.len() >= 2);
            assert!(sub.points.iter().all(|&p| inside(&c, p)));
        }
    }

    #[test]
    fn offscreen_traversal_emits_the_visible_chord() {
        let c = clipper();
        // Left sector straight across to the right sector.
        let line = ScreenPolygon::open(vec![
            DVec2::new(-50.0, 40.0),
            DVec2::new(150.0, 60.0),
        ]);
        let out = c.clip(&line);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].points.len(), 2);
        assert!((out[0].points[0].x - c.left).abs() < 1e-9);
        assert!((out[0].points[1].x - c.right).abs() < 1e-9);
    }

    #[test]
    fn ring_opening_with_an_edge_pair_orders_the_crossing_by_walk() {
        let c = clipper();
        // The first transition is Left -> Top, cutting across the
        // top-left corner before any border point has been recorded:
        // the left-edge hit must still precede the top-edge hit.
        let ring = ScreenPolygon::ring(vec![
            DVec2::new(-50.0, 60.0),
            DVec2::new(60.0, -50.0),
            DVec2::new(60.0, 60.0),
        ]);
        let out = c.clip(&ring);
        assert_eq!(out.len(), 1);
        let pts = &out[0].points;
        assert!(pts.len() >= 5);
        assert!((pts[0].x - c.left).abs() < 1e-9, "first {}", pts[0]);
        assert!((pts[0].y - 11.0).abs() < 1e-3);
        assert!((pts[1].y - c.top).abs() < 1e-9, "second {}", pts[1]);
        assert!((pts[1].x - 11.0).abs() < 1e-3);
        // No segment of the spliced ring crosses itself at the corner.
        assert!(pts[0].y > pts[1].y);
    }

    #[test]
    fn corner_miss_splices_the_corner_into_a_ring() {
        let c = clipper();
        // A ring overlapping the top-left corner area; the off-screen
        // hop from Left to Top passes behind the corner.
        let ring = ScreenPolygon::ring(vec![
            DVec2::new(50.0, 50.0),
            DVec2::new(-50.0, 50.0),
            DVec2::new(5.0, -50.0),
        ]);
        let out = c.clip(&ring);
        assert_eq!(out.len(), 1);
        let corner = DVec2::new(c.left, c.top);
        assert!(out[0]
            .points
            .iter()
            .any(|&p| (p - corner).length_squared() < 1e-12));
    }

    #[test]
    fn corner_crossing_emits_both_edge_points() {
        let c = clipper();
        // Left to Top, but cutting across the corner region on-screen.
        let line = ScreenPolygon::open(vec![
            DVec2::new(-20.0, 30.0),
            DVec2::new(30.0, -20.0),
        ]);
        let out = c.clip(&line);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].points.len(), 2);
        assert!(out[0].points.iter().all(|&p| inside(&c, p)));
    }

    #[test]
    fn short_leftovers_are_discarded() {
        let c = clipper();
        // Touches the inside with a single vertex.
        let line = ScreenPolygon::open(vec![
            DVec2::new(-50.0, -50.0),
            DVec2::new(-50.0, 150.0),
        ]);
        assert!(c.clip(&line).is_empty());
    }
}
