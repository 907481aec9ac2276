//! Greedy zig-zag traversal of the connectivity graph.
//!
//! The traversal is a small state machine. It seeks an unconsumed vertical
//! run, follows it to its end, and at an inner end point decides whether to
//! continue along the perimeter to a neighboring line, along the perimeter
//! back to the same line, or to finish the polyline at the outer contour.

use super::connect::{
    emit_perimeter_prev_next_segment, emit_perimeter_segment_on_vertical_line,
    intersection_on_next_vertical_line_valid, intersection_on_prev_vertical_line_valid,
    measure_perimeter_horizontal_segment_length,
};
use super::contours::OffsetContours;
use super::scanline::{IntersectionType, LinkQuality, ScanLine};
use crate::geometry::{Point, Polyline, Polylines};
use crate::SCALED_EPSILON;

/// Where the traversal currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraverseState {
    /// No current polyline. Look for an unconsumed outer end point.
    Seeking,
    /// Consume the vertical run starting at intersection `i`.
    FollowingVertical { vline: usize, i: usize },
    /// A vertical run ended at inner point `i`. Pick a way to continue.
    DecidingAtInner { vline: usize, i: usize, going_up: bool },
    /// Emit outer point `i` and close the polyline.
    Finishing { vline: usize, i: usize },
    /// Every vertical run has been consumed.
    Done,
}

/// Greedy traversal over a connected set of scan lines.
pub struct GreedyTraversal<'a> {
    contours: &'a OffsetContours,
    lines: &'a mut [ScanLine],
    current: Polyline,
    last: Point,
    out: Polylines,
}

impl<'a> GreedyTraversal<'a> {
    /// Start a traversal. Runs bounded by outer points only have no inner
    /// contour to connect to and are marked consumed right away.
    pub fn new(contours: &'a OffsetContours, lines: &'a mut [ScanLine], start: Point) -> Self {
        for line in lines.iter_mut() {
            for i in 1..line.intersections.len() {
                if line.intersections[i - 1].kind == IntersectionType::OuterLow
                    && line.intersections[i].kind == IntersectionType::OuterHigh
                {
                    line.intersections[i - 1].consumed_vertical_up = true;
                }
            }
        }
        Self {
            contours,
            lines,
            current: Polyline::new(),
            last: start,
            out: Polylines::new(),
        }
    }

    /// Run the state machine until every run is consumed.
    pub fn run(mut self) -> Polylines {
        let mut state = TraverseState::Seeking;
        while state != TraverseState::Done {
            state = self.step(state);
        }
        self.out
    }

    /// Perform a single transition.
    pub fn step(&mut self, state: TraverseState) -> TraverseState {
        match state {
            TraverseState::Seeking => self.seek(),
            TraverseState::FollowingVertical { vline, i } => self.follow_vertical(vline, i),
            TraverseState::DecidingAtInner { vline, i, going_up } => self.decide(vline, i, going_up),
            TraverseState::Finishing { vline, i } => {
                self.last = self.lines[vline].point(i);
                self.current.push(self.last);
                flush_polyline(&mut self.current, &mut self.out);
                TraverseState::Seeking
            }
            TraverseState::Done => TraverseState::Done,
        }
    }

    /// Polylines finished so far.
    pub fn polylines(&self) -> &Polylines {
        &self.out
    }

    fn seek(&mut self) -> TraverseState {
        let mut best: Option<(i128, usize, usize)> = None;
        for (vline, line) in self.lines.iter().enumerate() {
            for (i, it) in line.intersections.iter().enumerate() {
                if !it.is_outer() {
                    continue;
                }
                let consumed = if it.is_low() {
                    it.consumed_vertical_up
                } else {
                    i == 0 || line.intersections[i - 1].consumed_vertical_up
                };
                if consumed {
                    continue;
                }
                let d2 = self.last.distance_squared(&line.point(i));
                if best.map_or(true, |(d, _, _)| d2 < d) {
                    best = Some((d2, vline, i));
                }
            }
        }
        match best {
            Some((_, vline, i)) => {
                self.last = self.lines[vline].point(i);
                self.current = Polyline::starting_at(self.last);
                TraverseState::FollowingVertical { vline, i }
            }
            None => TraverseState::Done,
        }
    }

    fn follow_vertical(&mut self, vline: usize, start: usize) -> TraverseState {
        let items = &mut self.lines[vline].intersections;
        let going_up = items[start].is_low();
        let mut i = start;
        if going_up {
            // Step back to the bottom of the run to mark it consumed.
            if items[i].is_inner() {
                i -= 1;
            }
            loop {
                items[i].consumed_vertical_up = true;
                i += 1;
                if items[i].kind == IntersectionType::OuterHigh {
                    break;
                }
            }
            if items[i - 1].is_inner() {
                return TraverseState::DecidingAtInner { vline, i: i - 1, going_up };
            }
        } else {
            if items[i].is_inner() {
                items[i].consumed_vertical_up = true;
            }
            loop {
                i -= 1;
                items[i].consumed_vertical_up = true;
                if items[i].kind == IntersectionType::OuterLow {
                    break;
                }
            }
            if items[i + 1].is_inner() {
                return TraverseState::DecidingAtInner { vline, i: i + 1, going_up };
            }
        }
        TraverseState::Finishing { vline, i }
    }

    fn decide(&mut self, vline: usize, i: usize, going_up: bool) -> TraverseState {
        let lines = &mut *self.lines;
        let it = &lines[vline].intersections[i];
        let Some(i_contour) = it.contour else {
            return TraverseState::Finishing { vline, i: outer_neighbor(i, going_up) };
        };
        let i_prev = it.left_horizontal();
        let i_next = it.right_horizontal();
        let prev = i_prev.filter(|_| intersection_on_prev_vertical_line_valid(lines, vline, i));
        let next = i_next.filter(|_| intersection_on_next_vertical_line_valid(lines, vline, i));

        // Neither perimeter segment around this point may be taken later.
        if let Some(p) = i_prev {
            lines[vline - 1].intersections[p].consumed_perimeter_right = true;
        }
        if i_next.is_some() {
            lines[vline].intersections[i].consumed_perimeter_right = true;
        }

        // Zig-zag to a neighboring line, the shorter way if both are open.
        let horizontal = match (prev, next) {
            (Some(p), Some(n)) => {
                let d_prev = measure_perimeter_horizontal_segment_length(self.contours, lines, vline - 1, p, i);
                let d_next = measure_perimeter_horizontal_segment_length(self.contours, lines, vline, i, n);
                Some(if d_next < d_prev { (true, n) } else { (false, p) })
            }
            (None, Some(n)) => Some((true, n)),
            (Some(p), None) => Some((false, p)),
            (None, None) => None,
        };
        if let Some((take_next, target)) = horizontal {
            self.current.push(lines[vline].point(i));
            emit_perimeter_prev_next_segment(
                self.contours,
                lines,
                vline,
                i_contour,
                i,
                target,
                &mut self.current,
                take_next,
            );
            let vline = if take_next { vline + 1 } else { vline - 1 };
            return TraverseState::FollowingVertical { vline, i: target };
        }

        // Otherwise follow the perimeter back to this line.
        let items = &lines[vline].intersections;
        let it = &items[i];
        let i_vertical = it.vertical_outside();
        let quality = match i_vertical {
            Some(v) => {
                let run_bottom = if going_up { v } else { v - 1 };
                if items[run_bottom].consumed_vertical_up {
                    LinkQuality::Invalid
                } else {
                    it.vertical_outside_quality()
                }
            }
            None => LinkQuality::Invalid,
        };
        let Some(v) = i_vertical.filter(|_| quality != LinkQuality::Invalid) else {
            return TraverseState::Finishing { vline, i: outer_neighbor(i, going_up) };
        };

        let forward = if going_up {
            it.has_left_vertical_up()
        } else {
            it.has_right_vertical_down()
        };
        self.current.push(lines[vline].point(i));
        if quality == LinkQuality::Valid {
            emit_perimeter_segment_on_vertical_line(
                self.contours,
                lines,
                vline,
                i_contour,
                i,
                v,
                &mut self.current,
                forward,
            );
        } else {
            // Too long to follow: jump over it, starting a new polyline.
            flush_polyline(&mut self.current, &mut self.out);
            self.current = Polyline::starting_at(lines[vline].point(v));
        }

        // The outer points bypassed by the perimeter are done with.
        let items = &mut lines[vline].intersections;
        let range = if going_up { i..v } else { v..i };
        for k in range {
            items[k].consumed_vertical_up = true;
        }
        items[i].consumed_perimeter_right = true;
        items[outer_neighbor(i, going_up)].consumed_perimeter_right = true;
        TraverseState::FollowingVertical { vline, i: v }
    }
}

/// Close the current polyline, dropping it if it has no extent.
fn flush_polyline(current: &mut Polyline, out: &mut Polylines) {
    let mut polyline = std::mem::take(current);
    polyline.remove_duplicate_points();
    if !polyline.is_degenerate(SCALED_EPSILON) {
        out.push(polyline);
    }
}

#[inline]
fn outer_neighbor(i: usize, going_up: bool) -> usize {
    if going_up {
        i + 1
    } else {
        i - 1
    }
}

/// Chain the vertical runs of `lines` into polylines, greedily starting each
/// polyline at the unconsumed run end closest to where the previous ended.
pub fn traverse_graph_generate_polylines(
    contours: &OffsetContours,
    lines: &mut [ScanLine],
    start: Point,
) -> Polylines {
    GreedyTraversal::new(contours, lines, start).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infill::connect::{connect_segment_intersections_by_contours, LinkParams};
    use crate::infill::monotonic::tests::{dumbbell, pinched_region};
    use crate::infill::scanline::slice_region_by_vertical_lines;
    use crate::infill::scanline::tests::{contours_of, square_region, square_with_hole};
    use crate::{scale, CoordF};

    fn prepared(contours: &OffsetContours, params: &LinkParams) -> Vec<ScanLine> {
        let mut lines = slice_region_by_vertical_lines(contours, 9, scale(1.0), scale(1.0)).unwrap();
        connect_segment_intersections_by_contours(contours, &mut lines, params).unwrap();
        lines
    }

    /// Both ends of every run are marked: the outer-low point and the point
    /// just below each outer-high.
    fn all_runs_consumed(lines: &[ScanLine]) -> bool {
        lines.iter().all(|line| {
            let items = &line.intersections;
            items.iter().enumerate().all(|(i, it)| match it.kind {
                IntersectionType::OuterLow => it.consumed_vertical_up,
                IntersectionType::OuterHigh => items[i - 1].consumed_vertical_up,
                _ => true,
            })
        })
    }

    #[test]
    fn test_traverse_state_transitions() {
        let contours = contours_of(&square_region(10.0));
        let mut lines = prepared(&contours, &LinkParams::default());
        let mut traversal = GreedyTraversal::new(&contours, &mut lines, Point::zero());

        let state = traversal.step(TraverseState::Seeking);
        assert_eq!(state, TraverseState::FollowingVertical { vline: 0, i: 0 });
        let state = traversal.step(state);
        assert_eq!(state, TraverseState::DecidingAtInner { vline: 0, i: 2, going_up: true });
        // The first line has no left neighbor, so the path zig-zags right.
        let state = traversal.step(state);
        assert_eq!(state, TraverseState::FollowingVertical { vline: 1, i: 2 });
        let state = traversal.step(state);
        assert_eq!(state, TraverseState::DecidingAtInner { vline: 1, i: 1, going_up: false });
        assert!(traversal.polylines().is_empty());
        assert_eq!(traversal.step(TraverseState::Done), TraverseState::Done);
    }

    #[test]
    fn test_traverse_square_single_zigzag() {
        let contours = contours_of(&square_region(10.0));
        let mut lines = prepared(&contours, &LinkParams::default());
        let polylines = traverse_graph_generate_polylines(&contours, &mut lines, Point::zero());

        assert_eq!(polylines.len(), 1);
        // Start and end points, plus two turning points per connection.
        assert_eq!(polylines[0].len(), 2 + 2 * 8);
        assert!(all_runs_consumed(&lines));
        assert!(!polylines[0].points().windows(2).any(|w| w[0] == w[1]));
    }

    #[test]
    fn test_traverse_unconnected_lines() {
        let contours = contours_of(&square_region(10.0));
        let params = LinkParams {
            dont_connect: true,
            ..LinkParams::default()
        };
        let mut lines = prepared(&contours, &params);
        let polylines = traverse_graph_generate_polylines(&contours, &mut lines, Point::zero());

        assert_eq!(polylines.len(), 9);
        for polyline in &polylines {
            assert_eq!(polyline.len(), 2);
            assert_eq!(polyline[0].x, polyline[1].x);
        }
        // Each polyline starts at the end of the previous one's line.
        for pair in polylines.windows(2) {
            let end = *pair[0].last().unwrap();
            let start = pair[1][0];
            assert!((end.y - start.y).abs() < scale(0.1));
        }
        assert!(all_runs_consumed(&lines));
    }

    #[test]
    fn test_traverse_square_with_hole_consumes_everything() {
        let region = square_with_hole(10.0, 4.0, 6.0);
        let contours = contours_of(&region);
        let mut lines = prepared(&contours, &LinkParams::default());
        let polylines = traverse_graph_generate_polylines(&contours, &mut lines, Point::zero());

        assert!(!polylines.is_empty());
        assert!(all_runs_consumed(&lines));
        let bbox = contours.bounding_box_outer();
        for p in polylines.iter().flat_map(|pl| pl.points()) {
            assert!(bbox.contains(p));
            // Nothing is emitted inside the hole.
            assert!(!(p.x > scale(4.0) && p.x < scale(6.0) && p.y > scale(4.0) && p.y < scale(6.0)));
        }
    }

    #[test]
    fn test_traverse_split_and_pinched_regions_consume_everything() {
        for (region, n_lines) in [(dumbbell(), 23), (pinched_region(), 9)] {
            let contours = contours_of(&region);
            let mut lines = slice_region_by_vertical_lines(&contours, n_lines, scale(1.0), scale(1.0)).unwrap();
            connect_segment_intersections_by_contours(&contours, &mut lines, &LinkParams::default()).unwrap();
            let polylines = traverse_graph_generate_polylines(&contours, &mut lines, Point::zero());

            assert!(!polylines.is_empty());
            assert!(all_runs_consumed(&lines));
        }
    }

    #[test]
    fn test_traverse_jumps_over_too_long_links() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let params = LinkParams {
            link_max_length: scale(0.3) as CoordF,
            ..LinkParams::default()
        };
        let mut lines = prepared(&contours, &params);
        let polylines = traverse_graph_generate_polylines(&contours, &mut lines, Point::zero());

        assert!(all_runs_consumed(&lines));
        // No connector is short enough, so every polyline is a single straight line.
        for polyline in &polylines {
            assert_eq!(polyline.len(), 2);
            assert_eq!(polyline[0].x, polyline[1].x);
        }
    }
}
