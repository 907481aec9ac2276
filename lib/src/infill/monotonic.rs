//! Monotonic region decomposition.
//!
//! A monotonic region is a block of vertical runs on consecutive scan lines
//! that can be printed as a single zig-zag, each run overlapping exactly one
//! run on either neighboring line. Regions are described by their leftmost
//! and rightmost runs only, addressed by line index and offset within line.

use std::collections::HashMap;

use super::connect::measure_perimeter_horizontal_segment_length;
use super::contours::OffsetContours;
use super::scanline::{Intersection, IntersectionType, LinkQuality, ScanLine, Side};
use crate::geometry::Point;
use crate::{CoordF, Error, Result, SCALING_FACTOR};

/// A vertical run of a region boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub vline: usize,
    /// Inner-low point at the bottom of the run.
    pub low: usize,
    /// Inner-high point at the top of the run.
    pub high: usize,
}

#[derive(Clone, Debug)]
pub struct MonotonicRegion {
    pub left: Boundary,
    pub right: Boundary,
    /// Extra connection length when starting at `left.low`, mm.
    pub len1: CoordF,
    /// Extra connection length when starting at `left.high`, mm.
    pub len2: CoordF,
    /// Starting at `left.low` ends at `right.high`, and vice versa.
    pub flips: bool,
    /// Regions that have to be printed before this one.
    pub left_neighbors: Vec<usize>,
    pub right_neighbors: Vec<usize>,
}

impl MonotonicRegion {
    fn new(seed: Boundary) -> Self {
        Self {
            left: seed,
            right: seed,
            len1: 0.0,
            len2: 0.0,
            flips: false,
            left_neighbors: Vec::new(),
            right_neighbors: Vec::new(),
        }
    }

    #[inline]
    pub fn length(&self, flipped: bool) -> CoordF {
        if flipped {
            self.len2
        } else {
            self.len1
        }
    }

    /// Entry point on the left boundary.
    #[inline]
    pub fn left_intersection_point(&self, flipped: bool) -> usize {
        if flipped {
            self.left.high
        } else {
            self.left.low
        }
    }

    /// Exit point on the right boundary.
    #[inline]
    pub fn right_intersection_point(&self, flipped: bool) -> usize {
        if flipped == self.flips {
            self.right.low
        } else {
            self.right.high
        }
    }

    pub fn num_lines(&self) -> usize {
        self.right.vline - self.left.vline + 1
    }
}

/// Split runs where the outer contour pinches the inner contour into two
/// loops. A phony outer-high and outer-low pair is inserted between the
/// inner-high and inner-low points that do not belong to one connected run,
/// and every index into the modified line is remapped.
pub fn pinch_contours_insert_phony_outer_intersections(lines: &mut [ScanLine]) {
    for vline in 1..lines.len() {
        let items = &lines[vline].intersections;
        if items.len() < 2 {
            continue;
        }
        let end = items.len() - 1;
        let mut insert_after = Vec::new();
        let mut it = 1;
        while it < end {
            if items[it].kind == IntersectionType::OuterHigh {
                it += 2;
                continue;
            }
            let hi = it + 1;
            let lo2 = it + 2;
            it = lo2;
            if lo2 <= end && items[lo2].kind == IntersectionType::InnerLow {
                let up = items[hi].vertical_up();
                let dn = items[lo2].vertical_down();
                let connected = matches!((up, dn), (Some(u), Some(d)) if d + 1 == u);
                if !connected {
                    insert_after.push(hi);
                }
            }
        }
        if insert_after.is_empty() {
            continue;
        }

        let old = std::mem::take(&mut lines[vline].intersections);
        let mut map = Vec::with_capacity(old.len());
        let mut new: Vec<Intersection> = Vec::with_capacity(old.len() + 2 * insert_after.len());
        let mut pending = insert_after.into_iter().peekable();
        let mut prev_y = 0;
        for (i, item) in old.into_iter().enumerate() {
            if i > 0 && pending.next_if_eq(&(i - 1)).is_some() {
                let y = (prev_y + item.y()) / 2;
                new.push(Intersection::phony(IntersectionType::OuterHigh, y));
                new.push(Intersection::phony(IntersectionType::OuterLow, y));
            }
            prev_y = item.y();
            map.push(new.len());
            new.push(item);
        }
        for ip in &mut new {
            for link in [&mut ip.prev, &mut ip.next] {
                if link.is_vertical() {
                    link.target = link.target.map(|t| map[t]);
                }
            }
        }
        lines[vline].intersections = new;

        for ip in &mut lines[vline - 1].intersections {
            if ip.right_horizontal().is_some() {
                ip.next.target = ip.next.target.map(|t| map[t]);
            }
        }
        if let Some(next_line) = lines.get_mut(vline + 1) {
            for ip in &mut next_line.intersections {
                if ip.left_horizontal().is_some() {
                    ip.prev.target = ip.prev.target.map(|t| map[t]);
                }
            }
        }
    }
}

/// The inner-high point closing the run that starts at inner-low `start`,
/// skipping interleaved inner pairs up to the outer-high point.
pub fn end_of_vertical_run_raw(line: &ScanLine, start: usize) -> usize {
    let items = &line.intersections;
    let mut it = start;
    loop {
        it += 1;
        if items[it].kind == IntersectionType::OuterHigh {
            break;
        }
    }
    if items[it - 1].is_inner() {
        it -= 1;
    }
    it
}

/// Like [`end_of_vertical_run_raw`], following valid vertical links up.
pub fn end_of_vertical_run(line: &ScanLine, start: usize) -> usize {
    let mut end = end_of_vertical_run_raw(line, start);
    while let Some(up) = line.intersections[end].valid_vertical_up() {
        end = end_of_vertical_run_raw(line, up);
    }
    end
}

/// Lowest inner-low point of the run containing inner point `start`.
pub fn vertical_run_bottom(line: &ScanLine, start: usize) -> usize {
    let items = &line.intersections;
    let mut it = start;
    loop {
        while items[it].kind != IntersectionType::InnerLow {
            it -= 1;
        }
        if it > 0 && items[it - 1].kind == IntersectionType::InnerHigh {
            it -= 1;
        } else {
            match items[it].valid_vertical_down() {
                Some(down) => it = down,
                None => break,
            }
        }
    }
    it
}

/// Highest inner-high point of the run containing inner point `start`.
pub fn vertical_run_top(line: &ScanLine, start: usize) -> usize {
    let items = &line.intersections;
    let mut it = start;
    loop {
        while items[it].kind != IntersectionType::InnerHigh {
            it += 1;
        }
        if items.get(it + 1).map(|p| p.kind) == Some(IntersectionType::InnerLow) {
            it += 1;
        } else {
            match items[it].valid_vertical_up() {
                Some(up) => it = up,
                None => break,
            }
        }
    }
    it
}

fn other_vline(vline: usize, side: Side) -> usize {
    match side {
        Side::Left => vline - 1,
        Side::Right => vline + 1,
    }
}

/// Bottom of the lowest run on the neighboring line reached by a horizontal
/// link from the run `start..=end`.
fn overlap_bottom(lines: &[ScanLine], vline: usize, start: usize, end: usize, side: Side) -> Option<usize> {
    let items = &lines[vline].intersections;
    let mut it = start;
    let other = loop {
        let p = &items[it];
        if p.is_inner() {
            if let Some(i) = p.horizontal(side) {
                break Some(i);
            }
            if it == end {
                break None;
            }
        }
        if p.kind != IntersectionType::InnerHigh
            || items.get(it + 1).map(|n| n.kind) == Some(IntersectionType::InnerLow)
        {
            it += 1;
        } else {
            match p.valid_vertical_up() {
                Some(up) => it = up,
                None => break None,
            }
        }
    }?;
    Some(vertical_run_bottom(&lines[other_vline(vline, side)], other))
}

/// Top of the highest run on the neighboring line reached by a horizontal
/// link from the run `start..=end`.
fn overlap_top(lines: &[ScanLine], vline: usize, start: usize, end: usize, side: Side) -> Option<usize> {
    let items = &lines[vline].intersections;
    let mut it = end;
    let other = loop {
        let p = &items[it];
        if p.is_inner() {
            if let Some(i) = p.horizontal(side) {
                break Some(i);
            }
            if it == start {
                break None;
            }
        }
        if p.kind != IntersectionType::InnerLow
            || (it > 0 && items[it - 1].kind == IntersectionType::InnerHigh)
        {
            it -= 1;
        } else {
            match p.valid_vertical_down() {
                Some(down) => it = down,
                None => break None,
            }
        }
    }?;
    Some(vertical_run_top(&lines[other_vline(vline, side)], other))
}

/// Span on the neighboring line `side` overlapped by the run `start..=end`.
pub fn overlap(lines: &[ScanLine], vline: usize, (start, end): (usize, usize), side: Side) -> Option<(usize, usize)> {
    if side == Side::Left && vline == 0 || side == Side::Right && vline + 1 >= lines.len() {
        return None;
    }
    let bottom = overlap_bottom(lines, vline, start, end, side)?;
    let top = overlap_top(lines, vline, start, end, side)?;
    Some((bottom, top))
}

/// Decompose the scan lines into monotonic regions. The bottom point of
/// every run taken into a region is marked consumed.
pub fn generate_monotonic_regions(lines: &mut [ScanLine]) -> Vec<MonotonicRegion> {
    let mut regions = Vec::new();
    for vline_seed in 0..lines.len() {
        let len = lines[vline_seed].len();
        let mut i_seed = 1;
        while i_seed + 1 < len {
            let items = &lines[vline_seed].intersections;
            while i_seed < len && items[i_seed].kind != IntersectionType::InnerLow {
                i_seed += 1;
            }
            if i_seed >= len {
                break;
            }
            let start = i_seed;
            let end = end_of_vertical_run(&lines[vline_seed], start);
            if !lines[vline_seed].intersections[start].consumed_vertical_up {
                regions.push(grow_region(lines, vline_seed, start, end));
            }
            i_seed = end + 1;
        }
    }
    regions
}

/// Extend a region to the right while the runs overlap one to one.
fn grow_region(lines: &mut [ScanLine], vline_seed: usize, start: usize, end: usize) -> MonotonicRegion {
    let mut region = MonotonicRegion::new(Boundary {
        vline: vline_seed,
        low: start,
        high: end,
    });
    lines[vline_seed].intersections[start].consumed_vertical_up = true;
    let mut left = (start, end);
    let mut num_lines = 1;
    let mut vline = vline_seed;
    while vline + 1 < lines.len() {
        vline += 1;
        let Some(right) = overlap(lines, vline - 1, left, Side::Right) else {
            break;
        };
        if vertical_run_top(&lines[vline], right.0) != right.1 {
            // Overlaps several runs on the right.
            break;
        }
        if overlap(lines, vline, right, Side::Left) != Some(left) {
            // The right run overlaps several runs on the left.
            break;
        }
        region.right = Boundary {
            vline,
            low: right.0,
            high: right.1,
        };
        lines[vline].intersections[right.0].consumed_vertical_up = true;
        num_lines += 1;
        left = right;
    }
    // An odd number of lines ends the zig-zag on the opposite side.
    region.flips = num_lines % 2 == 1;
    region
}

/// Link each region with the regions overlapping its left and right
/// boundaries, then compute the region path lengths.
pub fn connect_monotonic_regions(
    regions: &mut [MonotonicRegion],
    contours: &OffsetContours,
    lines: &[ScanLine],
) -> Result<()> {
    let starts: HashMap<(usize, usize), usize> = regions
        .iter()
        .enumerate()
        .map(|(idx, r)| ((r.left.vline, r.left.low), idx))
        .collect();
    let ends: HashMap<(usize, usize), usize> = regions
        .iter()
        .enumerate()
        .map(|(idx, r)| ((r.right.vline, r.right.low), idx))
        .collect();

    let mut links: Vec<(usize, usize)> = Vec::new();
    for (idx, region) in regions.iter().enumerate() {
        let left = region.left;
        if let Some(span) = overlap(lines, left.vline, (left.low, left.high), Side::Left) {
            for low in runs_in_span(&lines[left.vline - 1], span)? {
                let Some(&neighbor) = ends.get(&(left.vline - 1, low)) else {
                    return Err(Error::infill_failed(left.vline - 1, "run without a region"));
                };
                links.push((neighbor, idx));
            }
        }
        let right = region.right;
        if let Some(span) = overlap(lines, right.vline, (right.low, right.high), Side::Right) {
            for low in runs_in_span(&lines[right.vline + 1], span)? {
                let Some(&neighbor) = starts.get(&(right.vline + 1, low)) else {
                    return Err(Error::infill_failed(right.vline + 1, "run without a region"));
                };
                links.push((idx, neighbor));
            }
        }
    }
    // A run may see its neighbor while the neighbor does not see it back.
    for (l, r) in links {
        regions[l].right_neighbors.push(r);
        regions[r].left_neighbors.push(l);
    }
    for region in regions.iter_mut() {
        region.left_neighbors.sort_unstable();
        region.left_neighbors.dedup();
        region.right_neighbors.sort_unstable();
        region.right_neighbors.dedup();
    }

    for region in regions.iter_mut() {
        let len1 = monotonic_region_path_length(region, false, contours, lines);
        let len2 = monotonic_region_path_length(region, true, contours, lines);
        // Only the difference matters when choosing the orientation.
        if len1 > len2 {
            region.len1 = len1 - len2;
            region.len2 = 0.0;
        } else {
            region.len1 = 0.0;
            region.len2 = len2 - len1;
        }
    }
    Ok(())
}

/// Bottom points of the runs making up `span` on `line`.
fn runs_in_span(line: &ScanLine, (mut begin, end): (usize, usize)) -> Result<Vec<usize>> {
    let mut out = vec![begin];
    loop {
        let mut next = vertical_run_top(line, begin);
        if next == end {
            break;
        }
        while next < line.len() && line.intersections[next].kind != IntersectionType::InnerLow {
            next += 1;
        }
        if next >= end {
            return Err(Error::infill_failed(line.idx, "overlapping span is not made of runs"));
        }
        begin = next;
        out.push(begin);
    }
    Ok(out)
}

/// Length of the travel moves and half the length of the perimeter
/// connections of a region, mm, when entering at its low (`flipped` false)
/// or high left point.
pub fn monotonic_region_path_length(
    region: &MonotonicRegion,
    flipped: bool,
    contours: &OffsetContours,
    lines: &[ScanLine],
) -> CoordF {
    let mut i = region.left_intersection_point(flipped);
    let mut vline = region.left.vline;
    let mut total = 0.0;
    let mut travel_from: Option<Point> = None;

    loop {
        let line = &lines[vline];
        let items = &line.intersections;
        let mut it = i;
        let going_up = items[it].is_low();

        if let Some(last) = travel_from {
            let outer = if going_up { it - 1 } else { it + 1 };
            total += last.distance(&line.point(outer));
        }

        let mut iright = items[it].right_horizontal();
        if going_up {
            loop {
                loop {
                    it += 1;
                    iright = iright.max(items[it].right_horizontal());
                    if items[it].kind == IntersectionType::InnerHigh
                        && items[it + 1].kind == IntersectionType::OuterHigh
                    {
                        break;
                    }
                }
                match items[it].valid_vertical_up() {
                    Some(up) => it = up,
                    None => break,
                }
            }
        } else {
            loop {
                loop {
                    it -= 1;
                    if let Some(r) = items[it].right_horizontal() {
                        iright = Some(r);
                    }
                    if items[it].kind == IntersectionType::InnerLow
                        && items[it - 1].kind == IntersectionType::OuterLow
                    {
                        break;
                    }
                }
                match items[it].valid_vertical_down() {
                    Some(down) => it = down,
                    None => break,
                }
            }
        }

        if vline == region.right.vline {
            break;
        }
        let Some(iright) = iright else {
            break;
        };
        let line_right = &lines[vline + 1];
        let right = if going_up {
            vertical_run_top(line_right, iright)
        } else {
            vertical_run_bottom(line_right, iright)
        };
        if items[it].right_horizontal() == Some(right) && items[it].next.quality == LinkQuality::Valid {
            // Perimeter connections are extruded, count them at half weight.
            total += 0.5 * measure_perimeter_horizontal_segment_length(contours, lines, vline, it, right);
            travel_from = None;
        } else {
            let outer = if going_up { it + 1 } else { it - 1 };
            travel_from = Some(line.point(outer));
        }
        i = right;
        vline += 1;
    }
    total / SCALING_FACTOR
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Polygon};
    use crate::infill::connect::{connect_segment_intersections_by_contours, validate_link_symmetry, LinkParams};
    use crate::infill::scanline::{slice_region_by_vertical_lines, validate_intersection_parity};
    use crate::infill::scanline::tests::{contours_of, square_with_hole};
    use crate::scale;

    pub(crate) fn rectangle(w: f64, h: f64) -> ExPolygon {
        ExPolygon::new(Polygon::rectangle(Point::new(0, 0), Point::new(scale(w), scale(h))))
    }

    /// Two 10 x 4.5 mm blocks joined by a neck too thin for the inner contour.
    pub(crate) fn pinched_region() -> ExPolygon {
        let pts = [
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 4.5),
            (5.4, 4.5),
            (5.4, 5.5),
            (10.0, 5.5),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 5.5),
            (4.6, 5.5),
            (4.6, 4.5),
            (0.0, 4.5),
        ];
        ExPolygon::new(Polygon::from_points(
            pts.iter().map(|&(x, y)| Point::new(scale(x), scale(y))).collect(),
        ))
    }

    /// Two 10 x 10 mm blocks joined by a horizontal neck the inner contour
    /// does not pass through.
    pub(crate) fn dumbbell() -> ExPolygon {
        let pts = [
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 4.8),
            (14.0, 4.8),
            (14.0, 0.0),
            (24.0, 0.0),
            (24.0, 10.0),
            (14.0, 10.0),
            (14.0, 5.2),
            (10.0, 5.2),
            (10.0, 10.0),
            (0.0, 10.0),
        ];
        ExPolygon::new(Polygon::from_points(
            pts.iter().map(|&(x, y)| Point::new(scale(x), scale(y))).collect(),
        ))
    }

    pub(crate) fn prepared(contours: &OffsetContours, n: usize) -> Vec<ScanLine> {
        let mut lines = slice_region_by_vertical_lines(contours, n, scale(1.0), scale(1.0)).unwrap();
        connect_segment_intersections_by_contours(contours, &mut lines, &LinkParams::default()).unwrap();
        lines
    }

    fn assert_adjacency_symmetric(regions: &[MonotonicRegion]) {
        for (idx, region) in regions.iter().enumerate() {
            for &n in &region.right_neighbors {
                assert!(regions[n].left_neighbors.contains(&idx));
                assert_eq!(regions[n].left.vline, region.right.vline + 1);
            }
            for &n in &region.left_neighbors {
                assert!(regions[n].right_neighbors.contains(&idx));
            }
        }
    }

    #[test]
    fn test_single_region_in_thin_rectangle() {
        for (width, n_lines, flips) in [(20.0, 19, true), (21.0, 20, false)] {
            let contours = contours_of(&rectangle(width, 2.0));
            let mut lines = prepared(&contours, n_lines);
            let regions = generate_monotonic_regions(&mut lines);
            assert_eq!(regions.len(), 1);
            let region = &regions[0];
            assert_eq!(region.left.vline, 0);
            assert_eq!(region.right.vline, n_lines - 1);
            assert_eq!(region.num_lines(), n_lines);
            assert_eq!(region.flips, flips);
            assert_eq!((region.left.low, region.left.high), (1, 2));
        }
    }

    #[test]
    fn test_region_entry_and_exit_points() {
        let contours = contours_of(&rectangle(20.0, 2.0));
        let mut lines = prepared(&contours, 19);
        let regions = generate_monotonic_regions(&mut lines);
        let region = &regions[0];
        // Odd number of lines: entering low leaves high.
        assert_eq!(region.left_intersection_point(false), region.left.low);
        assert_eq!(region.right_intersection_point(false), region.right.high);
        assert_eq!(region.left_intersection_point(true), region.left.high);
        assert_eq!(region.right_intersection_point(true), region.right.low);
    }

    #[test]
    fn test_region_lengths_are_normalized() {
        let contours = contours_of(&rectangle(20.0, 2.0));
        let mut lines = prepared(&contours, 19);
        let mut regions = generate_monotonic_regions(&mut lines);
        connect_monotonic_regions(&mut regions, &contours, &lines).unwrap();
        let region = &regions[0];
        assert!(region.len1 >= 0.0 && region.len2 >= 0.0);
        assert!(region.len1 == 0.0 || region.len2 == 0.0);
        // Both orientations walk the same connections in a rectangle.
        let a = monotonic_region_path_length(region, false, &contours, &lines);
        let b = monotonic_region_path_length(region, true, &contours, &lines);
        assert!((a - 9.0).abs() < 1e-3, "{a}");
        assert!((b - 9.0).abs() < 1e-3, "{b}");
    }

    #[test]
    fn test_regions_around_hole() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let mut lines = prepared(&contours, 9);
        let mut regions = generate_monotonic_regions(&mut lines);
        connect_monotonic_regions(&mut regions, &contours, &lines).unwrap();
        assert!(regions.len() >= 3);
        assert_adjacency_symmetric(&regions);
        // Every region but those touching the first line has a left neighbor.
        for region in &regions {
            if region.left.vline > 0 {
                assert!(!region.left_neighbors.is_empty());
            }
        }
        // Every run of every line belongs to exactly one region.
        let covered: usize = regions.iter().map(|r| r.num_lines()).sum();
        let runs: usize = lines
            .iter()
            .map(|l| {
                l.intersections
                    .iter()
                    .filter(|it| it.kind == IntersectionType::OuterLow)
                    .count()
            })
            .sum();
        assert!(covered <= runs);
    }

    #[test]
    fn test_pinch_inserts_phony_pair() {
        let contours = contours_of(&pinched_region());
        assert_eq!(contours.n_contours_inner(), 2);
        let mut lines = prepared(&contours, 9);
        // x = 5 mm runs through the neck.
        assert_eq!(lines[4].len(), 6);
        let moved = lines[4].point(3);
        assert_eq!(lines[3].intersections[5].right_horizontal(), Some(3));

        pinch_contours_insert_phony_outer_intersections(&mut lines);
        let line = &lines[4];
        assert_eq!(line.len(), 8);
        assert_eq!(line.intersections[3].kind, IntersectionType::OuterHigh);
        assert_eq!(line.intersections[4].kind, IntersectionType::OuterLow);
        assert!(line.intersections[3].is_phony() && line.intersections[4].is_phony());
        assert_eq!(line.point(5), moved);
        assert!((line.intersections[3].y() - scale(5.0)).abs() <= 2);
        // Links from both neighbors follow the shifted point.
        assert_eq!(lines[3].intersections[5].right_horizontal(), Some(5));
        assert_eq!(lines[5].intersections[5].left_horizontal(), Some(5));

        let mut regions = generate_monotonic_regions(&mut lines);
        assert_eq!(regions.len(), 2);
        for region in &regions {
            assert_eq!((region.left.vline, region.right.vline), (0, 8));
        }
        connect_monotonic_regions(&mut regions, &contours, &lines).unwrap();
        assert!(regions.iter().all(|r| r.left_neighbors.is_empty() && r.right_neighbors.is_empty()));
    }

    #[test]
    fn test_pinch_repair_keeps_links_mirrored() {
        let cases = [
            (pinched_region(), 9, true),
            (dumbbell(), 23, false),
            (square_with_hole(10.0, 4.0, 6.0), 9, false),
        ];
        for (region, n_lines, pinched) in cases {
            let contours = contours_of(&region);
            let mut lines = prepared(&contours, n_lines);
            let before: usize = lines.iter().map(ScanLine::len).sum();
            pinch_contours_insert_phony_outer_intersections(&mut lines);
            assert!(validate_intersection_parity(&lines).is_ok());
            assert!(validate_link_symmetry(&lines).is_ok());

            // Every link still lands on a point of its own contour.
            let inserted = lines.iter().map(ScanLine::len).sum::<usize>() - before;
            let phony = lines.iter().flat_map(|l| &l.intersections).filter(|it| it.is_phony()).count();
            assert_eq!(inserted, phony);
            assert_eq!(phony > 0, pinched);
            for (vline, line) in lines.iter().enumerate() {
                for it in &line.intersections {
                    if let Some(j) = it.right_horizontal() {
                        assert_eq!(lines[vline + 1].intersections[j].contour, it.contour);
                    }
                    if let Some(j) = it.vertical_up().or(it.vertical_down()) {
                        assert!(!line.intersections[j].is_phony());
                    }
                }
            }
        }
    }

    #[test]
    fn test_vertical_run_helpers() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let lines = prepared(&contours, 9);
        // x = 4 mm: the hole contour turns back to this line on the left of
        // the hole, joining both inner runs into one.
        let line = &lines[3];
        assert_eq!(line.len(), 8);
        assert_eq!(end_of_vertical_run_raw(line, 1), 2);
        assert_eq!(end_of_vertical_run(line, 1), 6);
        assert_eq!(vertical_run_top(line, 1), 6);
        assert_eq!(vertical_run_bottom(line, 6), 1);
        // x = 5 mm: two separate runs.
        let line = &lines[4];
        assert_eq!(end_of_vertical_run(line, 1), 2);
        assert_eq!(vertical_run_top(line, 5), 6);
        assert_eq!(vertical_run_bottom(line, 2), 1);
    }
}
