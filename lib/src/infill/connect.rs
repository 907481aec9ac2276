//! Contour connectivity graph.
//!
//! Each intersection gets a `prev` and a `next` link to the nearest
//! intersection of the same contour when walking the contour backward or
//! forward. The target is either on the neighboring scan line (horizontal
//! link) or on the same line (vertical link). Low points walk the contour
//! forward, high points backward, so both ends of a link agree on it.

use super::contours::{
    distance_of_segments, polygon_segment_append, polygon_segment_append_reversed,
    segment_length, OffsetContours,
};
use super::scanline::{Intersection, Link, LinkQuality, LinkType, ScanLine, Side};
use crate::config::TooLongLinkPolicy;
use crate::geometry::{Point, Polyline};
use crate::{CoordF, Error, Result};

/// Limits applied to contour links when building the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkParams {
    /// Mark every followable link as too long.
    pub dont_connect: bool,
    /// Maximum length of a followed perimeter segment, scaled. Zero disables
    /// the limit.
    pub link_max_length: CoordF,
    pub policy: TooLongLinkPolicy,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            dont_connect: false,
            link_max_length: 0.0,
            policy: TooLongLinkPolicy::Distinct,
        }
    }
}

/// Nearest link candidate found so far.
#[derive(Clone, Copy)]
struct Candidate {
    idx: usize,
    distance: usize,
    same_line: bool,
}

impl Candidate {
    fn offer(best: &mut Option<Candidate>, idx: usize, distance: usize, same_line: bool) {
        if best.map_or(true, |b| distance < b.distance) {
            *best = Some(Candidate {
                idx,
                distance,
                same_line,
            });
        }
    }
}

/// Fill in the `prev` and `next` links of every intersection.
///
/// Fails if an intersection has no counterpart along its contour, or if the
/// resulting links are not symmetric.
pub fn connect_segment_intersections_by_contours(
    contours: &OffsetContours,
    lines: &mut [ScanLine],
    params: &LinkParams,
) -> Result<()> {
    for vline in 0..lines.len() {
        let links = find_links(contours, lines, vline, params)?;
        let line = &mut lines[vline];
        for (it, (prev, next)) in line.intersections.iter_mut().zip(links) {
            it.prev = prev;
            it.next = next;
        }

        // Make invalid vertical links symmetric.
        for i in 0..line.intersections.len() {
            let it = &line.intersections[i];
            if it.prev.is_vertical() && it.prev.quality == LinkQuality::Invalid {
                if let Some(t) = it.prev.target {
                    line.intersections[t].prev.quality = LinkQuality::Invalid;
                }
            }
            let it = &line.intersections[i];
            if it.next.is_vertical() && it.next.quality == LinkQuality::Invalid {
                if let Some(t) = it.next.target {
                    line.intersections[t].next.quality = LinkQuality::Invalid;
                }
            }
        }
    }
    validate_link_symmetry(lines)
}

fn find_links(
    contours: &OffsetContours,
    lines: &[ScanLine],
    vline: usize,
    params: &LinkParams,
) -> Result<Vec<(Link, Link)>> {
    let line = &lines[vline];
    let line_prev = vline.checked_sub(1).map(|v| &lines[v]);
    let line_next = lines.get(vline + 1);
    let mut out = Vec::with_capacity(line.len());

    for (i, it) in line.intersections.iter().enumerate() {
        let Some(i_contour) = it.contour else {
            out.push((it.prev, it.next));
            continue;
        };
        let poly = contours.contour(i_contour);
        let forward = it.is_low();
        let same_kind = |other: &Intersection| {
            other.contour == it.contour && other.kind == it.kind
        };

        let mut prev: Option<Candidate> = None;
        let mut next: Option<Candidate> = None;
        if let Some(lp) = line_prev {
            for (j, it2) in lp.intersections.iter().enumerate().filter(|(_, it2)| same_kind(it2)) {
                let d = distance_of_segments(poly, it2.segment, it.segment, forward);
                Candidate::offer(&mut prev, j, d, false);
            }
        }
        if let Some(ln) = line_next {
            for (j, it2) in ln.intersections.iter().enumerate().filter(|(_, it2)| same_kind(it2)) {
                let d = distance_of_segments(poly, it.segment, it2.segment, forward);
                Candidate::offer(&mut next, j, d, false);
            }
        }
        // Same line, opposite orientation: the contour comes back to this x.
        for (j, it2) in line.intersections.iter().enumerate() {
            if j == i || it2.contour != it.contour || it2.kind == it.kind {
                continue;
            }
            let d = distance_of_segments(poly, it2.segment, it.segment, forward);
            Candidate::offer(&mut prev, j, d, true);
            let d = distance_of_segments(poly, it.segment, it2.segment, forward);
            Candidate::offer(&mut next, j, d, true);
        }

        let (Some(prev), Some(next)) = (prev, next) else {
            return Err(Error::infill_failed(vline, "intersection without contour neighbor"));
        };

        let make_link = |c: Candidate| {
            let kind = match (c.same_line, c.idx < i) {
                (false, _) => LinkType::Horizontal,
                (true, true) => LinkType::Down,
                (true, false) => LinkType::Up,
            };
            let mut quality = LinkQuality::Valid;
            // A vertical link may only skip outer points.
            if c.same_line {
                let (lo, hi) = if c.idx < i { (c.idx, i) } else { (i, c.idx) };
                if line.intersections[lo + 1..hi].iter().any(|p| p.is_inner()) {
                    quality = LinkQuality::Invalid;
                }
            }
            Link {
                target: Some(c.idx),
                kind,
                quality,
            }
        };
        let mut link_prev = make_link(prev);
        let mut link_next = make_link(next);

        // Both neighbors on this line and on the same side: the contour
        // loops back without reaching another line.
        if prev.same_line && next.same_line && (prev.idx > i) == (next.idx > i) {
            link_prev.quality = LinkQuality::Invalid;
            link_next.quality = LinkQuality::Invalid;
        }

        if params.dont_connect {
            for link in [&mut link_prev, &mut link_next] {
                if link.quality == LinkQuality::Valid {
                    link.quality = LinkQuality::TooLong;
                }
            }
        } else if params.link_max_length > 0.0 {
            if link_prev.quality == LinkQuality::Valid {
                let len = if prev.same_line {
                    measure_perimeter_segment_on_vertical_line_length(contours, lines, vline, prev.idx, i, forward)
                } else {
                    measure_perimeter_horizontal_segment_length(contours, lines, vline - 1, prev.idx, i)
                };
                if len > params.link_max_length {
                    link_prev.quality = LinkQuality::TooLong;
                }
            }
            if link_next.quality == LinkQuality::Valid {
                let len = if next.same_line {
                    measure_perimeter_segment_on_vertical_line_length(contours, lines, vline, i, next.idx, forward)
                } else {
                    measure_perimeter_horizontal_segment_length(contours, lines, vline, i, next.idx)
                };
                if len > params.link_max_length {
                    link_next.quality = LinkQuality::TooLong;
                }
            }
        }

        if params.policy == TooLongLinkPolicy::Invalidate {
            for link in [&mut link_prev, &mut link_next] {
                if link.quality == LinkQuality::TooLong {
                    link.quality = LinkQuality::Invalid;
                }
            }
        }
        out.push((link_prev, link_next));
    }
    Ok(out)
}

/// Check that horizontal links pair up across neighboring lines and that
/// vertical links pair up, with equal quality, along each line.
pub fn validate_link_symmetry(lines: &[ScanLine]) -> Result<()> {
    for (vline, pair) in lines.windows(2).enumerate() {
        let (left, right) = (&pair[0], &pair[1]);
        for (i, it) in left.intersections.iter().enumerate() {
            if let Some(j) = it.right_horizontal() {
                let ok = right.intersections.get(j).is_some_and(|other| {
                    other.contour == it.contour
                        && other.kind == it.kind
                        && other.left_horizontal() == Some(i)
                        && other.prev.quality == it.next.quality
                });
                if !ok {
                    return Err(Error::infill_failed(vline, "right link is not mirrored"));
                }
            }
        }
        for (i, it) in right.intersections.iter().enumerate() {
            if let Some(j) = it.left_horizontal() {
                let ok = left.intersections.get(j).is_some_and(|other| {
                    other.contour == it.contour
                        && other.kind == it.kind
                        && other.right_horizontal() == Some(i)
                });
                if !ok {
                    return Err(Error::infill_failed(vline + 1, "left link is not mirrored"));
                }
            }
        }
    }

    for line in lines {
        for (i, it) in line.intersections.iter().enumerate() {
            for side in [Side::Left, Side::Right] {
                let link = it.link(side);
                let Some(t) = it.vertical(side) else {
                    continue;
                };
                let mirrored = line.intersections.get(t).is_some_and(|other| {
                    let back = other.link(side);
                    back.target == Some(i)
                        && back.is_vertical()
                        && back.kind != link.kind
                        && back.quality == link.quality
                });
                if !mirrored {
                    return Err(Error::infill_failed(line.idx, "vertical link is not mirrored"));
                }
            }
        }
    }
    Ok(())
}

/// Whether the horizontal link of intersection `i` on `side` may be followed
/// to an unconsumed vertical run on the neighboring line.
pub fn intersection_on_prev_next_vertical_line_valid(
    lines: &[ScanLine],
    vline: usize,
    i: usize,
    side: Side,
) -> bool {
    let it = &lines[vline].intersections[i];
    if it.has_vertical(side) {
        // Preceded by a vertical link along this line.
        return false;
    }
    let Some(other) = it.horizontal(side) else {
        return false;
    };
    let other_vline = match side {
        Side::Left => match vline.checked_sub(1) {
            Some(v) => v,
            None => return false,
        },
        Side::Right => vline + 1,
    };
    let Some(line_other) = lines.get(other_vline) else {
        return false;
    };
    let Some(it_other) = line_other.intersections.get(other) else {
        return false;
    };
    // Only links landing at the end of a vertical run are followed.
    let outside = if it_other.is_low() {
        other.checked_sub(1)
    } else {
        Some(other + 1)
    };
    match outside.and_then(|k| line_other.intersections.get(k)) {
        Some(p) if !p.is_inner() => {}
        _ => return false,
    }
    if it.link(side).quality != LinkQuality::Valid {
        return false;
    }
    let perimeter_consumed = match side {
        Side::Right => it.consumed_perimeter_right,
        Side::Left => it_other.consumed_perimeter_right,
    };
    if perimeter_consumed {
        return false;
    }
    let vertical_consumed = if it_other.is_low() {
        it_other.consumed_vertical_up
    } else {
        other
            .checked_sub(1)
            .and_then(|k| line_other.intersections.get(k))
            .map_or(true, |p| p.consumed_vertical_up)
    };
    !vertical_consumed
}

#[inline]
pub fn intersection_on_prev_vertical_line_valid(lines: &[ScanLine], vline: usize, i: usize) -> bool {
    intersection_on_prev_next_vertical_line_valid(lines, vline, i, Side::Left)
}

#[inline]
pub fn intersection_on_next_vertical_line_valid(lines: &[ScanLine], vline: usize, i: usize) -> bool {
    intersection_on_prev_next_vertical_line_valid(lines, vline, i, Side::Right)
}

/// Length of the perimeter between `i` on line `vline` and `i2` on line
/// `vline + 1`.
pub fn measure_perimeter_horizontal_segment_length(
    contours: &OffsetContours,
    lines: &[ScanLine],
    vline: usize,
    i: usize,
    i2: usize,
) -> CoordF {
    let (line, line2) = (&lines[vline], &lines[vline + 1]);
    let (it, it2) = (&line.intersections[i], &line2.intersections[i2]);
    let Some(poly) = it.contour.map(|c| contours.contour(c)) else {
        return 0.0;
    };
    let p1 = line.point(i);
    let p2 = line2.point(i2);
    if it.is_low() {
        segment_length(poly, it.segment, p1, it2.segment, p2)
    } else {
        segment_length(poly, it2.segment, p2, it.segment, p1)
    }
}

/// Append the perimeter from `i` on line `vline` to `i2` on the next (or
/// previous) line. The start point is not appended, the end point is.
#[allow(clippy::too_many_arguments)]
pub fn emit_perimeter_prev_next_segment(
    contours: &OffsetContours,
    lines: &[ScanLine],
    vline: usize,
    i_contour: usize,
    i: usize,
    i2: usize,
    out: &mut Polyline,
    dir_is_next: bool,
) {
    let vline_other = if dir_is_next { vline + 1 } else { vline - 1 };
    let it = &lines[vline].intersections[i];
    let line2 = &lines[vline_other];
    let it2 = &line2.intersections[i2];
    let poly = contours.contour(i_contour);
    if it.is_low() == dir_is_next {
        polygon_segment_append(out.points_mut(), poly, it.segment, it2.segment);
    } else {
        polygon_segment_append_reversed(out.points_mut(), poly, it.segment, it2.segment);
    }
    out.push(line2.point(i2));
}

/// Length of the perimeter between two intersections of the same line.
pub fn measure_perimeter_segment_on_vertical_line_length(
    contours: &OffsetContours,
    lines: &[ScanLine],
    vline: usize,
    i: usize,
    i2: usize,
    forward: bool,
) -> CoordF {
    let line = &lines[vline];
    let (it, it2) = (&line.intersections[i], &line.intersections[i2]);
    let Some(poly) = it.contour.map(|c| contours.contour(c)) else {
        return 0.0;
    };
    let p1 = line.point(i);
    let p2 = line.point(i2);
    if forward {
        segment_length(poly, it.segment, p1, it2.segment, p2)
    } else {
        segment_length(poly, it2.segment, p2, it.segment, p1)
    }
}

/// Append the perimeter between two intersections of the same line. The
/// start point is not appended, the end point is.
#[allow(clippy::too_many_arguments)]
pub fn emit_perimeter_segment_on_vertical_line(
    contours: &OffsetContours,
    lines: &[ScanLine],
    vline: usize,
    i_contour: usize,
    i: usize,
    i2: usize,
    out: &mut Polyline,
    forward: bool,
) {
    let line = &lines[vline];
    let (it, it2) = (&line.intersections[i], &line.intersections[i2]);
    let poly = contours.contour(i_contour);
    if forward {
        polygon_segment_append(out.points_mut(), poly, it.segment, it2.segment);
    } else {
        polygon_segment_append_reversed(out.points_mut(), poly, it.segment, it2.segment);
    }
    out.push(Point::new(line.pos, it2.y()));
}
