//! Polyline emission for a chained sequence of monotonic regions.

use super::chain::MonotonicRegionLink;
use super::connect::{emit_perimeter_prev_next_segment, emit_perimeter_segment_on_vertical_line};
use super::contours::OffsetContours;
use super::monotonic::{vertical_run_bottom, vertical_run_top, MonotonicRegion};
use super::scanline::{IntersectionType, LinkQuality, ScanLine};
use crate::geometry::{Polyline, Polylines};
use crate::SCALED_EPSILON;

/// Close `polyline` and append it to `out`. Degenerate polylines are
/// dropped. A polyline starting where the previous one ended is appended to
/// it, joining extrusions split by phony outer points.
pub fn finish_polyline(mut polyline: Polyline, out: &mut Polylines) {
    polyline.remove_duplicate_points();
    if polyline.is_degenerate(SCALED_EPSILON) {
        return;
    }
    if let Some(prev) = out.last_mut() {
        if let (Some(&back), Some(&front)) = (prev.last(), polyline.first()) {
            if back.coincides_with(&front, SCALED_EPSILON) {
                prev.set_last(back.midpoint(&front));
                prev.points_mut().extend_from_slice(&polyline.points()[1..]);
                return;
            }
        }
    }
    out.push(polyline);
}

/// Replace the last point of `polyline` by the outer point next to inner
/// point `i`, extending the infill line to the outer contour.
fn extend_to_outer(polyline: &mut Polyline, line: &ScanLine, i: usize) {
    let outer = if line.intersections[i].is_low() { i - 1 } else { i + 1 };
    polyline.set_last(line.point(outer));
}

/// Emit the zig-zags of the regions of `path` in order. Consecutive regions
/// joined by a valid perimeter link continue the same polyline.
pub fn polylines_from_paths(
    path: &[MonotonicRegionLink],
    regions: &[MonotonicRegion],
    contours: &OffsetContours,
    lines: &[ScanLine],
) -> Polylines {
    let mut out = Polylines::new();
    let mut current: Option<Polyline> = None;

    for (pos, link) in path.iter().enumerate() {
        let region = &regions[link.region];
        let mut i = region.left_intersection_point(link.flipped);
        let mut vline = region.left.vline;

        if pos > 0 {
            if let Some(mut polyline) = current.take() {
                let prev = path[pos - 1];
                let region_prev = &regions[prev.region];
                let vline_prev = region_prev.right.vline;
                let i_prev = region_prev.right_intersection_point(prev.flipped);
                let ip_prev = &lines[vline_prev].intersections[i_prev];
                match ip_prev.contour {
                    Some(contour)
                        if vline_prev + 1 == vline
                            && ip_prev.right_horizontal() == Some(i)
                            && ip_prev.next.quality == LinkQuality::Valid =>
                    {
                        emit_perimeter_prev_next_segment(
                            contours, lines, vline_prev, contour, i_prev, i, &mut polyline, true,
                        );
                        current = Some(polyline);
                    }
                    _ => {
                        extend_to_outer(&mut polyline, &lines[vline_prev], i_prev);
                        finish_polyline(polyline, &mut out);
                    }
                }
            }
        }

        loop {
            let line = &lines[vline];
            let items = &line.intersections;
            let mut it = i;
            let going_up = items[it].is_low();
            let mut polyline = match current.take() {
                Some(mut polyline) => {
                    polyline.push(line.point(it));
                    polyline
                }
                // Start at the outer contour.
                None => Polyline::starting_at(line.point(if going_up { it - 1 } else { it + 1 })),
            };

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
                    polyline.push(line.point(it));
                    let (Some(next), LinkQuality::Valid, Some(contour)) =
                        (items[it].vertical_up(), items[it].vertical_up_quality(), items[it].contour)
                    else {
                        break;
                    };
                    let forward = items[it].has_left_vertical_up();
                    emit_perimeter_segment_on_vertical_line(contours, lines, vline, contour, it, next, &mut polyline, forward);
                    it = next;
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
                    polyline.push(line.point(it));
                    let (Some(next), LinkQuality::Valid, Some(contour)) =
                        (items[it].vertical_down(), items[it].vertical_down_quality(), items[it].contour)
                    else {
                        break;
                    };
                    let forward = items[it].has_right_vertical_down();
                    emit_perimeter_segment_on_vertical_line(contours, lines, vline, contour, it, next, &mut polyline, forward);
                    it = next;
                }
            }

            if vline == region.right.vline {
                current = Some(polyline);
                break;
            }
            let Some(iright) = iright else {
                extend_to_outer(&mut polyline, line, it);
                finish_polyline(polyline, &mut out);
                break;
            };

            // End of the overlapping run on the next line.
            let line_right = &lines[vline + 1];
            let right = if going_up {
                vertical_run_top(line_right, iright)
            } else {
                vertical_run_bottom(line_right, iright)
            };

            match items[it].contour {
                Some(contour)
                    if items[it].right_horizontal() == Some(right) && items[it].next.quality == LinkQuality::Valid =>
                {
                    emit_perimeter_prev_next_segment(contours, lines, vline, contour, it, right, &mut polyline, true);
                    current = Some(polyline);
                }
                _ => {
                    extend_to_outer(&mut polyline, line, it);
                    finish_polyline(polyline, &mut out);
                }
            }
            i = right;
            vline += 1;
        }
    }

    if let (Some(mut polyline), Some(last)) = (current, path.last()) {
        let region = &regions[last.region];
        let line = &lines[region.right.vline];
        extend_to_outer(&mut polyline, line, region.right_intersection_point(last.flipped));
        finish_polyline(polyline, &mut out);
    }
    out
}
