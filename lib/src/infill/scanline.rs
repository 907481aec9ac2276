//! Scan lines and their intersections with the offset contours.
//!
//! Every scan line is a vertical line at `x0 + idx * line_spacing`. Its
//! intersections with the outer and inner contours are kept sorted by their
//! exact rational y position. A well formed line looks like
//!
//! ```text
//! OuterLow (InnerLow InnerHigh)* OuterHigh  OuterLow ... OuterHigh
//! ```
//!
//! Links between intersections are plain indices: the line index plus the
//! offset within the line. Points are never moved once linked, only the
//! pinch repair inserts new ones and remaps the affected indices.

use super::contours::OffsetContours;
use super::rational::RationalY;
use crate::geometry::Point;
use crate::{Coord, Error, Result};

/// Which contour set an intersection belongs to, and whether the contour
/// enters (low) or leaves (high) the region at that point when walking up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntersectionType {
    OuterLow,
    OuterHigh,
    InnerLow,
    InnerHigh,
}

/// Where a contour link points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// To the neighboring scan line (left for `prev`, right for `next`).
    Horizontal,
    /// Up along the same scan line.
    Up,
    /// Down along the same scan line.
    Down,
    /// Inserted point without contour, no link.
    Phony,
}

/// Whether a contour link may be followed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkQuality {
    Invalid,
    Valid,
    /// Valid, but too long to be followed. Still measured.
    TooLong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A directed link along a contour to another intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub target: Option<usize>,
    pub kind: LinkType,
    pub quality: LinkQuality,
}

impl Link {
    const UNSET: Link = Link {
        target: None,
        kind: LinkType::Horizontal,
        quality: LinkQuality::Valid,
    };

    const PHONY: Link = Link {
        target: None,
        kind: LinkType::Phony,
        quality: LinkQuality::Invalid,
    };

    #[inline]
    fn target_if(&self, kind: LinkType) -> Option<usize> {
        if self.kind == kind {
            self.target
        } else {
            None
        }
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        matches!(self.kind, LinkType::Up | LinkType::Down)
    }
}

/// Intersection of a scan line with a contour segment.
#[derive(Clone, Debug)]
pub struct Intersection {
    /// Contour index in [`OffsetContours`], `None` for inserted phony points.
    pub contour: Option<usize>,
    /// Segment of the contour, see the segment convention in `contours`.
    pub segment: usize,
    pub pos: RationalY,
    pub kind: IntersectionType,
    /// Link walking the contour backward, to the left scan line or vertically.
    pub prev: Link,
    /// Link walking the contour forward, to the right scan line or vertically.
    pub next: Link,
    /// The vertical segment above this point was emitted.
    pub consumed_vertical_up: bool,
    /// The perimeter segment right of this point was emitted.
    pub consumed_perimeter_right: bool,
}

impl Intersection {
    fn new(contour: usize, segment: usize, pos: RationalY) -> Self {
        Self {
            contour: Some(contour),
            segment,
            pos,
            kind: IntersectionType::OuterLow,
            prev: Link::UNSET,
            next: Link::UNSET,
            consumed_vertical_up: false,
            consumed_perimeter_right: false,
        }
    }

    /// An outer point carrying no contour, used to split pinched runs.
    pub fn phony(kind: IntersectionType, y: Coord) -> Self {
        Self {
            contour: None,
            segment: usize::MAX,
            pos: RationalY::from_int(y),
            kind,
            prev: Link::PHONY,
            next: Link::PHONY,
            consumed_vertical_up: false,
            consumed_perimeter_right: false,
        }
    }

    /// Rounded y coordinate.
    #[inline]
    pub fn y(&self) -> Coord {
        self.pos.round()
    }

    #[inline]
    pub fn is_inner(&self) -> bool {
        matches!(self.kind, IntersectionType::InnerLow | IntersectionType::InnerHigh)
    }

    #[inline]
    pub fn is_outer(&self) -> bool {
        matches!(self.kind, IntersectionType::OuterLow | IntersectionType::OuterHigh)
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        matches!(self.kind, IntersectionType::InnerLow | IntersectionType::OuterLow)
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        !self.is_low()
    }

    #[inline]
    pub fn is_phony(&self) -> bool {
        self.contour.is_none()
    }

    #[inline]
    pub fn link(&self, side: Side) -> &Link {
        match side {
            Side::Left => &self.prev,
            Side::Right => &self.next,
        }
    }

    #[inline]
    pub fn link_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.prev,
            Side::Right => &mut self.next,
        }
    }

    #[inline]
    pub fn left_horizontal(&self) -> Option<usize> {
        self.prev.target_if(LinkType::Horizontal)
    }

    #[inline]
    pub fn right_horizontal(&self) -> Option<usize> {
        self.next.target_if(LinkType::Horizontal)
    }

    #[inline]
    pub fn horizontal(&self, side: Side) -> Option<usize> {
        self.link(side).target_if(LinkType::Horizontal)
    }

    #[inline]
    pub fn has_horizontal(&self, side: Side) -> bool {
        self.link(side).kind == LinkType::Horizontal
    }

    #[inline]
    pub fn has_vertical(&self, side: Side) -> bool {
        self.link(side).is_vertical()
    }

    #[inline]
    pub fn has_left_vertical_up(&self) -> bool {
        self.prev.kind == LinkType::Up
    }

    #[inline]
    pub fn has_right_vertical_down(&self) -> bool {
        self.next.kind == LinkType::Down
    }

    /// Same-line target of the link on `side`, up or down.
    #[inline]
    pub fn vertical(&self, side: Side) -> Option<usize> {
        let link = self.link(side);
        if link.is_vertical() {
            link.target
        } else {
            None
        }
    }

    /// The link going up along this line, the left one taking precedence.
    fn up_link(&self) -> &Link {
        if self.has_left_vertical_up() {
            &self.prev
        } else {
            &self.next
        }
    }

    fn down_link(&self) -> &Link {
        if self.prev.kind == LinkType::Down {
            &self.prev
        } else {
            &self.next
        }
    }

    #[inline]
    pub fn vertical_up(&self) -> Option<usize> {
        self.up_link().target_if(LinkType::Up)
    }

    #[inline]
    pub fn vertical_up_quality(&self) -> LinkQuality {
        self.up_link().quality
    }

    #[inline]
    pub fn vertical_down(&self) -> Option<usize> {
        self.down_link().target_if(LinkType::Down)
    }

    #[inline]
    pub fn vertical_down_quality(&self) -> LinkQuality {
        self.down_link().quality
    }

    /// Vertical link leaving the vertical run this point bounds.
    #[inline]
    pub fn vertical_outside(&self) -> Option<usize> {
        if self.is_low() {
            self.vertical_down()
        } else {
            self.vertical_up()
        }
    }

    #[inline]
    pub fn vertical_outside_quality(&self) -> LinkQuality {
        if self.is_low() {
            self.vertical_down_quality()
        } else {
            self.vertical_up_quality()
        }
    }

    /// Valid vertical link up, if any.
    #[inline]
    pub fn valid_vertical_up(&self) -> Option<usize> {
        self.vertical_up()
            .filter(|_| self.vertical_up_quality() == LinkQuality::Valid)
    }

    /// Valid vertical link down, if any.
    #[inline]
    pub fn valid_vertical_down(&self) -> Option<usize> {
        self.vertical_down()
            .filter(|_| self.vertical_down_quality() == LinkQuality::Valid)
    }
}

/// A vertical scan line with its sorted intersections.
#[derive(Clone, Debug)]
pub struct ScanLine {
    pub idx: usize,
    /// x position.
    pub pos: Coord,
    pub intersections: Vec<Intersection>,
}

impl ScanLine {
    /// Position of intersection `i` rounded to the grid.
    #[inline]
    pub fn point(&self, i: usize) -> Point {
        Point::new(self.pos, self.intersections[i].y())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }
}

/// Intersect `n_vlines` scan lines starting at `x0` with all contours.
///
/// Fails if the resulting intersection sequence of any line is malformed.
pub fn slice_region_by_vertical_lines(
    contours: &OffsetContours,
    n_vlines: usize,
    x0: Coord,
    line_spacing: Coord,
) -> Result<Vec<ScanLine>> {
    let mut lines: Vec<ScanLine> = (0..n_vlines)
        .map(|i| ScanLine {
            idx: i,
            pos: x0 + i as Coord * line_spacing,
            intersections: Vec::new(),
        })
        .collect();
    if n_vlines == 0 {
        return Ok(lines);
    }

    for i_contour in 0..contours.n_contours() {
        let contour = contours.contour(i_contour).points();
        let n = contour.len();
        if n < 2 {
            continue;
        }
        for i_segment in 0..n {
            let i_prev = if i_segment == 0 { n - 1 } else { i_segment - 1 };
            let p1 = contour[i_prev];
            let p2 = contour[i_segment];
            let (l, r) = if p1.x <= p2.x { (p1.x, p2.x) } else { (p2.x, p1.x) };

            // Range of scan lines crossing the segment, exact hits included.
            let mut il = (l - x0) / line_spacing;
            while il * line_spacing + x0 < l {
                il += 1;
            }
            let il = il.max(0);
            let mut ir = (r - x0 + line_spacing) / line_spacing;
            while ir * line_spacing + x0 > r {
                ir -= 1;
            }
            let ir = ir.min(n_vlines as Coord - 1);
            if il > ir {
                continue;
            }

            for i in il..=ir {
                let line = &mut lines[i as usize];
                let x = line.pos;
                let pos = if p1.x == x {
                    if p2.x == x {
                        // Vertical segments are skipped.
                        continue;
                    }
                    let p0 = contour[if i_prev == 0 { n - 1 } else { i_prev - 1 }];
                    if (p0.x - p1.x) as i128 * (p2.x - p1.x) as i128 > 0 {
                        // The contour only touches the line from one side.
                        continue;
                    }
                    RationalY::from_int(p1.y)
                } else if p2.x == x {
                    let p3 = contour[if i_segment + 1 == n { 0 } else { i_segment + 1 }];
                    if (p3.x - p2.x) as i128 * (p1.x - p2.x) as i128 > 0 {
                        continue;
                    }
                    RationalY::from_int(p2.y)
                } else {
                    crossing_position(p1, p2, x).ok_or_else(|| {
                        Error::infill_failed(i as usize, "intersection position out of range")
                    })?
                };
                line.intersections
                    .push(Intersection::new(i_contour, i_segment, pos));
            }
        }
    }

    for line in &mut lines {
        classify_and_dedup(contours, line);
    }
    validate_intersection_parity(&lines)?;
    Ok(lines)
}

/// y of the segment `p1 p2` at `x` as `p / q`, with `q` the horizontal extent
/// of the segment. `None` if the numbers do not fit.
fn crossing_position(p1: Point, p2: Point, x: Coord) -> Option<RationalY> {
    let (t, q) = if p2.x > p1.x {
        (x - p1.x, p2.x - p1.x)
    } else {
        (p1.x - x, p1.x - p2.x)
    };
    let q32 = u32::try_from(q).ok()?;
    let p = t
        .checked_mul(p2.y - p1.y)?
        .checked_add(p1.y.checked_mul(q)?)?;
    RationalY::new(p, q32)
}

/// Sort the intersections of a line, assign their types and remove
/// duplicates at contour vertices lying exactly on the line.
fn classify_and_dedup(contours: &OffsetContours, line: &mut ScanLine) {
    let items = &mut line.intersections;
    items.sort_by(|a, b| a.pos.cmp(&b.pos));

    let mut j = 0;
    for i in 0..items.len() {
        let i_contour = items[i].contour.unwrap_or_default();
        let contour = contours.contour(i_contour).points();
        let seg = items[i].segment;
        let prev = if seg == 0 { contour.len() - 1 } else { seg - 1 };
        let low = contour[seg].x - contour[prev].x > 0;
        items[i].kind = match (contours.is_contour_outer(i_contour), low) {
            (true, true) => IntersectionType::OuterLow,
            (true, false) => IntersectionType::OuterHigh,
            (false, true) => IntersectionType::InnerLow,
            (false, false) => IntersectionType::InnerHigh,
        };

        let mut take = true;
        if j > 0 {
            let (cur, last) = (&items[i], &items[j - 1]);
            if cur.contour == last.contour && cur.pos.is_integer() && last.pos.is_integer() {
                if cur.pos.numerator() == last.pos.numerator() {
                    // Two successive segments meeting on the line: keep one.
                    take = false;
                } else if cur.kind == last.kind {
                    // Z shape with its middle segment on the line. Keep the
                    // pair maximizing the vertical run.
                    if !low {
                        items[j - 1] = items[i].clone();
                    }
                    take = false;
                }
            }
        }
        if take {
            if j < i {
                items[j] = items[i].clone();
            }
            j += 1;
        }
    }
    items.truncate(j);
}

/// Check the structure of every line: an even number of points, each run
/// bracketed by outer-low and outer-high, opening on an inner-low or closing
/// on an inner-high when it holds inner points. The alternation of inner
/// points inside a run is not checked.
pub fn validate_intersection_parity(lines: &[ScanLine]) -> Result<()> {
    use IntersectionType::*;
    for line in lines {
        let v = &line.intersections;
        let fail = |reason: &str| Err(Error::infill_failed(line.idx, reason));
        if v.len() % 2 != 0 {
            return fail("odd number of intersections");
        }
        let mut i = 0;
        while i < v.len() {
            if v[i].kind != OuterLow {
                return fail("span does not start with an outer low point");
            }
            let mut j = i + 1;
            if j >= v.len() {
                return fail("span is not closed");
            }
            if !matches!(v[j].kind, InnerLow | OuterHigh) {
                return fail("outer low point followed by a high inner point");
            }
            while j < v.len() && v[j].is_inner() {
                j += 1;
            }
            if j >= v.len() || j % 2 != 1 || v[j].kind != OuterHigh {
                return fail("span does not end with an outer high point");
            }
            if i + 1 != j && v[j - 1].kind != InnerHigh {
                return fail("inner points are not paired");
            }
            i = j + 1;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Polygon};
    use crate::scale;
    use IntersectionType::*;

    pub(crate) fn square_region(size: f64) -> ExPolygon {
        ExPolygon::new(Polygon::rectangle(
            Point::new(0, 0),
            Point::new(scale(size), scale(size)),
        ))
    }

    pub(crate) fn square_with_hole(size: f64, hole_min: f64, hole_max: f64) -> ExPolygon {
        let hole = Polygon::rectangle(
            Point::new(scale(hole_min), scale(hole_min)),
            Point::new(scale(hole_max), scale(hole_max)),
        );
        let mut ex = ExPolygon::with_holes(
            Polygon::rectangle(Point::new(0, 0), Point::new(scale(size), scale(size))),
            vec![hole],
        );
        ex.normalize();
        ex
    }

    /// Contours for a 1 mm line spacing: outer offset 0.05 mm, inner 0.5 mm.
    pub(crate) fn contours_of(region: &ExPolygon) -> OffsetContours {
        OffsetContours::new(region, 0.0, -scale(0.05), -scale(0.5))
    }

    fn kinds(line: &ScanLine) -> Vec<IntersectionType> {
        line.intersections.iter().map(|it| it.kind).collect()
    }

    #[test]
    fn test_slice_square() {
        let contours = contours_of(&square_region(10.0));
        let lines = slice_region_by_vertical_lines(&contours, 10, scale(0.5), scale(1.0)).unwrap();
        assert_eq!(lines.len(), 10);
        // The outermost lines run along the vertical inner edges.
        for line in &lines[1..9] {
            assert_eq!(kinds(line), vec![OuterLow, InnerLow, InnerHigh, OuterHigh]);
            assert!(line.intersections.windows(2).all(|w| w[0].pos < w[1].pos));
        }
        let line = &lines[3];
        assert!(line.point(0).coincides_with(&Point::new(scale(3.5), scale(0.05)), 3));
        assert!(line.point(1).coincides_with(&Point::new(scale(3.5), scale(0.5)), 3));
        assert!(line.point(3).coincides_with(&Point::new(scale(3.5), scale(9.95)), 3));
    }

    #[test]
    fn test_slice_square_with_hole() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let lines = slice_region_by_vertical_lines(&contours, 9, scale(1.0), scale(1.0)).unwrap();
        for line in &lines {
            let x = line.pos;
            let through_hole = x > scale(3.5) && x < scale(6.5);
            if through_hole {
                assert_eq!(
                    kinds(line),
                    vec![OuterLow, InnerLow, InnerHigh, OuterHigh, OuterLow, InnerLow, InnerHigh, OuterHigh]
                );
            } else {
                assert_eq!(kinds(line), vec![OuterLow, InnerLow, InnerHigh, OuterHigh]);
            }
        }
        assert!(validate_intersection_parity(&lines).is_ok());
    }

    #[test]
    fn test_slice_exact_vertex_hits_are_merged() {
        // A diamond whose left and right vertices sit exactly on scan lines
        // and whose top and bottom vertices sit on the middle line.
        let diamond = ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, scale(-4.0)),
            Point::new(scale(4.0), 0),
            Point::new(0, scale(4.0)),
            Point::new(scale(-4.0), 0),
        ]));
        let contours = OffsetContours::new(&diamond, 0.0, 0, -scale(0.5));
        let lines =
            slice_region_by_vertical_lines(&contours, 9, scale(-4.0), scale(1.0)).unwrap();
        // Tangent vertices at the extreme lines produce nothing.
        assert!(lines[0].is_empty());
        assert!(lines[8].is_empty());
        // The top and bottom vertices are counted once.
        assert_eq!(lines[4].intersections.first().map(|it| it.kind), Some(OuterLow));
        assert_eq!(lines[4].point(0), Point::new(0, scale(-4.0)));
        assert_eq!(lines[4].intersections.last().map(|it| it.kind), Some(OuterHigh));
        for line in &lines {
            assert_eq!(line.len() % 2, 0);
        }
    }

    #[test]
    fn test_parity_validation_rejects_malformed_lines() {
        let point = |kind| {
            let mut it = Intersection::phony(kind, 0);
            it.contour = Some(0);
            it
        };
        let line = |kinds: &[IntersectionType]| ScanLine {
            idx: 3,
            pos: 0,
            intersections: kinds.iter().map(|k| point(*k)).collect(),
        };

        assert!(validate_intersection_parity(&[line(&[OuterLow, OuterHigh])]).is_ok());
        assert!(validate_intersection_parity(&[line(&[OuterLow, InnerLow, InnerHigh, OuterHigh])]).is_ok());

        let err = validate_intersection_parity(&[line(&[OuterLow, InnerLow, OuterHigh])]).unwrap_err();
        assert!(matches!(err, Error::InfillFailed { vline: 3, .. }));
        assert!(validate_intersection_parity(&[line(&[OuterHigh, OuterLow])]).is_err());
        assert!(validate_intersection_parity(&[line(&[OuterLow, InnerHigh, InnerLow, OuterHigh])]).is_err());
        assert!(validate_intersection_parity(&[line(&[OuterLow, InnerLow, InnerLow, OuterHigh])]).is_err());
        // Only the run ends are checked, not how the inner points alternate.
        let nested = [OuterLow, InnerLow, InnerLow, InnerHigh, InnerHigh, OuterHigh];
        assert!(validate_intersection_parity(&[line(&nested)]).is_ok());
    }

    #[test]
    fn test_crossing_position() {
        let pos = crossing_position(Point::new(0, 0), Point::new(3, 1), 1).unwrap();
        assert_eq!((pos.numerator(), pos.denominator()), (1, 3));
        let pos = crossing_position(Point::new(3, 1), Point::new(0, 0), 1).unwrap();
        assert_eq!(pos, RationalY::new(1, 3).unwrap());
        // Horizontal extent beyond 32 bits.
        assert!(crossing_position(Point::new(0, 0), Point::new(1 << 40, 5), 7).is_none());
    }
}
