//! Ordering of monotonic regions.
//!
//! Regions have to be printed left to right: a region may only be printed
//! once all of its left neighbors are. Within that constraint the order and
//! the orientation of each region are picked to minimize the travel between
//! consecutive regions, using an ant colony search seeded by a greedy pass.
//! The random source is supplied by the caller, so a seeded generator gives
//! reproducible output.

use log::debug;
use rand::Rng;

use super::connect::measure_perimeter_horizontal_segment_length;
use super::contours::OffsetContours;
use super::monotonic::MonotonicRegion;
use super::scanline::{LinkQuality, ScanLine};
use crate::{CoordF, Error, Result, EPSILON, SCALING_FACTOR};

/// Number of ant generations.
const NUM_ROUNDS: usize = 25;
/// Stop after this many generations without an improvement.
const NUM_ROUNDS_NO_CHANGE_EXIT: usize = 8;
/// Upper bound of ants per generation.
const MAX_ANTS: usize = 10;
/// Pheromone level before the greedy pass calibrates it.
const PHEROMONE_INITIAL_DEPOSIT: CoordF = 0.5;
/// Global evaporation rate applied along the best path.
const PHEROMONE_EVAPORATION: CoordF = 0.1;
/// Local decay applied to each link an ant takes.
const PHEROMONE_DIVERSIFICATION: CoordF = 0.1;
/// Probability of taking the best candidate instead of sampling.
const PROBABILITY_TAKE_BEST: f64 = 0.9;
const PHEROMONE_ALPHA: CoordF = 1.0;
const PHEROMONE_BETA: CoordF = 2.0;

/// A region on a chained path together with its orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonotonicRegionLink {
    pub region: usize,
    /// Enter at the high end of the left boundary instead of the low one.
    pub flipped: bool,
}

impl MonotonicRegionLink {
    pub fn new(region: usize, flipped: bool) -> Self {
        Self { region, flipped }
    }
}

/// Travel from the exit of one region to the entry of another.
#[derive(Clone, Copy, Debug)]
struct AntPath {
    /// mm, measured on first access.
    length: Option<CoordF>,
    visibility: CoordF,
    pheromone: CoordF,
}

/// Lazily measured travel costs between all pairs of region ends.
struct AntPathMatrix<'a> {
    regions: &'a [MonotonicRegion],
    contours: &'a OffsetContours,
    lines: &'a [ScanLine],
    paths: Vec<AntPath>,
}

impl<'a> AntPathMatrix<'a> {
    fn new(
        regions: &'a [MonotonicRegion],
        contours: &'a OffsetContours,
        lines: &'a [ScanLine],
        initial_pheromone: CoordF,
    ) -> Self {
        let n = regions.len();
        Self {
            regions,
            contours,
            lines,
            paths: vec![
                AntPath {
                    length: None,
                    visibility: 0.0,
                    pheromone: initial_pheromone,
                };
                n * n * 4
            ],
        }
    }

    fn reset_pheromone(&mut self, pheromone: CoordF) {
        for path in &mut self.paths {
            path.pheromone = pheromone;
        }
    }

    #[inline]
    fn index(&self, from: MonotonicRegionLink, to: MonotonicRegionLink) -> usize {
        let row = 2 * from.region + from.flipped as usize;
        let col = 2 * to.region + to.flipped as usize;
        row * self.regions.len() * 2 + col
    }

    /// Index of the path between two region ends, measuring it if needed.
    fn get(&mut self, from: MonotonicRegionLink, to: MonotonicRegionLink) -> usize {
        let idx = self.index(from, to);
        if self.paths[idx].length.is_none() {
            let length = self.measure(from, to);
            let path = &mut self.paths[idx];
            path.length = Some(length);
            path.visibility = 1.0 / (length + EPSILON);
        }
        idx
    }

    fn length(&mut self, from: MonotonicRegionLink, to: MonotonicRegionLink) -> CoordF {
        let idx = self.get(from, to);
        self.paths[idx].length.unwrap_or_default()
    }

    /// Perimeter length when the exit and entry are joined by a valid
    /// perimeter link between adjacent lines, straight distance otherwise.
    fn measure(&self, from: MonotonicRegionLink, to: MonotonicRegionLink) -> CoordF {
        let (region_from, region_to) = (&self.regions[from.region], &self.regions[to.region]);
        let i_from = region_from.right_intersection_point(from.flipped);
        let i_to = region_to.left_intersection_point(to.flipped);
        let vline_from = region_from.right.vline;
        let vline_to = region_to.left.vline;
        let it_from = &self.lines[vline_from].intersections[i_from];
        if vline_from + 1 == vline_to
            && it_from.right_horizontal() == Some(i_to)
            && it_from.next.quality == LinkQuality::Valid
        {
            return measure_perimeter_horizontal_segment_length(self.contours, self.lines, vline_from, i_from, i_to)
                / SCALING_FACTOR;
        }
        let p1 = self.lines[vline_from].point(i_from);
        let p2 = self.lines[vline_to].point(i_to);
        p1.distance(&p2) / SCALING_FACTOR
    }

    /// Unnormalized probability of following a path.
    fn probability(&self, idx: usize) -> CoordF {
        let path = &self.paths[idx];
        path.pheromone.powf(PHEROMONE_ALPHA) * path.visibility.powf(PHEROMONE_BETA)
    }
}

/// Precedence bookkeeping of a single path construction.
#[derive(Clone)]
struct Frontier {
    /// Unprocessed left neighbors plus one for the region itself.
    unprocessed: Vec<usize>,
    /// Regions whose left neighbors are all on the path already.
    queue: Vec<usize>,
}

impl Frontier {
    fn new(regions: &[MonotonicRegion]) -> Self {
        Self {
            unprocessed: regions.iter().map(|r| r.left_neighbors.len() + 1).collect(),
            queue: regions
                .iter()
                .enumerate()
                .filter(|(_, r)| r.left_neighbors.is_empty())
                .map(|(i, _)| i)
                .collect(),
        }
    }

    fn remove_from_queue(&mut self, region: usize) {
        if let Some(pos) = self.queue.iter().position(|&r| r == region) {
            self.queue.swap_remove(pos);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    link: MonotonicRegionLink,
    path: usize,
    probability: CoordF,
}

/// Total length of a chained path: the extra length of each region in its
/// orientation plus the travel between consecutive regions, mm.
pub fn chained_path_length(
    regions: &[MonotonicRegion],
    contours: &OffsetContours,
    lines: &[ScanLine],
    path: &[MonotonicRegionLink],
) -> CoordF {
    let mut matrix = AntPathMatrix::new(regions, contours, lines, 0.0);
    path_length(&mut matrix, path)
}

fn path_length(matrix: &mut AntPathMatrix<'_>, path: &[MonotonicRegionLink]) -> CoordF {
    let regions = matrix.regions;
    let own: CoordF = path.iter().map(|l| regions[l.region].length(l.flipped)).sum();
    let travel: CoordF = path.windows(2).map(|w| matrix.length(w[0], w[1])).sum();
    own + travel
}

/// Order `regions` so that every region follows all of its left neighbors,
/// approximately minimizing the travel between them.
pub fn chain_monotonic_regions<R: Rng + ?Sized>(
    regions: &[MonotonicRegion],
    contours: &OffsetContours,
    lines: &[ScanLine],
    rng: &mut R,
) -> Result<Vec<MonotonicRegionLink>> {
    if regions.is_empty() {
        return Ok(Vec::new());
    }

    let frontier_initial = Frontier::new(regions);
    if frontier_initial.queue.is_empty() {
        return Err(Error::infill_failed(regions[0].left.vline, "monotonic regions form a cycle"));
    }
    let mut matrix = AntPathMatrix::new(regions, contours, lines, PHEROMONE_INITIAL_DEPOSIT);

    let greedy_length = greedy_path_length(regions, &mut matrix, frontier_initial.clone())?;
    let pheromone_initial = 0.1 / greedy_length.max(EPSILON);
    matrix.reset_pheromone(pheromone_initial);

    let num_ants = regions.len().min(MAX_ANTS);
    let mut best_path: Vec<MonotonicRegionLink> = Vec::with_capacity(regions.len());
    let mut best_length = CoordF::MAX;
    let mut num_rounds_no_change = 0;
    let mut candidates: Vec<Candidate> = Vec::new();

    'rounds: for _round in 0..NUM_ROUNDS {
        if num_rounds_no_change >= NUM_ROUNDS_NO_CHANGE_EXIT {
            break;
        }
        let mut improved = false;
        for _ant in 0..num_ants {
            let mut frontier = frontier_initial.clone();
            let mut path = Vec::with_capacity(regions.len());

            // Random start from the ready regions.
            let first = rng.random_range(0..frontier.queue.len());
            let start = MonotonicRegionLink::new(frontier.queue.swap_remove(first), rng.random_bool(0.5));
            frontier.unprocessed[start.region] -= 1;
            path.push(start);

            let mut last = start;
            while !frontier.queue.is_empty() || !regions[last.region].right_neighbors.is_empty() {
                candidates.clear();
                for &next in &regions[last.region].right_neighbors {
                    frontier.unprocessed[next] -= 1;
                    if frontier.unprocessed[next] == 1 {
                        push_candidates(&mut candidates, &mut matrix, last, next);
                    }
                }
                let num_direct = candidates.len();
                if num_direct == 0 {
                    for &next in &frontier.queue {
                        push_candidates(&mut candidates, &mut matrix, last, next);
                    }
                }
                if candidates.is_empty() {
                    return Err(Error::infill_failed(
                        regions[last.region].right.vline,
                        "no monotonic region is ready to be chained",
                    ));
                }

                let take = if rng.random::<f64>() < PROBABILITY_TAKE_BEST {
                    best_candidate(&candidates)
                } else {
                    let total: CoordF = candidates.iter().map(|c| c.probability).sum();
                    let mut threshold = rng.random::<f64>() * total;
                    let mut take = candidates.len() - 1;
                    for (i, c) in candidates.iter().enumerate() {
                        threshold -= c.probability;
                        if threshold <= 0.0 {
                            take = i;
                            break;
                        }
                    }
                    take
                };
                let chosen = candidates[take];

                // Direct neighbors that became ready and were not taken wait in the queue.
                for c in &candidates[..num_direct] {
                    if frontier.queue.last() != Some(&c.link.region) && c.link.region != chosen.link.region {
                        frontier.queue.push(c.link.region);
                    }
                }
                if take >= num_direct {
                    frontier.remove_from_queue(chosen.link.region);
                }
                frontier.unprocessed[chosen.link.region] = 0;
                path.push(chosen.link);
                last = chosen.link;

                // Local decay diversifies the paths of one generation.
                let p = &mut matrix.paths[chosen.path];
                p.pheromone = (1.0 - PHEROMONE_DIVERSIFICATION) * p.pheromone
                    + PHEROMONE_DIVERSIFICATION * pheromone_initial;
            }

            let length = path_length(&mut matrix, &path);
            if length < best_length {
                best_length = length;
                best_path = path;
                if length == 0.0 {
                    break 'rounds;
                }
                improved = true;
            }
        }

        // Reinforce the best path found so far.
        let total_cost = best_length + EPSILON;
        for w in best_path.windows(2) {
            let idx = matrix.get(w[0], w[1]);
            let p = &mut matrix.paths[idx];
            p.pheromone = (1.0 - PHEROMONE_EVAPORATION) * p.pheromone + PHEROMONE_EVAPORATION / total_cost;
        }

        if improved {
            num_rounds_no_change = 0;
        } else {
            num_rounds_no_change += 1;
        }
    }

    debug!(
        "Chained {} monotonic regions, greedy length {:.3} mm, best length {:.3} mm",
        regions.len(),
        greedy_length,
        best_length
    );
    Ok(best_path)
}

fn push_candidates(candidates: &mut Vec<Candidate>, matrix: &mut AntPathMatrix<'_>, from: MonotonicRegionLink, next: usize) {
    for flipped in [false, true] {
        let link = MonotonicRegionLink::new(next, flipped);
        let path = matrix.get(from, link);
        candidates.push(Candidate {
            link,
            path,
            probability: matrix.probability(path),
        });
    }
}

/// First candidate of the highest probability.
fn best_candidate(candidates: &[Candidate]) -> usize {
    let mut best = 0;
    for (i, c) in candidates.iter().enumerate().skip(1) {
        if c.probability > candidates[best].probability {
            best = i;
        }
    }
    best
}

/// Length of a path built by always taking the closest ready region. Used to
/// calibrate the initial pheromone level.
fn greedy_path_length(
    regions: &[MonotonicRegion],
    matrix: &mut AntPathMatrix<'_>,
    mut frontier: Frontier,
) -> Result<CoordF> {
    let Some(first) = frontier.queue.pop() else {
        return Ok(0.0);
    };
    frontier.unprocessed[first] -= 1;
    let mut last = MonotonicRegionLink::new(first, false);
    let mut total = regions[first].length(false);

    while !frontier.queue.is_empty() || !regions[last.region].right_neighbors.is_empty() {
        let mut best: Option<(MonotonicRegionLink, CoordF)> = None;
        for &next in &regions[last.region].right_neighbors {
            if frontier.unprocessed[next] == 2 {
                consider_greedy(&mut best, matrix, last, next);
            }
        }
        let from_queue = best.is_none();
        if from_queue {
            for &next in &frontier.queue {
                consider_greedy(&mut best, matrix, last, next);
            }
        }
        let Some((next, _)) = best else {
            return Err(Error::infill_failed(
                regions[last.region].right.vline,
                "no monotonic region is ready to be chained",
            ));
        };

        for &n in &regions[last.region].right_neighbors {
            frontier.unprocessed[n] -= 1;
            if frontier.unprocessed[n] == 1 && n != next.region {
                frontier.queue.push(n);
            }
        }
        if from_queue {
            frontier.remove_from_queue(next.region);
        }
        total += regions[next.region].length(next.flipped) + matrix.length(last, next);
        frontier.unprocessed[next.region] = 0;
        last = next;
    }
    Ok(total)
}

fn consider_greedy(
    best: &mut Option<(MonotonicRegionLink, CoordF)>,
    matrix: &mut AntPathMatrix<'_>,
    from: MonotonicRegionLink,
    next: usize,
) {
    for flipped in [false, true] {
        let link = MonotonicRegionLink::new(next, flipped);
        let idx = matrix.get(from, link);
        let visibility = matrix.paths[idx].visibility;
        if best.map_or(true, |(_, v)| visibility > v) {
            *best = Some((link, visibility));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infill::monotonic::tests::{dumbbell, prepared, rectangle};
    use crate::infill::monotonic::{connect_monotonic_regions, generate_monotonic_regions};
    use crate::infill::scanline::tests::{contours_of, square_with_hole};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn regions_of(contours: &OffsetContours, n_lines: usize) -> (Vec<ScanLine>, Vec<MonotonicRegion>) {
        let mut lines = prepared(contours, n_lines);
        let mut regions = generate_monotonic_regions(&mut lines);
        connect_monotonic_regions(&mut regions, contours, &lines).unwrap();
        (lines, regions)
    }

    fn assert_precedence(regions: &[MonotonicRegion], path: &[MonotonicRegionLink]) {
        assert_eq!(path.len(), regions.len());
        let mut position = vec![usize::MAX; regions.len()];
        for (pos, link) in path.iter().enumerate() {
            assert_eq!(position[link.region], usize::MAX, "region visited twice");
            position[link.region] = pos;
        }
        for (idx, region) in regions.iter().enumerate() {
            for &left in &region.left_neighbors {
                assert!(position[left] < position[idx]);
            }
        }
    }

    #[test]
    fn test_chain_empty() {
        let contours = contours_of(&rectangle(10.0, 2.0));
        let mut rng = StdRng::seed_from_u64(0);
        let path = chain_monotonic_regions(&[], &contours, &[], &mut rng).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_chain_single_region_prefers_cheaper_orientation() {
        let contours = contours_of(&rectangle(20.0, 2.0));
        let (lines, regions) = regions_of(&contours, 19);
        assert_eq!(regions.len(), 1);
        let mut rng = StdRng::seed_from_u64(7);
        let path = chain_monotonic_regions(&regions, &contours, &lines, &mut rng).unwrap();
        assert_eq!(path.len(), 1);
        let region = &regions[0];
        assert!(region.length(path[0].flipped) <= region.length(!path[0].flipped));
    }

    #[test]
    fn test_chain_respects_precedence() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let (lines, regions) = regions_of(&contours, 9);
        assert!(regions.len() >= 3);
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let path = chain_monotonic_regions(&regions, &contours, &lines, &mut rng).unwrap();
            assert_precedence(&regions, &path);
        }
    }

    #[test]
    fn test_chain_is_deterministic() {
        let contours = contours_of(&square_with_hole(10.0, 4.0, 6.0));
        let (lines, regions) = regions_of(&contours, 9);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            chain_monotonic_regions(&regions, &contours, &lines, &mut rng).unwrap()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_chain_disjoint_regions() {
        let contours = contours_of(&dumbbell());
        let (lines, regions) = regions_of(&contours, 23);
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.left_neighbors.is_empty() && r.right_neighbors.is_empty()));

        // Exhaustive optimum over both orders and all orientations.
        let mut optimum = CoordF::MAX;
        for (a, b) in [(0, 1), (1, 0)] {
            for fa in [false, true] {
                for fb in [false, true] {
                    let path = [MonotonicRegionLink::new(a, fa), MonotonicRegionLink::new(b, fb)];
                    optimum = optimum.min(chained_path_length(&regions, &contours, &lines, &path));
                }
            }
        }

        let mut found = false;
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let path = chain_monotonic_regions(&regions, &contours, &lines, &mut rng).unwrap();
            assert_precedence(&regions, &path);
            let length = chained_path_length(&regions, &contours, &lines, &path);
            assert!(length >= optimum - 1e-9);
            found |= (length - optimum).abs() < 1e-9;
        }
        assert!(found);
    }
}
