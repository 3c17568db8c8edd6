//! Channel width estimation inside waterbodies
//!
//! When a divergence lies entirely inside a waterbody (all outgoing edges
//! are skeleton segments) the rank engine can weigh each branch by the
//! width of the channel it runs through:
//!
//! 1. Follow the branch through pass-through skeleton/bank segments to get a
//!    representative centerline and take its midpoint.
//! 2. Trim the waterbody outline, dropping the parts shared with a
//!    neighbouring waterbody or a coastline.
//! 3. Take the nearest trimmed boundary point to the midpoint, then the
//!    boundary on the opposite side, and measure the cross-section between
//!    them.
//! 4. Reject the cross-section if too much of it lies outside the
//!    waterbody (e.g. it spans two lakes).

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    BooleanOps, BoundingRect, Closest, ClosestPoint, Coord, Euclidean, Length,
    LineInterpolatePoint, Line, LineString, MultiLineString, Point,
};
use hydronet_core::graph::{EdgeIndex, Graph, Waterbody};
use std::collections::HashSet;

/// Concatenate `start` with its chain of skeleton/bank continuations.
///
/// The chain continues through nodes with exactly one inflow and one
/// outflow, as long as the next segment is synthetic.
pub(crate) fn centerline(graph: &Graph, start: EdgeIndex) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = graph.edge(start).geometry.0.clone();
    let mut seen = HashSet::from([start]);
    let mut node = graph.target(start);

    while graph.in_degree(node) == 1 && graph.out_degree(node) == 1 {
        let next = graph.outgoing(node)[0];
        let edge = graph.edge(next);
        if !(edge.is_skeleton() || edge.is_bank()) || !seen.insert(next) {
            break;
        }
        let skip = match (coords.last(), edge.geometry.0.first()) {
            (Some(a), Some(b)) if a == b => 1,
            _ => 0,
        };
        coords.extend(edge.geometry.0.iter().skip(skip).copied());
        node = graph.target(next);
    }

    LineString::new(coords)
}

/// Midpoint (by length) of a line
pub(crate) fn midpoint(line: &LineString<f64>) -> Option<Point<f64>> {
    line.line_interpolate_point(0.5)
}

/// Waterbody outline with shared portions removed.
///
/// Each ring is split wherever it runs along `shared_boundary` (within
/// `tolerance`). A ring with no shared parts stays one closed component.
pub fn trimmed_boundary(waterbody: &Waterbody, tolerance: f64) -> Vec<LineString<f64>> {
    let polygon = &waterbody.polygon;
    let shared = &waterbody.shared_boundary;
    let mut components = Vec::new();

    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        let segments: Vec<Line<f64>> = ring.lines().collect();
        if segments.is_empty() {
            continue;
        }
        let is_shared: Vec<bool> = segments
            .iter()
            .map(|seg| {
                !shared.0.is_empty()
                    && near(shared, seg.start, tolerance)
                    && near(shared, seg.end, tolerance)
                    && near(shared, seg.start + seg.delta() / 2.0, tolerance)
            })
            .collect();

        let first_shared = match is_shared.iter().position(|&s| s) {
            Some(i) => i,
            None => {
                components.push(ring.clone());
                continue;
            }
        };

        // Walk the ring starting just after a shared segment so that no
        // kept run wraps around the ring's closing vertex.
        let n = segments.len();
        let mut run: Vec<Coord<f64>> = Vec::new();
        for step in 1..=n {
            let k = (first_shared + step) % n;
            if is_shared[k] {
                if run.len() >= 2 {
                    components.push(LineString::new(std::mem::take(&mut run)));
                }
                run.clear();
            } else {
                if run.is_empty() {
                    run.push(segments[k].start);
                }
                run.push(segments[k].end);
            }
        }
        if run.len() >= 2 {
            components.push(LineString::new(run));
        }
    }

    components
}

/// Estimate the channel width at `at`.
///
/// Returns `None` when no cross-section straddling `at` can be found, or
/// when more than `max_outside_fraction` of it lies outside the waterbody.
pub fn channel_width(
    waterbody: &Waterbody,
    boundary: &[LineString<f64>],
    at: Point<f64>,
    max_outside_fraction: f64,
) -> Option<f64> {
    let (near_ix, p1) = boundary
        .iter()
        .enumerate()
        .filter_map(|(i, c)| closest(c, at).map(|p| (i, p)))
        .min_by(|a, b| dist(a.1, at).total_cmp(&dist(b.1, at)))?;

    let toward = at.0 - p1.0;
    let d1 = dist(p1, at);
    if d1 <= f64::EPSILON {
        return None;
    }

    // Cast a ray from the bank through the midpoint to find the far side.
    let reach = waterbody
        .polygon
        .bounding_rect()
        .map(|r| r.width().hypot(r.height()))?
        .max(d1)
        * 2.0;
    let far = at.0 + toward / d1 * reach;
    let ray = Line::new(at.0, far);

    let (far_ix, hit) = boundary
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.lines().filter_map(move |seg| crossing(ray, seg).map(|p| (i, p))))
        .filter(|(_, p)| dist(*p, at) > f64::EPSILON)
        .min_by(|a, b| dist(a.1, at).total_cmp(&dist(b.1, at)))?;

    // A different bank is measured at its nearest point to the midpoint;
    // the same ring (a lake without trimmed parts) at the ray hit.
    let p2 = if far_ix != near_ix {
        closest(&boundary[far_ix], at).unwrap_or(hit)
    } else {
        hit
    };

    let section = LineString::from(vec![p1.0, p2.0]);
    let width = section.length::<Euclidean>();
    if width <= 0.0 {
        return None;
    }

    let outside = waterbody
        .polygon
        .clip(&MultiLineString::new(vec![section]), true)
        .length::<Euclidean>();
    if outside / width > max_outside_fraction {
        return None;
    }

    Some(width)
}

fn closest(line: &LineString<f64>, p: Point<f64>) -> Option<Point<f64>> {
    match line.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => Some(q),
        Closest::Indeterminate => None,
    }
}

fn near(lines: &MultiLineString<f64>, c: Coord<f64>, tolerance: f64) -> bool {
    let p = Point::from(c);
    match lines.closest_point(&p) {
        Closest::Intersection(_) => true,
        Closest::SinglePoint(q) => dist(q, p) <= tolerance,
        Closest::Indeterminate => false,
    }
}

fn crossing(a: Line<f64>, b: Line<f64>) -> Option<Point<f64>> {
    match line_intersection(a, b)? {
        LineIntersection::SinglePoint { intersection, .. } => Some(intersection.into()),
        LineIntersection::Collinear { intersection } => Some(intersection.start.into()),
    }
}

fn dist(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    (dx * dx + dy * dy).sqrt()
}
