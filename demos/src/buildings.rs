// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic building footprints: small star-shaped polygons scattered over a
//! region, with an exact point-to-polygon distance.

use std::f64::consts::TAU;

use kurbo::{BezPath, ParamCurveNearest, Point, Shape};
use mbr_index::{BoundingBox, Dataset, Entry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DatasetSettings;

const NEAREST_ACCURACY: f64 = 1e-12;

/// A closed footprint polygon and the id of the building it belongs to.
#[derive(Clone, Debug)]
pub(crate) struct Footprint {
    pub(crate) building: u64,
    pub(crate) outline: BezPath,
}

impl Footprint {
    /// Closed polygon through `vertices`, in order.
    pub(crate) fn new(building: u64, vertices: &[Point]) -> Self {
        let mut outline = BezPath::new();
        if let Some((first, rest)) = vertices.split_first() {
            outline.move_to(*first);
            for v in rest {
                outline.line_to(*v);
            }
            outline.close_path();
        }
        Self { building, outline }
    }

    pub(crate) fn envelope(&self) -> BoundingBox {
        self.outline.bounding_box().into()
    }

    /// Zero inside the polygon, otherwise the distance to its boundary.
    pub(crate) fn distance_to(&self, p: Point) -> f64 {
        if self.outline.contains(p) {
            return 0.0;
        }
        self.outline
            .segments()
            .map(|seg| seg.nearest(p, NEAREST_ACCURACY).distance_sq)
            .fold(f64::INFINITY, f64::min)
            .sqrt()
    }
}

/// Footprints addressed by position.
#[derive(Debug, Default)]
pub(crate) struct Buildings {
    footprints: Vec<Footprint>,
}

impl Buildings {
    /// Scatter `settings.count` footprints over `settings.region`.
    ///
    /// Roughly one building in eight has a second part, sharing its building id
    /// and stored as a separate footprint.
    pub(crate) fn generate(settings: &DatasetSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let region = settings.region;
        let mut footprints = Vec::with_capacity(settings.count);
        let mut building = 0_u64;
        while footprints.len() < settings.count {
            building += 1;
            let parts = if rng.random_ratio(1, 8) { 2 } else { 1 };
            let center = Point::new(
                rng.random_range(region.min_x..=region.max_x),
                rng.random_range(region.min_y..=region.max_y),
            );
            for part in 0..parts {
                if footprints.len() == settings.count {
                    break;
                }
                let size = rng.random_range(settings.min_size..=settings.max_size);
                let offset = f64::from(part) * 2.5 * size;
                let c = Point::new(center.x + offset, center.y);
                footprints.push(Footprint::new(building, &star(&mut rng, c, size)));
            }
        }
        Self { footprints }
    }

    pub(crate) fn len(&self) -> usize {
        self.footprints.len()
    }

    pub(crate) fn get(&self, id: usize) -> Option<&Footprint> {
        self.footprints.get(id)
    }

    /// Union of every footprint envelope.
    pub(crate) fn bounds(&self) -> Option<BoundingBox> {
        self.footprints
            .iter()
            .map(Footprint::envelope)
            .reduce(|a, b| a.union(&b))
    }
}

impl Dataset for Buildings {
    type Id = usize;

    fn envelopes(&self) -> impl Iterator<Item = Entry<usize>> + '_ {
        self.footprints
            .iter()
            .enumerate()
            .map(|(i, f)| Entry::new(f.envelope(), i))
    }

    fn exact_distance(&self, id: &usize, point: Point) -> f64 {
        self.get(*id).map_or(f64::INFINITY, |f| f.distance_to(point))
    }
}

/// Star-shaped polygon around `center`: sorted angles, jittered radii.
fn star(rng: &mut StdRng, center: Point, size: f64) -> Vec<Point> {
    let n = rng.random_range(4..=9);
    let mut angles: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..TAU)).collect();
    angles.sort_by(f64::total_cmp);
    angles
        .into_iter()
        .map(|a| {
            let r = size * rng.random_range(0.4..=1.0);
            Point::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}
