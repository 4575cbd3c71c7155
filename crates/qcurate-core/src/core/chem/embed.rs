//! Distance-geometry embedding of molecular graphs.
//!
//! Bounds on every interatomic distance are derived from the graph: bond
//! lengths, valence angles, the torsions of double and aromatic bonds, and a
//! contact floor for atoms further apart. Triangle smoothing tightens them, a
//! random distance matrix drawn inside them is turned into coordinates through
//! its metric matrix, and the result is refined against the bounds, the
//! configuration of each stereocentre and the planarity of trigonal atoms.
//! Disconnected fragments are embedded one by one and laid out along x.

use super::perception::{smallest_ring_size, smallest_rings};
use super::stereo::{self, can_be_chiral, reference_order, substituents};
use crate::core::models::atom::Chirality;
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::models::topology::{Bond, BondOrder, BondStereo};
use nalgebra::{DMatrix, Point3, SymmetricEigen, Vector3};
use rand::Rng;
use std::collections::VecDeque;
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, trace};

const MAX_ATTEMPTS: usize = 10;
const BOND_TOLERANCE: f64 = 0.01;
const TORSION_TOLERANCE: f64 = 0.05;
/// Added to the sum of covalent radii for atoms more than three bonds apart.
const CONTACT_MARGIN: f64 = 0.8;
/// Smallest |signed volume| (Å³) a stereocentre is refined towards.
const CHIRAL_VOLUME: f64 = 0.5;
const PLANARITY_WEIGHT: f64 = 0.5;
/// Space left between the bounding boxes of disconnected fragments (Å).
pub const FRAGMENT_GAP: f64 = 3.0;
const MAX_ITERATIONS: usize = 5000;
const CONVERGED: f64 = 1e-9;
const INITIAL_NOISE: f64 = 0.05;
/// Largest deviation from the ideal length accepted for any bond (Å).
const ACCEPTED_BOND_DEVIATION: f64 = 0.25;
/// Double bonds in rings at least this large may be trans.
const LARGE_RING: usize = 8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbedError {
    #[error("Cannot embed a molecule without atoms")]
    Empty,
    #[error("No geometry reproducing the bonds and stereocentres was found in {0} attempts")]
    NotConverged(usize),
}

/// How a pair of atoms is related in the graph. Closer relations take
/// precedence when a pair is reached along several paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Separation {
    Distant,
    Torsion,
    Angle,
    Bond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Linear,
    Trigonal,
    Tetrahedral,
    Hypervalent,
}

impl Shape {
    fn of(mol: &Molecule, atom: usize) -> Self {
        let degree = mol.degree(atom);
        if degree > 4 {
            return Shape::Hypervalent;
        }
        // sulfoxides, sulfones and phosphates keep a tetrahedral frame
        if degree == 4 || (degree == 3 && can_be_chiral(mol, atom)) {
            return Shape::Tetrahedral;
        }
        let orders = mol.bonded(atom).iter().map(|&(_, bond)| mol.bonds()[bond].order);
        let (mut doubles, mut triples, mut aromatic) = (0, 0, 0);
        for order in orders {
            match order {
                BondOrder::Double => doubles += 1,
                BondOrder::Triple => triples += 1,
                BondOrder::Aromatic => aromatic += 1,
                BondOrder::Single => {}
            }
        }
        if triples > 0 || doubles > 1 {
            Shape::Linear
        } else if doubles == 1 || aromatic > 0 {
            Shape::Trigonal
        } else {
            Shape::Tetrahedral
        }
    }

    /// Valence angle range in degrees.
    fn angle_range(self) -> (f64, f64) {
        match self {
            Shape::Linear => (170.0, 180.0),
            Shape::Trigonal => (115.0, 125.0),
            Shape::Tetrahedral => (104.0, 115.0),
            Shape::Hypervalent => (80.0, 180.0),
        }
    }
}

/// Symmetric lower and upper distance bounds over all atom pairs.
#[derive(Debug, Clone)]
struct Bounds {
    n: usize,
    lower: Vec<f64>,
    upper: Vec<f64>,
    separation: Vec<Separation>,
}

impl Bounds {
    fn new(n: usize) -> Self {
        Self {
            n,
            lower: vec![0.0; n * n],
            upper: vec![f64::INFINITY; n * n],
            separation: vec![Separation::Distant; n * n],
        }
    }

    fn lower(&self, i: usize, j: usize) -> f64 {
        self.lower[i * self.n + j]
    }

    fn upper(&self, i: usize, j: usize) -> f64 {
        self.upper[i * self.n + j]
    }

    fn set(&mut self, i: usize, j: usize, lower: f64, upper: f64) {
        for idx in [i * self.n + j, j * self.n + i] {
            self.lower[idx] = lower;
            self.upper[idx] = upper;
        }
    }

    /// Applies a bound unless the pair is already bound by a closer relation.
    /// Bounds of the same relation are intersected.
    fn restrict(&mut self, i: usize, j: usize, separation: Separation, lower: f64, upper: f64) {
        let current = self.separation[i * self.n + j];
        if current > separation {
            return;
        }
        let (mut lower, mut upper) = (lower, upper);
        if current == separation {
            lower = lower.max(self.lower(i, j));
            upper = upper.min(self.upper(i, j));
            if lower > upper {
                let mid = 0.5 * (lower + upper);
                (lower, upper) = (mid, mid);
            }
        }
        self.set(i, j, lower, upper);
        self.separation[i * self.n + j] = separation;
        self.separation[j * self.n + i] = separation;
    }

    /// Bounds restricted to `atoms`, in that order.
    fn subset(&self, atoms: &[usize]) -> Bounds {
        let mut sub = Bounds::new(atoms.len());
        for (a, &i) in atoms.iter().enumerate() {
            for (b, &j) in atoms.iter().enumerate() {
                sub.lower[a * sub.n + b] = self.lower(i, j);
                sub.upper[a * sub.n + b] = self.upper(i, j);
                sub.separation[a * sub.n + b] = self.separation[i * self.n + j];
            }
        }
        sub
    }

    /// Floyd-style triangle smoothing. Pairs left with crossed bounds are
    /// collapsed onto their upper bound.
    fn smooth(&mut self) {
        let n = self.n;
        for k in 0..n {
            for i in 0..n {
                if i == k {
                    continue;
                }
                for j in (i + 1)..n {
                    if j == k {
                        continue;
                    }
                    let through = self.upper(i, k) + self.upper(k, j);
                    if through < self.upper(i, j) {
                        self.set(i, j, self.lower(i, j), through);
                    }
                    let lower = (self.lower(i, k) - self.upper(k, j))
                        .max(self.lower(j, k) - self.upper(k, i));
                    if lower > self.lower(i, j) {
                        self.set(i, j, lower, self.upper(i, j));
                    }
                }
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if self.lower(i, j) > self.upper(i, j) {
                    self.set(i, j, self.upper(i, j), self.upper(i, j));
                }
            }
        }
    }
}

/// Ideal length of a bond from covalent radii, shortened for multiple bonds.
pub fn bond_length(mol: &Molecule, bond: &Bond) -> f64 {
    let factor = match bond.order {
        BondOrder::Single => 1.0,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
        BondOrder::Aromatic => 0.91,
    };
    let atoms = mol.atoms();
    (atoms[bond.i].element.covalent_radius() + atoms[bond.j].element.covalent_radius()) * factor
}

fn law_of_cosines(a: f64, b: f64, angle_degrees: f64) -> f64 {
    (a * a + b * b - 2.0 * a * b * angle_degrees.to_radians().cos()).sqrt()
}

/// Distance between the outer atoms of a torsion with bond lengths `a`, `b`,
/// `c`, valence angles `theta1`, `theta2` (degrees) and dihedral `phi` (radians).
fn torsion_distance(a: f64, b: f64, c: f64, theta1: f64, theta2: f64, phi: f64) -> f64 {
    let (t1, t2) = (theta1.to_radians(), theta2.to_radians());
    let x = b - c * t2.cos() - a * t1.cos();
    let y = c * t2.sin() * phi.cos() - a * t1.sin();
    let z = c * t2.sin() * phi.sin();
    (x * x + y * y + z * z).sqrt()
}

/// Size of the smallest ring in which `i`, `centre`, `k` are consecutive.
fn ring_around(rings: &[Vec<usize>], i: usize, centre: usize, k: usize) -> Option<usize> {
    rings
        .iter()
        .filter(|ring| {
            ring.iter().position(|&a| a == centre).is_some_and(|p| {
                let len = ring.len();
                let (prev, next) = (ring[(p + len - 1) % len], ring[(p + 1) % len]);
                (prev == i && next == k) || (prev == k && next == i)
            })
        })
        .map(Vec::len)
        .min()
}

fn valence_angle(
    mol: &Molecule,
    rings: &[Vec<usize>],
    i: usize,
    centre: usize,
    k: usize,
) -> (f64, f64) {
    let shape = Shape::of(mol, centre);
    match ring_around(rings, i, centre, k) {
        Some(3) => (57.0, 63.0),
        Some(4) => (85.0, 95.0),
        Some(5) => (100.0, 112.0),
        Some(size) if size >= 7 && shape == Shape::Trigonal => (115.0, 135.0),
        _ => shape.angle_range(),
    }
}

/// Whether the torsion `i`-bond-`l` must be cis or trans.
///
/// Stereo double bonds follow their stored configuration. Double and aromatic
/// bonds in small rings are cis when all four atoms share a ring, otherwise
/// trans. Other acyclic double bonds are made planar with the reference
/// substituents trans.
fn torsion_configuration(
    mol: &Molecule,
    rings: &[Vec<usize>],
    bond_idx: usize,
    i: usize,
    l: usize,
) -> Option<BondStereo> {
    let bond = &mol.bonds()[bond_idx];
    if bond.stereo.is_some() {
        return stereo::relation(mol, bond_idx, i, l);
    }
    match (bond.order, smallest_ring_size(mol, bond_idx)) {
        (BondOrder::Double | BondOrder::Aromatic, Some(size)) if size < LARGE_RING => {
            let shared = rings
                .iter()
                .any(|ring| [i, bond.i, bond.j, l].iter().all(|a| ring.contains(a)));
            Some(if shared { BondStereo::Cis } else { BondStereo::Trans })
        }
        (BondOrder::Double, None) => {
            let first = substituents(mol, bond.i, bond.j).first().copied();
            let second = substituents(mol, bond.j, bond.i).first().copied();
            if (first == Some(i)) == (second == Some(l)) {
                Some(BondStereo::Trans)
            } else {
                Some(BondStereo::Cis)
            }
        }
        _ => None,
    }
}

fn distance_bounds(mol: &Molecule) -> Bounds {
    let n = mol.n_atoms();
    let rings = smallest_rings(mol);
    let bonds = mol.bonds();
    let mut bounds = Bounds::new(n);

    for bond in bonds {
        let d = bond_length(mol, bond);
        bounds.restrict(bond.i, bond.j, Separation::Bond, d - BOND_TOLERANCE, d + BOND_TOLERANCE);
    }

    for centre in 0..n {
        let bonded = mol.bonded(centre);
        for (p, &(i, bond_i)) in bonded.iter().enumerate() {
            for &(k, bond_k) in &bonded[p + 1..] {
                let (lo, hi) = valence_angle(mol, &rings, i, centre, k);
                let a = bond_length(mol, &bonds[bond_i]);
                let b = bond_length(mol, &bonds[bond_k]);
                let (lower, upper) = (law_of_cosines(a, b, lo), law_of_cosines(a, b, hi));
                bounds.restrict(i, k, Separation::Angle, lower, upper);
            }
        }
    }

    for (bond_idx, bond) in bonds.iter().enumerate() {
        let (j, k) = (bond.i, bond.j);
        let b = bond_length(mol, bond);
        for &(i, bond_i) in mol.bonded(j) {
            if i == k {
                continue;
            }
            for &(l, bond_l) in mol.bonded(k) {
                if l == j || l == i {
                    continue;
                }
                let a = bond_length(mol, &bonds[bond_i]);
                let c = bond_length(mol, &bonds[bond_l]);
                let (lo1, hi1) = valence_angle(mol, &rings, i, j, k);
                let (lo2, hi2) = valence_angle(mol, &rings, j, k, l);
                let span = |phi: f64| {
                    let narrow = torsion_distance(a, b, c, lo1, lo2, phi);
                    let wide = torsion_distance(a, b, c, hi1, hi2, phi);
                    (narrow.min(wide), narrow.max(wide))
                };
                let (lower, upper) = match torsion_configuration(mol, &rings, bond_idx, i, l) {
                    Some(BondStereo::Cis) => {
                        let (lo, hi) = span(0.0);
                        (lo - TORSION_TOLERANCE, hi + TORSION_TOLERANCE)
                    }
                    Some(BondStereo::Trans) => {
                        let (lo, hi) = span(PI);
                        (lo - TORSION_TOLERANCE, hi + TORSION_TOLERANCE)
                    }
                    None => (span(0.0).0, span(PI).1),
                };
                bounds.restrict(i, l, Separation::Torsion, lower, upper);
            }
        }
    }

    let atoms = mol.atoms();
    for i in 0..n {
        for j in (i + 1)..n {
            if bounds.separation[i * n + j] == Separation::Distant {
                let floor = atoms[i].element.covalent_radius()
                    + atoms[j].element.covalent_radius()
                    + CONTACT_MARGIN;
                bounds.set(i, j, floor, f64::INFINITY);
            }
        }
    }
    bounds
}

/// Connected components, each sorted by atom index.
fn fragments(mol: &Molecule) -> Vec<Vec<usize>> {
    let mut seen = vec![false; mol.n_atoms()];
    let mut fragments = Vec::new();
    for start in 0..mol.n_atoms() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut fragment = Vec::new();
        while let Some(atom) = queue.pop_front() {
            fragment.push(atom);
            for neighbor in mol.neighbors(atom) {
                if !seen[neighbor] {
                    seen[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        fragment.sort_unstable();
        fragments.push(fragment);
    }
    fragments
}

/// Coordinates from the three largest eigenvalues of the metric matrix of
/// `squared` distances.
fn metric_coordinates(squared: &DMatrix<f64>) -> Vec<Point3<f64>> {
    let n = squared.nrows();
    let size = n as f64;
    let total = squared.sum() / 2.0;
    let to_centre: Vec<f64> = (0..n)
        .map(|i| squared.row(i).sum() / size - total / (size * size))
        .collect();
    let metric =
        DMatrix::from_fn(n, n, |i, j| 0.5 * (to_centre[i] + to_centre[j] - squared[(i, j)]));
    let eigen = SymmetricEigen::new(metric);
    let mut axes: Vec<usize> = (0..n).collect();
    axes.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    (0..n)
        .map(|i| {
            let mut point = [0.0; 3];
            for (axis, &e) in axes.iter().take(3).enumerate() {
                point[axis] = eigen.eigenvalues[e].max(0.0).sqrt() * eigen.eigenvectors[(i, e)];
            }
            Point3::new(point[0], point[1], point[2])
        })
        .collect()
}

/// Terms the refined geometry is scored against, in fragment-local indices.
struct Restraints {
    pairs: Vec<(usize, usize, f64, f64)>,
    /// Centre, three neighbors, and the sign their signed volume must have.
    chiral: Vec<([usize; 4], f64)>,
    /// Trigonal centre and its three neighbors.
    planar: Vec<[usize; 4]>,
}

fn triple_product(x: &[Point3<f64>], [c, a, b, d]: [usize; 4]) -> (f64, [Vector3<f64>; 3]) {
    let (v1, v2, v3) = (x[a] - x[c], x[b] - x[c], x[d] - x[c]);
    (v1.cross(&v2).dot(&v3), [v2.cross(&v3), v3.cross(&v1), v1.cross(&v2)])
}

fn add_volume_gradient(
    grad: &mut [Vector3<f64>],
    [c, a, b, d]: [usize; 4],
    partials: [Vector3<f64>; 3],
    scale: f64,
) {
    let [ga, gb, gd] = partials.map(|g| g * scale);
    grad[a] += ga;
    grad[b] += gb;
    grad[d] += gd;
    grad[c] -= ga + gb + gd;
}

impl Restraints {
    fn energy(&self, x: &[Point3<f64>], grad: &mut [Vector3<f64>]) -> f64 {
        grad.fill(Vector3::zeros());
        let mut energy = 0.0;
        for &(i, j, lower, upper) in &self.pairs {
            let diff = x[i] - x[j];
            let d2 = diff.norm_squared();
            let g = if d2 > upper * upper {
                let u2 = upper * upper;
                let t = d2 / u2 - 1.0;
                energy += t * t;
                diff * (4.0 * t / u2)
            } else if d2 < lower * lower {
                let l2 = lower * lower;
                let denominator = l2 + d2;
                let t = 2.0 * l2 / denominator - 1.0;
                energy += t * t;
                diff * (-8.0 * t * l2 / (denominator * denominator))
            } else {
                continue;
            };
            grad[i] += g;
            grad[j] -= g;
        }
        for &(atoms, sign) in &self.chiral {
            let (volume, partials) = triple_product(x, atoms);
            let shortfall = CHIRAL_VOLUME - sign * volume;
            if shortfall > 0.0 {
                energy += shortfall * shortfall;
                add_volume_gradient(grad, atoms, partials, -2.0 * shortfall * sign);
            }
        }
        for &atoms in &self.planar {
            let (volume, partials) = triple_product(x, atoms);
            energy += PLANARITY_WEIGHT * volume * volume;
            add_volume_gradient(grad, atoms, partials, 2.0 * PLANARITY_WEIGHT * volume);
        }
        energy
    }

    /// Steepest descent with an adaptive step. Returns the final score.
    fn refine(&self, coords: &mut Vec<Point3<f64>>) -> f64 {
        let mut grad = vec![Vector3::zeros(); coords.len()];
        let mut trial_grad = grad.clone();
        let mut energy = self.energy(coords, &mut grad);
        let mut step = 0.1;
        for _ in 0..MAX_ITERATIONS {
            if energy < CONVERGED {
                break;
            }
            let trial: Vec<Point3<f64>> =
                coords.iter().zip(&grad).map(|(p, g)| p - g * step).collect();
            let trial_energy = self.energy(&trial, &mut trial_grad);
            if trial_energy < energy {
                *coords = trial;
                energy = trial_energy;
                std::mem::swap(&mut grad, &mut trial_grad);
                step *= 1.2;
            } else {
                step *= 0.5;
                if step < 1e-12 {
                    break;
                }
            }
        }
        energy
    }
}

fn restraints(mol: &Molecule, atoms: &[usize], bounds: &Bounds) -> Restraints {
    let local = |atom: usize| atoms.binary_search(&atom).ok();
    let n = atoms.len();
    let pairs = (0..n)
        .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
        .map(|(a, b)| (a, b, bounds.lower(a, b), bounds.upper(a, b)))
        .collect();

    let mut chiral = Vec::new();
    let mut planar = Vec::new();
    for (c, &atom) in atoms.iter().enumerate() {
        if let Some(tag) = mol.atoms()[atom].chirality {
            let order = reference_order(mol, atom);
            let last: Option<Vec<usize>> = order[order.len().saturating_sub(3)..]
                .iter()
                .map(|slot| slot.and_then(local))
                .collect();
            if let Some(&[a, b, d]) = last.as_deref() {
                let sign = match tag {
                    Chirality::CounterClockwise => -1.0,
                    Chirality::Clockwise => 1.0,
                };
                chiral.push(([c, a, b, d], sign));
            }
        }
        if mol.degree(atom) == 3 && Shape::of(mol, atom) == Shape::Trigonal {
            let neighbors: Option<Vec<usize>> = mol.neighbors(atom).map(local).collect();
            if let Some(&[a, b, d]) = neighbors.as_deref() {
                planar.push([c, a, b, d]);
            }
        }
    }
    Restraints {
        pairs,
        chiral,
        planar,
    }
}

fn embed_fragment(
    mol: &Molecule,
    atoms: &[usize],
    bounds: &Bounds,
    rng: &mut impl Rng,
) -> Vec<Point3<f64>> {
    let n = atoms.len();
    if n == 1 {
        return vec![Point3::origin()];
    }
    let mut local = bounds.subset(atoms);
    local.smooth();

    let mut squared = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let (lower, upper) = (local.lower(i, j), local.upper(i, j));
            let d = if upper.is_finite() && upper > lower {
                rng.gen_range(lower..=upper)
            } else {
                lower
            };
            squared[(i, j)] = d * d;
            squared[(j, i)] = d * d;
        }
    }
    let mut coords: Vec<Point3<f64>> = metric_coordinates(&squared)
        .into_iter()
        .map(|p| {
            let noise = Vector3::from_fn(|_, _| rng.gen_range(-INITIAL_NOISE..INITIAL_NOISE));
            p + noise
        })
        .collect();

    let restraints = restraints(mol, atoms, &local);
    let inverted = restraints
        .chiral
        .iter()
        .filter(|&&(centre, sign)| sign * triple_product(&coords, centre).0 < 0.0)
        .count();
    if 2 * inverted > restraints.chiral.len() {
        for p in &mut coords {
            p.z = -p.z;
        }
    }
    let score = restraints.refine(&mut coords);
    trace!(n_atoms = n, score, "Refined fragment");
    coords
}

fn is_acceptable(mol: &Molecule, coords: &Conformer) -> bool {
    let finite = coords.iter().all(|p| p.coords.iter().all(|c| c.is_finite()));
    finite
        && mol.bonds().iter().all(|bond| {
            let length = nalgebra::distance(&coords[bond.i], &coords[bond.j]);
            (length - bond_length(mol, bond)).abs() < ACCEPTED_BOND_DEVIATION
        })
        && stereo::conformer_matches(mol, coords)
}

/// Generates 3D coordinates for a molecule from its graph alone.
///
/// The geometry reproduces every stored chirality and double-bond
/// configuration. Draws come from `rng`, so a seeded generator gives
/// reproducible coordinates.
///
/// # Errors
///
/// Returns [`EmbedError::Empty`] for a molecule without atoms and
/// [`EmbedError::NotConverged`] when no attempt yields acceptable bond
/// lengths and stereochemistry.
pub fn embed(mol: &Molecule, rng: &mut impl Rng) -> Result<Conformer, EmbedError> {
    if mol.n_atoms() == 0 {
        return Err(EmbedError::Empty);
    }
    let bounds = distance_bounds(mol);
    let fragments = fragments(mol);

    for attempt in 1..=MAX_ATTEMPTS {
        let mut coords = vec![Point3::origin(); mol.n_atoms()];
        let mut offset = 0.0;
        for fragment in &fragments {
            let local = embed_fragment(mol, fragment, &bounds, rng);
            let min_x = local.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let max_x = local.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
            for (&atom, p) in fragment.iter().zip(&local) {
                coords[atom] = Point3::new(p.x - min_x + offset, p.y, p.z);
            }
            offset += max_x - min_x + FRAGMENT_GAP;
        }
        if is_acceptable(mol, &coords) {
            debug!(attempt, n_atoms = mol.n_atoms(), "Embedded molecule");
            return Ok(coords);
        }
        trace!(attempt, "Embedded geometry rejected");
    }
    Err(EmbedError::NotConverged(MAX_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn embedded(smiles: &str) -> (Molecule, Conformer) {
        let mol = parse(smiles).unwrap();
        let coords = embed(&mol, &mut StdRng::seed_from_u64(7)).unwrap();
        (mol, coords)
    }

    fn distance(coords: &Conformer, i: usize, j: usize) -> f64 {
        nalgebra::distance(&coords[i], &coords[j])
    }

    #[test]
    fn ethanol_has_realistic_bond_lengths() {
        let (mol, coords) = embedded("CCO");
        assert_eq!(coords.len(), mol.n_atoms());
        assert!((distance(&coords, 0, 1) - 1.52).abs() < 0.1);
        assert!((distance(&coords, 1, 2) - 1.42).abs() < 0.1);
        for bond in mol.bonds() {
            let length = distance(&coords, bond.i, bond.j);
            assert!((length - bond_length(&mol, bond)).abs() < 0.1, "bond length {length}");
        }
    }

    #[test]
    fn stereocentres_are_reproduced() {
        for smiles in ["F[C@H](Cl)Br", "F[C@@H](Cl)Br", "C[C@H](O)[C@@H](N)CC"] {
            let (mut mol, coords) = embedded(smiles);
            assert!(stereo::conformer_matches(&mol, &coords), "{smiles}");

            let expected = mol.canonical_smiles();
            mol.add_conformer(coords).unwrap();
            stereo::assign_from_conformer(&mut mol, 0);
            assert_eq!(mol.canonical_smiles(), expected);
        }
    }

    #[test]
    fn double_bond_configuration_is_reproduced() {
        for smiles in ["C/C=C/C", "C/C=C\\C"] {
            let (mol, coords) = embedded(smiles);
            let double = mol.bond_between(1, 2).unwrap();
            assert_eq!(
                stereo::bond_stereo_in_conformer(&mol, &coords, double),
                mol.bonds()[double].stereo,
                "{smiles}"
            );
        }
    }

    #[test]
    fn benzene_is_a_regular_ring() {
        let (mol, coords) = embedded("c1ccccc1");
        for k in 0..6 {
            let bonded = distance(&coords, k, (k + 1) % 6);
            assert!((bonded - 1.38).abs() < 0.1, "ring bond {bonded}");
            let para = distance(&coords, k, (k + 3) % 6);
            assert!((2.55..3.0).contains(&para), "para distance {para}");
        }
        assert_eq!(mol.n_atoms(), 12);
    }

    #[test]
    fn fragments_are_separated() {
        let (_, coords) = embedded("[Na+].[Cl-]");
        assert!(distance(&coords, 0, 1) >= FRAGMENT_GAP - 1e-9);
    }

    #[test]
    fn embedding_is_reproducible_for_a_seed() {
        let mol = parse("OCC(=O)N").unwrap();
        let first = embed(&mol, &mut StdRng::seed_from_u64(11)).unwrap();
        let second = embed(&mol, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_molecules_cannot_be_embedded() {
        let result = embed(&Molecule::new(), &mut StdRng::seed_from_u64(0));
        assert_eq!(result, Err(EmbedError::Empty));
    }

    #[test]
    fn distance_bounds_are_consistent_after_smoothing() {
        let mol = parse("c1ccc2ccccc2c1").unwrap();
        let mut bounds = distance_bounds(&mol);
        bounds.smooth();
        for i in 0..mol.n_atoms() {
            for j in (i + 1)..mol.n_atoms() {
                assert!(bounds.lower(i, j) <= bounds.upper(i, j));
                assert!(bounds.upper(i, j).is_finite());
            }
        }
    }
}
