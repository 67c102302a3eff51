/// Paraxial Gaussian beam modes.
/// Hermite-Gauss and Laguerre-Gauss fields evaluated on a transverse grid at
/// an arbitrary distance from focus, plus modal projection.

use crate::config::BeamConfig;
use crate::selector::Mode;
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::f64::consts::{PI, SQRT_2};

/// Sample positions along both transverse axes.
#[derive(Debug, Clone)]
pub struct Grid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub dx: f64,
    pub dy: f64,
}

impl Grid {
    pub fn new(beam: &BeamConfig) -> Self {
        let xs = linspace(-beam.half_extent, beam.half_extent, beam.points);
        let ys = xs.clone();
        let dx = mean_step(&xs);
        let dy = mean_step(&ys);
        Grid { xs, ys, dx, dy }
    }

    pub fn width(&self) -> usize {
        self.xs.len()
    }

    pub fn height(&self) -> usize {
        self.ys.len()
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let denom = (count - 1) as f64;
    (0..count)
        .map(|i| start + (end - start) * (i as f64) / denom)
        .collect()
}

fn mean_step(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => (last - first) / (values.len() - 1) as f64,
        _ => 0.0,
    }
}

/// Complex field sampled on a `Grid`. Row-major; rows follow y, columns x.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Complex64>,
}

impl Field {
    pub fn zeros(width: usize, height: usize) -> Self {
        Field {
            width,
            height,
            data: vec![Complex64::new(0.0, 0.0); width * height],
        }
    }

    pub fn add_scaled(&mut self, other: &Field, scale: Complex64) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += scale * b;
        }
    }

    /// |E|² per sample.
    pub fn intensity(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.norm_sqr()).collect()
    }

    /// arg(E) / 2π per sample, in (-0.5, 0.5].
    pub fn phase_turns(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.arg() / (2.0 * PI)).collect()
    }

    pub fn max_abs_diff(&self, other: &Field) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}

/// n! as a float; orders here stay far below overflow.
pub fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

/// Physicists' Hermite polynomial H_n(x)
pub fn hermite_polynomial(x: f64, n: u32) -> f64 {
    let mut h0 = 1.0;
    if n == 0 {
        return h0;
    }
    let mut h1 = 2.0 * x;
    for k in 1..n {
        let h_new = 2.0 * x * h1 - 2.0 * f64::from(k) * h0;
        h0 = h1;
        h1 = h_new;
    }
    h1
}

/// Generalized Laguerre polynomial L^a_n(x)
pub fn laguerre_polynomial(x: f64, n: u32, alpha: u32) -> f64 {
    if n == 0 {
        return 1.0;
    }

    let alpha_f = f64::from(alpha);
    let mut l0 = 1.0;
    let mut l1 = 1.0 + alpha_f - x;

    for i in 2..=n {
        let i_f = f64::from(i);
        let l_new = ((2.0 * i_f - 1.0 + alpha_f - x) * l1 - (i_f - 1.0 + alpha_f) * l0) / i_f;
        l0 = l1;
        l1 = l_new;
    }

    l1
}

fn rayleigh_length(waist: f64, wavelength: f64) -> f64 {
    PI * waist * waist / wavelength
}

fn width_at(waist: f64, z: f64, zr: f64) -> f64 {
    waist * (1.0 + (z / zr).powi(2)).sqrt()
}

/// Wavefront curvature phase, -k0 r² z / (2 (z² + zR²)).
fn curvature_phase(r2: f64, z: f64, zr: f64, wavelength: f64) -> f64 {
    let k0 = 2.0 * PI / wavelength;
    -k0 * r2 * z / (2.0 * (z * z + zr * zr))
}

/// One-dimensional Hermite-Gauss factor and its Gouy phase.
fn hermite_gauss_axis(
    coords: &[f64],
    centre: f64,
    waist: f64,
    order: u32,
    beam: &BeamConfig,
) -> (Vec<Complex64>, f64) {
    let zr = rayleigh_length(waist, beam.wavelength);
    let wz = width_at(waist, beam.z, zr);
    let norm = 1.0 / (wz * 2f64.powf(f64::from(order) - 0.5) * factorial(order) * PI.sqrt()).sqrt();
    let gouy = (f64::from(order) + 0.5) * beam.z.atan2(zr);

    let values = coords
        .iter()
        .map(|&c| {
            let u = c - centre;
            let amp = norm * hermite_polynomial(SQRT_2 * u / wz, order) * (-(u * u) / (wz * wz)).exp();
            Complex64::from_polar(1.0, curvature_phase(u * u, beam.z, zr, beam.wavelength)) * amp
        })
        .collect();
    (values, gouy)
}

/// Hermite-Gauss mode of order (nx, ny), with independent waists per axis.
pub fn hermite_gauss(grid: &Grid, beam: &BeamConfig, nx: u32, ny: u32) -> Field {
    let (hx, gouy_x) = hermite_gauss_axis(&grid.xs, beam.x0, beam.wx, nx, beam);
    let (hy, gouy_y) = hermite_gauss_axis(&grid.ys, beam.y0, beam.wy, ny, beam);
    let gouy = Complex64::from_polar(1.0, gouy_x + gouy_y);

    let mut field = Field::zeros(grid.width(), grid.height());
    for (row, vy) in hy.iter().enumerate() {
        for (col, vx) in hx.iter().enumerate() {
            field.data[row * field.width + col] = vx * vy * gouy;
        }
    }
    field
}

/// Laguerre-Gauss mode with radial index p and azimuthal index m.
/// Uses `wx` as the waist.
pub fn laguerre_gauss(grid: &Grid, beam: &BeamConfig, p: u32, m: u32) -> Field {
    let w0 = beam.wx;
    let zr = rayleigh_length(w0, beam.wavelength);
    let wz = width_at(w0, beam.z, zr);
    let norm = (2.0 * factorial(p) / (PI * factorial(m + p))).sqrt() / wz;
    let gouy = f64::from(2 * p + m + 1) * beam.z.atan2(zr);
    let m_f = f64::from(m);

    let mut field = Field::zeros(grid.width(), grid.height());
    for (row, &y) in grid.ys.iter().enumerate() {
        let v = y - beam.y0;
        for (col, &x) in grid.xs.iter().enumerate() {
            let u = x - beam.x0;
            let r2 = u * u + v * v;
            let rho = (2.0 * r2).sqrt() / wz;
            let amp = norm
                * rho.powi(m as i32)
                * laguerre_polynomial(2.0 * r2 / (wz * wz), p, m)
                * (-r2 / (wz * wz)).exp();
            let phase = curvature_phase(r2, beam.z, zr, beam.wavelength) + gouy - m_f * v.atan2(u);
            field.data[row * field.width + col] = Complex64::from_polar(1.0, phase) * amp;
        }
    }
    field
}

/// Field of mode `(a, b)` in `mode`'s family: (nx, ny) for HG, (p, m) for LG.
pub fn mode_field(grid: &Grid, beam: &BeamConfig, mode: Mode, a: u32, b: u32) -> Field {
    match mode {
        Mode::HG => hermite_gauss(grid, beam, a, b),
        Mode::LG => laguerre_gauss(grid, beam, a, b),
    }
}

/// Overlap integral ∫ field · conj(mode) dA.
pub fn project(grid: &Grid, field: &Field, mode: &Field) -> Complex64 {
    debug_assert_eq!((field.width, field.height), (mode.width, mode.height));
    let sum: Complex64 = field
        .data
        .iter()
        .zip(&mode.data)
        .map(|(f, m)| f * m.conj())
        .sum();
    sum * grid.dx * grid.dy
}

pub type Coefficients = BTreeMap<(u32, u32), Complex64>;

/// Precomputed mode fields for orders `0..max_a` × `0..max_b`.
pub struct Basis {
    pub mode: Mode,
    pub symmetric_only: bool,
    grid: Grid,
    fields: BTreeMap<(u32, u32), Field>,
}

impl Basis {
    /// With `symmetric_only`, only a == b modes are built; the rest are
    /// reported as zero by `decompose` and skipped by `reconstruct`.
    pub fn new(
        beam: &BeamConfig,
        mode: Mode,
        max_a: u32,
        max_b: u32,
        symmetric_only: bool,
    ) -> Self {
        let grid = Grid::new(beam);
        let mut fields = BTreeMap::new();
        for a in 0..max_a {
            for b in 0..max_b {
                if symmetric_only && a != b {
                    continue;
                }
                fields.insert((a, b), mode_field(&grid, beam, mode, a, b));
            }
        }
        Basis {
            mode,
            symmetric_only,
            grid,
            fields,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn decompose(&self, field: &Field, max_a: u32, max_b: u32) -> Coefficients {
        let mut coefficients = Coefficients::new();
        for a in 0..max_a {
            for b in 0..max_b {
                let c = match self.fields.get(&(a, b)) {
                    Some(mode) => project(&self.grid, field, mode),
                    None => Complex64::new(0.0, 0.0),
                };
                coefficients.insert((a, b), c);
            }
        }
        coefficients
    }

    /// Sum of coefficient-weighted modes. Indices outside the basis are ignored.
    pub fn reconstruct(&self, coefficients: &Coefficients) -> Field {
        let mut field = Field::zeros(self.grid.width(), self.grid.height());
        for (&(a, b), &c) in coefficients {
            if self.symmetric_only && a != b {
                continue;
            }
            if let Some(mode) = self.fields.get(&(a, b)) {
                field.add_scaled(mode, c);
            }
        }
        field
    }

    /// Decompose every basis mode onto the whole basis and rebuild it.
    pub fn self_check(&self, max_a: u32, max_b: u32) -> BasisReport {
        let mut report = BasisReport::default();
        for (key, field) in &self.fields {
            let coefficients = self.decompose(field, max_a, max_b);
            for (other, c) in &coefficients {
                let expected = if other == key { 1.0 } else { 0.0 };
                report.projection_error = report.projection_error.max((*c - expected).norm());
            }
            let peak = field.data.iter().map(|v| v.norm()).fold(0.0, f64::max);
            if peak > 0.0 {
                let rebuilt = self.reconstruct(&coefficients);
                report.reconstruction_error =
                    report.reconstruction_error.max(rebuilt.max_abs_diff(field) / peak);
            }
        }
        report
    }
}

/// Worst-case errors from `Basis::self_check`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BasisReport {
    /// max |<u_a, u_b> - δ_ab|
    pub projection_error: f64,
    /// max |rebuilt - input| / peak |input|
    pub reconstruction_error: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-3;

    fn setup() -> (BeamConfig, Grid) {
        let beam = BeamConfig::default();
        let grid = Grid::new(&beam);
        (beam, grid)
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(1), 1.0);
        assert_eq!(factorial(5), 120.0);
        assert_eq!(factorial(18), 6_402_373_705_728_000.0);
    }

    #[test]
    fn test_hermite_polynomial() {
        let x = 0.7;
        assert_eq!(hermite_polynomial(x, 0), 1.0);
        assert!((hermite_polynomial(x, 1) - 2.0 * x).abs() < 1e-12);
        assert!((hermite_polynomial(x, 2) - (4.0 * x * x - 2.0)).abs() < 1e-12);
        assert!((hermite_polynomial(x, 3) - (8.0 * x.powi(3) - 12.0 * x)).abs() < 1e-12);
    }

    #[test]
    fn test_laguerre_polynomial() {
        let x = 1.3;
        assert_eq!(laguerre_polynomial(x, 0, 4), 1.0);
        assert!((laguerre_polynomial(x, 1, 2) - (3.0 - x)).abs() < 1e-12);
        assert!((laguerre_polynomial(x, 2, 0) - (x * x - 4.0 * x + 2.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn grid_spans_extent() {
        let (beam, grid) = setup();
        assert_eq!(grid.width(), 256);
        assert_eq!(grid.xs[0], -beam.half_extent);
        assert!((grid.xs[255] - beam.half_extent).abs() < 1e-18);
        assert!((grid.dx - 2.0 * beam.half_extent / 255.0).abs() < 1e-18);
    }

    #[test]
    fn modes_are_normalized() {
        let (beam, grid) = setup();
        for (mode, a, b) in [(Mode::HG, 0, 0), (Mode::HG, 1, 2), (Mode::LG, 0, 0), (Mode::LG, 1, 1), (Mode::LG, 0, 3)] {
            let f = mode_field(&grid, &beam, mode, a, b);
            let norm = project(&grid, &f, &f);
            assert!((norm.re - 1.0).abs() < TOL, "{mode} {a},{b}: {norm}");
            assert!(norm.im.abs() < 1e-9);
        }
    }

    #[test]
    fn distinct_modes_are_orthogonal() {
        let (beam, grid) = setup();
        let pairs = [
            ((Mode::HG, 1, 0), (Mode::HG, 0, 1)),
            ((Mode::HG, 0, 0), (Mode::HG, 2, 0)),
            ((Mode::LG, 0, 1), (Mode::LG, 0, 2)),
            ((Mode::LG, 0, 0), (Mode::LG, 1, 0)),
        ];
        for ((ma, a1, a2), (mb, b1, b2)) in pairs {
            let fa = mode_field(&grid, &beam, ma, a1, a2);
            let fb = mode_field(&grid, &beam, mb, b1, b2);
            assert!(project(&grid, &fa, &fb).norm() < TOL);
        }
    }

    #[test]
    fn fundamental_modes_coincide() {
        let (beam, grid) = setup();
        let hg = hermite_gauss(&grid, &beam, 0, 0);
        let lg = laguerre_gauss(&grid, &beam, 0, 0);
        assert!(hg.max_abs_diff(&lg) < 1e-6 * hg.data.iter().map(|v| v.norm()).fold(0.0, f64::max));
    }

    #[test]
    fn decompose_recovers_superposition() {
        let (beam, grid) = setup();
        let c1 = Complex64::new(0.6, 0.0);
        let c2 = Complex64::new(0.0, 0.8);
        let mut field = Field::zeros(grid.width(), grid.height());
        field.add_scaled(&hermite_gauss(&grid, &beam, 1, 0), c1);
        field.add_scaled(&hermite_gauss(&grid, &beam, 0, 2), c2);

        let basis = Basis::new(&beam, Mode::HG, 3, 3, false);
        let coeffs = basis.decompose(&field, 3, 3);
        assert_eq!(coeffs.len(), 9);
        assert!((coeffs[&(1, 0)] - c1).norm() < TOL);
        assert!((coeffs[&(0, 2)] - c2).norm() < TOL);
        assert!(coeffs[&(2, 2)].norm() < TOL);

        let rebuilt = basis.reconstruct(&coeffs);
        let peak = field.data.iter().map(|v| v.norm()).fold(0.0, f64::max);
        assert!(rebuilt.max_abs_diff(&field) < 1e-2 * peak);
    }

    #[test]
    fn symmetric_only_zeroes_off_diagonal() {
        let (beam, grid) = setup();
        let field = hermite_gauss(&grid, &beam, 1, 0);
        let basis = Basis::new(&beam, Mode::HG, 3, 3, true);
        assert_eq!(basis.len(), 3);
        let coeffs = basis.decompose(&field, 3, 3);
        assert_eq!(coeffs[&(1, 0)], Complex64::new(0.0, 0.0));
        assert!(basis.reconstruct(&coeffs).data.iter().all(|v| v.norm() < TOL));
    }

    #[test]
    fn small_basis_is_orthonormal() {
        let beam = BeamConfig::default();
        let basis = Basis::new(&beam, Mode::LG, 2, 3, false);
        let report = basis.self_check(2, 3);
        assert!(report.projection_error < TOL, "{report:?}");
        assert!(report.reconstruction_error < 1e-2, "{report:?}");
    }
}
