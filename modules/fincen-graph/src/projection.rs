use tracing::warn;

use fincen_common::{CountryVectorRow, Epoch, EpochProjection, ProjectionError, ScatterPoint};

/// Jacobi sweeps before giving up on further off-diagonal reduction.
const MAX_SWEEPS: usize = 100;

/// Singular values below this are treated as zero variance.
const VARIANCE_EPSILON: f64 = 1e-9;

/// Scale `v` to unit L2 norm. Returns `None` when the norm is zero or not finite.
pub fn l2_normalize(v: &[f64]) -> Option<Vec<f64>> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Project `vectors` onto their first two principal components.
///
/// The basis is fit on exactly these vectors. Scores are computed from the
/// eigen-decomposition of the centered Gram matrix (N×N, cheap for the
/// neighbour-sized batches this is used on). Each component's sign is fixed so
/// its largest-magnitude score is positive, which makes repeated runs agree.
pub fn pca_2d(vectors: &[Vec<f64>]) -> Vec<(f64, f64)> {
    let n = vectors.len();
    if n == 0 {
        return Vec::new();
    }
    let dim = vectors[0].len();

    let mut mean = vec![0.0; dim];
    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v) {
            *m += x;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n as f64);

    let centered: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| v.iter().zip(&mean).map(|(x, m)| x - m).collect())
        .collect();

    let mut gram = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let dot: f64 = centered[i].iter().zip(&centered[j]).map(|(a, b)| a * b).sum();
            gram[i][j] = dot;
            gram[j][i] = dot;
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(gram);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

    let mut components = [vec![0.0; n], vec![0.0; n]];
    for (slot, &k) in order.iter().take(2).enumerate() {
        let sigma = eigenvalues[k].max(0.0).sqrt();
        if sigma < VARIANCE_EPSILON {
            continue;
        }
        let mut scores: Vec<f64> = (0..n).map(|i| eigenvectors[i][k] * sigma).collect();
        let pivot = scores
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            scores.iter_mut().for_each(|s| *s = -*s);
        }
        components[slot] = scores;
    }

    (0..n).map(|i| (components[0][i], components[1][i])).collect()
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
/// Returns eigenvalues and a matrix whose columns are the eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        if off <= scale * 1e-24 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                a[p][q] = 0.0;
                a[q][p] = 0.0;

                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

/// Lay out one epoch's vectors in 2D, highlighting `highlight`.
///
/// Vectors with zero norm cannot be normalized; they are left out of the fit
/// and reported in `skipped`. All vectors must share one dimension.
pub fn project_epoch(
    rows: &[CountryVectorRow],
    epoch: Epoch,
    highlight: &str,
) -> Result<EpochProjection, ProjectionError> {
    if let Some(first) = rows.first() {
        let expected = first.vector(epoch).len();
        if let Some(bad) = rows.iter().find(|r| r.vector(epoch).len() != expected) {
            return Err(ProjectionError::DimensionMismatch {
                label: bad.name.clone(),
                expected,
                actual: bad.vector(epoch).len(),
            });
        }
    }

    let mut labels = Vec::with_capacity(rows.len());
    let mut normalized = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for row in rows {
        match l2_normalize(row.vector(epoch)) {
            Some(v) => {
                labels.push(row.name.clone());
                normalized.push(v);
            }
            None => {
                warn!(country = %row.name, %epoch, "Zero-norm embedding, skipping");
                skipped.push(row.name.clone());
            }
        }
    }

    let points = pca_2d(&normalized)
        .into_iter()
        .zip(labels)
        .map(|((x, y), label)| ScatterPoint {
            x,
            y,
            highlighted: label == highlight,
            label,
        })
        .collect();

    Ok(EpochProjection {
        epoch,
        points,
        skipped,
    })
}

/// Project every epoch. Each epoch gets its own independently fit basis.
pub fn project_all(
    rows: &[CountryVectorRow],
    highlight: &str,
) -> Result<Vec<EpochProjection>, ProjectionError> {
    Epoch::all()
        .into_iter()
        .map(|epoch| project_epoch(rows, epoch, highlight))
        .collect()
}
