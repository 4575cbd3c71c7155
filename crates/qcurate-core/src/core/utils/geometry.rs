use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Rotates the selected points about the axis running through `origin` and `target`.
pub fn rotate_about_bond(
    coords: &mut [Point3<f64>],
    origin: &Point3<f64>,
    target: &Point3<f64>,
    selection: &[usize],
    angle_degrees: f64,
) {
    let axis = target - origin;
    if axis.norm_squared() < f64::EPSILON {
        return;
    }
    let rotation = rotation_from_axis_angle(&axis, angle_degrees);
    for &idx in selection {
        if let Some(point) = coords.get_mut(idx) {
            *point = origin + rotation * (*point - origin);
        }
    }
}

pub fn centroid(coords: &[Point3<f64>]) -> Option<Point3<f64>> {
    if coords.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = coords.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / coords.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// RMSD after optimal superposition (Kabsch).
///
/// Both sets are centred on their centroids and the rotation minimising the
/// deviation is taken from the SVD of their covariance, with a reflection
/// correction so the result is a proper rotation.
pub fn calculate_aligned_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let c1 = centroid(coords1)?;
    let c2 = centroid(coords2)?;
    let centred1: Vec<Vector3<f64>> = coords1.iter().map(|p| p - c1).collect();
    let centred2: Vec<Vector3<f64>> = coords2.iter().map(|p| p - c2).collect();

    let covariance: Matrix3<f64> = centred1
        .iter()
        .zip(&centred2)
        .map(|(a, b)| a * b.transpose())
        .sum();
    let svd = covariance.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let d = if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
        -1.0
    } else {
        1.0
    };
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = v_t.transpose() * correction * u.transpose();

    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = centred1
        .iter()
        .zip(&centred2)
        .map(|(a, b)| (rotation * *a - b).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
