//! Scalar, vector and polygon helpers shared by the table logic.

use glam::{Vec2, Vec3};
use rand::Rng;

/// Clamps `n` into the range spanned by `a` and `b`, in either order.
pub fn clamp_unordered(n: f32, a: f32, b: f32) -> f32 {
    if a < b { n.clamp(a, b) } else { n.clamp(b, a) }
}

/// Linearly remaps `n` from `[start1, stop1]` to `[start2, stop2]`.
///
/// With `clamp_output` the result is kept inside the output range, which may
/// be reversed (`start2 > stop2`).
pub fn map_range(n: f32, start1: f32, stop1: f32, start2: f32, stop2: f32, clamp_output: bool) -> f32 {
    let value = (n - start1) / (stop1 - start1) * (stop2 - start2) + start2;
    if clamp_output {
        clamp_unordered(value, start2, stop2)
    } else {
        value
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

/// Intersects a ray with the horizontal plane `z = target_z`.
///
/// Returns `None` when the ray runs parallel to the plane without lying in it,
/// or when the plane is behind the ray origin.
pub fn point_at_z(origin: Vec3, ray: Vec3, target_z: f32) -> Option<Vec3> {
    if ray.z == 0.0 {
        return (origin.z == target_z).then_some(origin);
    }
    let t = (target_z - origin.z) / ray.z;
    if t < 0.0 {
        return None;
    }
    Some(Vec3::new(origin.x + ray.x * t, origin.y + ray.y * t, target_z))
}

/// Even-odd point-in-polygon test. Points lying exactly on an edge count as inside.
pub fn is_point_in_polygon(polygon: &[Vec2], point: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];

        let cross = (a.y - point.y) * (b.x - a.x) - (a.x - point.x) * (b.y - a.y);
        let on_edge = cross == 0.0
            && point.x >= a.x.min(b.x)
            && point.x <= a.x.max(b.x)
            && point.y >= a.y.min(b.y)
            && point.y <= a.y.max(b.y);
        if on_edge {
            return true;
        }

        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Returns the polygon's boundary as an explicitly closed path.
pub fn closed_path(polygon: &[Vec2]) -> Vec<Vec2> {
    let mut path = polygon.to_vec();
    if let (Some(first), Some(last)) = (polygon.first(), polygon.last()) {
        if first != last {
            path.push(*first);
        }
    }
    path
}

/// Finds the nearest point on a polyline that is closer than `max_dist`.
pub fn closest_point_on_path(path: &[Vec2], point: Vec2, max_dist: f32) -> Option<Vec2> {
    if path.len() < 2 {
        return None;
    }
    let mut closest = None;
    let mut min_dist_sq = max_dist * max_dist;

    for segment in path.windows(2) {
        let start = segment[0];
        let delta = segment[1] - start;
        let len_sq = delta.length_squared();
        let t = if len_sq > 0.0 {
            ((point - start).dot(delta) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let candidate = start + delta * t;
        let dist_sq = candidate.distance_squared(point);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
            closest = Some(candidate);
        }
    }
    closest
}

fn path_length(path: &[Vec2]) -> f32 {
    path.windows(2).map(|s| s[0].distance(s[1])).sum()
}

/// Picks a uniformly distributed point along the combined length of `paths`.
///
/// Returns `None` if there is no path or every path has zero length.
pub fn pick_random_point<R: Rng>(paths: &[Vec<Vec2>], rng: &mut R) -> Option<Vec2> {
    let lengths: Vec<f32> = paths.iter().map(|p| path_length(p)).collect();
    let total: f32 = lengths.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut target = rng.random::<f32>() * total;
    for (path, &length) in paths.iter().zip(&lengths) {
        if target > length {
            target -= length;
            continue;
        }
        for segment in path.windows(2) {
            let seg_len = segment[0].distance(segment[1]);
            if target <= seg_len {
                let t = if seg_len == 0.0 { 0.0 } else { target / seg_len };
                return Some(segment[0].lerp(segment[1], t));
            }
            target -= seg_len;
        }
        return path.last().copied();
    }

    paths.iter().rev().find_map(|p| p.last().copied())
}

/// Converts a rotation quaternion `[x, y, z, w]` into `[yaw, pitch, roll]`.
///
/// The physics body's axes are read in reversed order (`x = q.z`, `z = q.x`)
/// before applying the Tait-Bryan formulas, matching the renderer's Z-up
/// convention.
pub fn quaternion_to_yaw_pitch_roll(q: [f32; 4]) -> [f32; 3] {
    let (x, y, z, w) = (q[2], q[1], q[0], q[3]);

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    [yaw, pitch, roll]
}
