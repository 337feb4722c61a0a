use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Ray};
use crate::core::interaction::{Intersection, SurfacePoint};
use crate::core::light::Light;
use crate::materials::Materials;
use crate::shapes::{Shape, Shapes};

/// Constant-radiance area emission attached to a scene object.
pub struct AreaEmitter {
    pub radiance: Float,
}

pub struct SceneObject {
    pub shape: Shapes,
    pub material: Materials,
    pub emitter: Option<AreaEmitter>,
}

/// Flat object list. Acceleration structures are an external concern;
/// the integrator only sees `intersect`/`test_visibility` and light
/// selection.
pub struct Scene {
    objects: Vec<SceneObject>,
    light_indices: Vec<usize>,
    /// Uniform radiance surrounding the scene; escaped rays hit it at
    /// infinity.
    env_radiance: Option<Float>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>, env_radiance: Option<Float>) -> Self {
        let light_indices = objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.emitter.is_some())
            .map(|(i, _)| i)
            .collect();

        Self {
            objects,
            light_indices,
            env_radiance,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut nearest: Option<(Float, usize, crate::shapes::ShapeHit)> = None;

        for (i, obj) in self.objects.iter().enumerate() {
            if let Some(hit) = obj.shape.intersect(ray) {
                if hit.t < ray.t_max && nearest.as_ref().map_or(true, |(t, _, _)| hit.t < *t) {
                    nearest = Some((hit.t, i, hit));
                }
            }
        }

        if let Some((t, i, hit)) = nearest {
            let surf_pt = SurfacePoint::on_object(hit.p, hit.n, &self.objects[i]);
            return Some(Intersection { dist: t, surf_pt });
        }

        // Escaped rays hit the environment sphere at infinity, facing
        // back along the ray.
        self.env_radiance.map(|radiance| {
            let far = 1.0e7;
            Intersection {
                dist: far,
                surf_pt: SurfacePoint::at_infinity(
                    ray.find_point(far),
                    Normal3f::from(-ray.d.normalize()),
                    radiance,
                ),
            }
        })
    }

    /// True when the open segment between the two points is unoccluded.
    pub fn test_visibility(&self, pa: &SurfacePoint, pb: &SurfacePoint, time: Float) -> bool {
        if pa.at_infinity || pb.at_infinity {
            return false;
        }

        let seg = pb.p - pa.p;
        let dist = seg.length();
        if dist == 0.0 {
            return false;
        }
        let d = seg / dist;
        let ray = Ray::new(&(pa.p + d * Ray::EPSILON), &d, dist - 2.0 * Ray::EPSILON, time);

        for obj in self.objects.iter() {
            if let Some(hit) = obj.shape.intersect(&ray) {
                if hit.t < ray.t_max {
                    return false;
                }
            }
        }

        true
    }

    /// Uniformly selects one emitting object.
    pub fn select_light(&self, u: Float) -> Option<(Light, Float)> {
        if self.light_indices.is_empty() {
            return None;
        }

        let n = self.light_indices.len();
        let k = ((u * n as Float) as usize).min(n - 1);
        let index = self.light_indices[k];

        Some((
            Light {
                index,
                obj: &self.objects[index],
            },
            1.0 / n as Float,
        ))
    }

    /// Probability of `select_light` returning the emitter owning this
    /// surface point. Zero for points that are not selectable (the
    /// environment, non-emitters).
    pub fn evaluate_prob(&self, surf_pt: &SurfacePoint) -> Float {
        match surf_pt.obj {
            Some(obj) if obj.emitter.is_some() && !self.light_indices.is_empty() => {
                1.0 / self.light_indices.len() as Float
            }
            _ => 0.0,
        }
    }
}
