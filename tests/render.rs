#[cfg(test)]
mod render {
    use approx::relative_eq;
    use prysm::cameras::PerspectiveCamera;
    use prysm::core::camera::Cameras;
    use prysm::core::common::Float;
    use prysm::core::geometry::{Normal3f, Point3f, Vector3f};
    use prysm::core::scene::{AreaEmitter, Scene, SceneObject};
    use prysm::core::settings::{keys, RenderSettings};
    use prysm::integrators::BptRenderer;
    use prysm::materials::Matte;
    use prysm::shapes::{Disk, Rectangle};

    fn settings(width: usize, height: usize, spp: u32) -> RenderSettings {
        let mut s = RenderSettings::new();
        s.set_int(keys::WIDTH, width as i64)
            .set_int(keys::HEIGHT, height as i64)
            .set_int(keys::SAMPLES_PER_PIXEL, spp as i64)
            .set_int(keys::SEED, 20_220_426)
            // No snapshot files from tests.
            .set_int(keys::MAX_SNAPSHOTS, 0);
        s
    }

    fn floor(albedo: Float) -> SceneObject {
        SceneObject {
            shape: Rectangle::new(
                Point3f::new(-10.0, 0.0, -10.0),
                Vector3f::new(0.0, 0.0, 20.0),
                Vector3f::new(20.0, 0.0, 0.0),
            )
            .into(),
            material: Matte::new(albedo).into(),
            emitter: None,
        }
    }

    fn disk_light(height: Float, radius: Float, radiance: Float) -> SceneObject {
        SceneObject {
            shape: Disk::new(
                Point3f::new(0.0, height, 0.0),
                Normal3f::new(0.0, -1.0, 0.0),
                radius,
            )
            .into(),
            material: Matte::new(0.0).into(),
            emitter: Some(AreaEmitter { radiance }),
        }
    }

    fn narrow_camera(position: Point3f, aspect: Float) -> Cameras {
        PerspectiveCamera::new(
            position,
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            10.0,
            aspect,
        )
        .into()
    }

    /// Disk emitter of radius r at height h over a Lambertian floor
    /// with albedo rho: the radiance leaving the point below the disk
    /// center is rho * L * r^2 / (r^2 + h^2), independent of the view
    /// direction. The combined estimator must converge to it.
    #[test]
    fn disk_light_over_floor_matches_analytic_radiance() {
        let (albedo, radiance, h, r) = (0.6, 5.0, 1.0, 0.5);
        let scene = Scene::new(vec![floor(albedo), disk_light(h, r, radiance)], None);
        let camera = narrow_camera(Point3f::new(2.5, 1.0, 2.5), 1.0);

        let spp = 400;
        let s = settings(16, 16, spp);
        let film = BptRenderer::new(spp)
            .render(&scene, &camera, &s)
            .unwrap();

        let expected = albedo * radiance * r * r / (r * r + h * h);
        let y = film.pixel_xyz(8, 8, 1.0 / spp as Float)[1];
        assert!(
            relative_eq!(y, expected, max_relative = 0.12),
            "luminance {} vs analytic {}",
            y,
            expected
        );
    }

    /// A uniform environment seen through an empty scene reproduces
    /// its radiance exactly: the implicit strategy is the only one and
    /// carries full weight.
    #[test]
    fn uniform_environment_reproduces_its_radiance() {
        let scene = Scene::new(Vec::new(), Some(0.8));
        let camera = narrow_camera(Point3f::new(0.0, 0.0, 3.0), 1.0);

        let spp = 64;
        let s = settings(8, 8, spp);
        let film = BptRenderer::new(spp)
            .render(&scene, &camera, &s)
            .unwrap();

        for y in 0..8 {
            for x in 0..8 {
                let lum = film.pixel_xyz(x, y, 1.0 / spp as Float)[1];
                assert!(
                    relative_eq!(lum, 0.8, max_relative = 0.08),
                    "pixel ({}, {}) luminance {}",
                    x,
                    y,
                    lum
                );
            }
        }
    }

    /// A large plate between the light and the floor leaves the floor
    /// black; no connection strategy may leak through the occluder.
    #[test]
    fn occluded_floor_stays_black() {
        let blocker = SceneObject {
            shape: Rectangle::new(
                Point3f::new(-2.0, 0.5, -2.0),
                Vector3f::new(0.0, 0.0, 4.0),
                Vector3f::new(4.0, 0.0, 0.0),
            )
            .into(),
            material: Matte::new(0.75).into(),
            emitter: None,
        };
        let scene = Scene::new(
            vec![floor(0.6), blocker, disk_light(1.0, 0.5, 5.0)],
            None,
        );
        // Below the blocker plane, looking at the floor center.
        let camera = narrow_camera(Point3f::new(3.5, 0.45, 3.5), 1.0);

        let spp = 64;
        let s = settings(8, 8, spp);
        let film = BptRenderer::new(spp)
            .render(&scene, &camera, &s)
            .unwrap();

        let y = film.pixel_xyz(4, 4, 1.0 / spp as Float)[1];
        assert!(y < 1.0e-3, "leaked luminance {}", y);
    }

    /// Same seed, same settings: bit-identical accumulation.
    #[test]
    fn fixed_seed_replays_identical_images() {
        let scene = Scene::new(vec![floor(0.6), disk_light(1.0, 0.5, 5.0)], None);
        let camera = narrow_camera(Point3f::new(2.5, 1.0, 2.5), 1.0);

        let spp = 8;
        let s = settings(8, 8, spp);
        let film_a = BptRenderer::new(spp).render(&scene, &camera, &s).unwrap();
        let film_b = BptRenderer::new(spp).render(&scene, &camera, &s).unwrap();

        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(
                    film_a.pixel_xyz(x, y, 1.0),
                    film_b.pixel_xyz(x, y, 1.0),
                    "pixel ({}, {})",
                    x,
                    y
                );
            }
        }
    }
}
