//! Spectral bidirectional path tracer.
//!
//! Every pixel sample builds one light subpath and one eye subpath,
//! then combines all pairwise connection strategies with the power
//! heuristic. Vertex densities are kept in area measure together with
//! the Russian roulette probability of the step that created each
//! vertex, so the heuristic can re-weigh a path as if any other
//! strategy had produced it.

use std::time::Instant;

use anyhow::Result;
use bumpalo::Bump;
use log::info;
use rayon::ThreadPoolBuilder;
use smallvec::SmallVec;

use crate::core::camera::{Camera, Cameras, ImportanceDistribution, LensPosQuery};
use crate::core::common::{CompensatedSum, Float};
use crate::core::ddf::{Ddf, DdfQuery, DirectionType, DirectionalDistribution};
use crate::core::film::{Film, FilmTile, SplatBuffer};
use crate::core::geometry::{Normal3f, Point2f, Ray, Vector3f};
use crate::core::interaction::SurfacePoint;
use crate::core::light::LightPosQuery;
use crate::core::rng::XorShiftRng;
use crate::core::scene::Scene;
use crate::core::settings::RenderSettings;
use crate::core::spectrum::{
    spectrum_to_xyz, SampledSpectrum, WavelengthSamples, SPECTRUM_SAMPLES, WAVELENGTH_PINNED,
};

const TILE_SIZE: usize = 32;

/// Subpaths rarely exceed a handful of vertices under Russian
/// roulette; keep them on the stack.
type VertexList<'a, 's> = SmallVec<[PathVertex<'a, 's>; 16]>;

/// Densities the multiple-importance weight needs from one subpath
/// vertex. Kept as a trait so the weight calculation stays a pure
/// function over plain numbers.
pub trait PathDensities {
    /// Area density with which the own subpath sampled this vertex.
    fn area_pdf(&self) -> Float;
    /// Russian roulette survival probability of the step that created
    /// this vertex.
    fn rr_prob(&self) -> Float;
    /// Area density of resampling this vertex from its successor.
    fn rev_area_pdf(&self) -> Float;
    fn rev_rr_prob(&self) -> Float;
    /// True when the ray into this vertex came from a delta event.
    fn is_delta_sampled(&self) -> bool;
}

/// One subpath vertex. Directions are stored in the vertex's shading
/// frame; `alpha` is the throughput up to and including this vertex.
struct PathVertex<'a, 's> {
    surf_pt: SurfacePoint<'s>,
    dir_in_local: Vector3f,
    g_normal_local: Normal3f,
    ddf: Ddf<'a>,
    alpha: SampledSpectrum,
    area_pdf: Float,
    rr_prob: Float,
    /// Filled in once the subpath samples its continuation from the
    /// next vertex; stays zero for the last two vertices, which the
    /// weight calculation never reads it for.
    rev_area_pdf: Float,
    rev_rr_prob: Float,
    sampled_type: DirectionType,
    wl_flags: u32,
}

impl<'a, 's> PathDensities for PathVertex<'a, 's> {
    fn area_pdf(&self) -> Float {
        self.area_pdf
    }

    fn rr_prob(&self) -> Float {
        self.rr_prob
    }

    fn rev_area_pdf(&self) -> Float {
        self.rev_area_pdf
    }

    fn rev_rr_prob(&self) -> Float {
        self.rev_rr_prob
    }

    fn is_delta_sampled(&self) -> bool {
        self.sampled_type.is_delta()
    }
}

/// Area densities of the two hypothetical one- and two-step subpath
/// extensions across a connection. They depend on the actual
/// connection geometry and cannot be stored on the vertices.
#[derive(Debug, Default, Copy, Clone)]
pub struct StrategyPdfs {
    pub l_extend_1st_area_pdf: Float,
    pub l_extend_1st_rr_prob: Float,
    pub l_extend_2nd_area_pdf: Float,
    pub l_extend_2nd_rr_prob: Float,
    pub e_extend_1st_area_pdf: Float,
    pub e_extend_1st_rr_prob: Float,
    pub e_extend_2nd_area_pdf: Float,
    pub e_extend_2nd_rr_prob: Float,
}

const MIN_EYE_VERTICES: usize = 1;
const MIN_LIGHT_VERTICES: usize = 0;

/// Selection probability of the connection's wavelength set. Once
/// either end of the pair went through a dispersive event only the
/// hero wavelength is valid, so the set counts as one channel out of
/// `SPECTRUM_SAMPLES`.
fn connection_wavelength_prob(light_end_flags: u32, eye_end_flags: u32) -> Float {
    if (light_end_flags | eye_end_flags) & WAVELENGTH_PINNED != 0 {
        1.0 / SPECTRUM_SAMPLES as Float
    } else {
        1.0
    }
}

/// Power heuristic weight for the strategy that produced `num_l_vtx`
/// light and `num_e_vtx` eye vertices.
///
/// Both directions walk the produced path from the connection point
/// outward, maintaining the running density ratio between the
/// alternative strategy and the actual one. A ratio is added to the
/// reciprocal sum only when neither the shortened vertex nor its
/// predecessor was delta sampled, since no strategy can resample
/// through a delta event. The lens is a delta position, so strategies
/// with zero eye vertices are never counted; a light subpath of zero
/// vertices (the implicit strategy) is.
pub fn calculate_mis_weight<V: PathDensities>(
    pdfs: &StrategyPdfs,
    light_vertices: &[V],
    eye_vertices: &[V],
    num_l_vtx: usize,
    num_e_vtx: usize,
) -> Float {
    let mut rec_mis_weight = CompensatedSum::new(1.0);

    // Shorten the eye subpath while extending the light subpath.
    if num_e_vtx > MIN_EYE_VERTICES {
        let end = &eye_vertices[num_e_vtx - 1];
        let mut pdf_ratio = pdfs.l_extend_1st_area_pdf * pdfs.l_extend_1st_rr_prob
            / (end.area_pdf() * end.rr_prob());
        let mut shorten_is_delta = end.is_delta_sampled();
        if !shorten_is_delta {
            rec_mis_weight.add(pdf_ratio * pdf_ratio);
        }
        let mut prev_is_delta = shorten_is_delta;

        if num_e_vtx - 1 > MIN_EYE_VERTICES {
            let v = &eye_vertices[num_e_vtx - 2];
            pdf_ratio *= pdfs.l_extend_2nd_area_pdf * pdfs.l_extend_2nd_rr_prob
                / (v.area_pdf() * v.rr_prob());
            shorten_is_delta = v.is_delta_sampled();
            if !shorten_is_delta && !prev_is_delta {
                rec_mis_weight.add(pdf_ratio * pdf_ratio);
            }
            prev_is_delta = shorten_is_delta;

            let mut t = num_e_vtx - 2;
            while t > MIN_EYE_VERTICES {
                let v = &eye_vertices[t - 1];
                pdf_ratio *= v.rev_area_pdf() * v.rev_rr_prob() / (v.area_pdf() * v.rr_prob());
                shorten_is_delta = v.is_delta_sampled();
                if !shorten_is_delta && !prev_is_delta {
                    rec_mis_weight.add(pdf_ratio * pdf_ratio);
                }
                prev_is_delta = shorten_is_delta;
                t -= 1;
            }
        }
    }

    // Shorten the light subpath while extending the eye subpath.
    if num_l_vtx > MIN_LIGHT_VERTICES {
        let end = &light_vertices[num_l_vtx - 1];
        let mut pdf_ratio = pdfs.e_extend_1st_area_pdf * pdfs.e_extend_1st_rr_prob
            / (end.area_pdf() * end.rr_prob());
        let mut shorten_is_delta = end.is_delta_sampled();
        if !shorten_is_delta {
            rec_mis_weight.add(pdf_ratio * pdf_ratio);
        }
        let mut prev_is_delta = shorten_is_delta;

        if num_l_vtx - 1 > MIN_LIGHT_VERTICES {
            let v = &light_vertices[num_l_vtx - 2];
            pdf_ratio *= pdfs.e_extend_2nd_area_pdf * pdfs.e_extend_2nd_rr_prob
                / (v.area_pdf() * v.rr_prob());
            shorten_is_delta = v.is_delta_sampled();
            if !shorten_is_delta && !prev_is_delta {
                rec_mis_weight.add(pdf_ratio * pdf_ratio);
            }
            prev_is_delta = shorten_is_delta;

            let mut s = num_l_vtx - 2;
            while s > MIN_LIGHT_VERTICES {
                let v = &light_vertices[s - 1];
                pdf_ratio *= v.rev_area_pdf() * v.rev_rr_prob() / (v.area_pdf() * v.rr_prob());
                shorten_is_delta = v.is_delta_sampled();
                if !shorten_is_delta && !prev_is_delta {
                    rec_mis_weight.add(pdf_ratio * pdf_ratio);
                }
                prev_is_delta = shorten_is_delta;
                s -= 1;
            }
        }
    }

    1.0 / rec_mis_weight.value()
}

/// Per-pixel-sample working state. Lives for one sample; all arena
/// allocations it references are freed when the caller resets the
/// arena.
struct PathSampler<'a, 'w, 's> {
    scene: &'s Scene,
    camera: &'s Cameras,
    wls: WavelengthSamples,
    wl_hint: usize,
    time: Float,
    pixel: (usize, usize),
    image_size: (usize, usize),
    light_vertices: VertexList<'a, 's>,
    eye_vertices: VertexList<'a, 's>,
    rng: &'w mut XorShiftRng,
    arena: &'a Bump,
    tile: &'w mut FilmTile,
    splat: &'w mut SplatBuffer,
}

impl<'a, 'w, 's> PathSampler<'a, 'w, 's> {
    fn sample_light_subpath(&mut self) {
        let (light, light_prob) = match self.scene.select_light(self.rng.uniform_float()) {
            Some(r) => r,
            None => return,
        };
        assert!(
            light_prob.is_finite(),
            "light selection probability: {}",
            light_prob
        );

        let query = LightPosQuery {
            time: self.time,
            wls: self.wls,
        };
        let u_pos = (self.rng.uniform_float(), self.rng.uniform_float());
        let (le0, pos_result) = light.sample(&query, u_pos);
        let edf = pos_result.surf_pt.create_edf(&self.wls, self.arena);
        let light_area_pdf = light_prob * pos_result.area_pdf;
        assert!(!light_area_pdf.is_nan(), "light area PDF is NaN");

        self.light_vertices.push(PathVertex {
            surf_pt: pos_result.surf_pt,
            dir_in_local: Vector3f::default(),
            g_normal_local: Normal3f::new(0.0, 0.0, 1.0),
            ddf: Ddf::Emission(edf),
            alpha: le0 / light_area_pdf,
            area_pdf: light_area_pdf,
            rr_prob: 1.0,
            rev_area_pdf: 0.0,
            rev_rr_prob: 0.0,
            sampled_type: pos_result.pos_type,
            wl_flags: 0,
        });

        let edf_query = DdfQuery {
            hero: self.wl_hint,
            adjoint: true,
            ..DdfQuery::default()
        };
        let u_dir = (
            self.rng.uniform_float(),
            self.rng.uniform_float(),
            self.rng.uniform_float(),
        );
        let le_sample = edf.sample(&edf_query, u_dir);
        if le_sample.dir_pdf == 0.0 {
            return;
        }

        let vertex0 = self.light_vertices.last().unwrap();
        let origin = vertex0.surf_pt.p + vertex0.surf_pt.g_normal.as_vec() * Ray::EPSILON;
        let dir = vertex0.surf_pt.shading_frame.from_local(&le_sample.dir_local);
        let alpha =
            vertex0.alpha * le_sample.value * (le_sample.dir_local.z / le_sample.dir_pdf);

        self.generate_subpath(
            alpha,
            Ray::new(&origin, &dir, crate::core::common::INFINITY, self.time),
            le_sample.dir_pdf,
            le_sample.dir_type,
            le_sample.dir_local.z,
            true,
        );
    }

    fn sample_eye_subpath(&mut self, p_film: Point2f, wl_pdf: Float) {
        let query = LensPosQuery {
            time: self.time,
            wls: self.wls,
        };
        let u_lens = (self.rng.uniform_float(), self.rng.uniform_float());
        let (we0, lens_result) = self.camera.sample(&query, u_lens);
        let idf = self
            .camera
            .create_idf(&lens_result.surf_pt, &self.wls, self.arena);

        self.eye_vertices.push(PathVertex {
            surf_pt: lens_result.surf_pt,
            dir_in_local: Vector3f::default(),
            g_normal_local: Normal3f::new(0.0, 0.0, 1.0),
            ddf: Ddf::Importance(idf),
            alpha: we0 / (lens_result.area_pdf * wl_pdf),
            area_pdf: lens_result.area_pdf,
            rr_prob: 1.0,
            rev_area_pdf: 0.0,
            rev_rr_prob: 0.0,
            sampled_type: lens_result.pos_type,
            wl_flags: 0,
        });

        let we_sample = idf.sample_pixel(&p_film);
        if we_sample.dir_pdf == 0.0 {
            return;
        }

        let vertex0 = self.eye_vertices.last().unwrap();
        let dir = vertex0.surf_pt.shading_frame.from_local(&we_sample.dir_local);
        let alpha =
            vertex0.alpha * we_sample.value * (we_sample.dir_local.z / we_sample.dir_pdf);

        self.generate_subpath(
            alpha,
            Ray::new(
                &vertex0.surf_pt.p,
                &dir,
                crate::core::common::INFINITY,
                self.time,
            ),
            we_sample.dir_pdf,
            we_sample.dir_type,
            we_sample.dir_local.z,
            false,
        );
    }

    /// Extends one subpath by repeated scattering with Russian
    /// roulette. Each new vertex also backfills the reverse densities
    /// of its grandparent, and emitting hits on the eye side deposit
    /// the zero-light-vertex strategy directly.
    fn generate_subpath(
        &mut self,
        init_alpha: SampledSpectrum,
        init_ray: Ray,
        init_dir_pdf: Float,
        init_sampled_type: DirectionType,
        init_cos_last: Float,
        adjoint: bool,
    ) {
        let mut vertices = if adjoint {
            std::mem::take(&mut self.light_vertices)
        } else {
            std::mem::take(&mut self.eye_vertices)
        };

        let mut wls = self.wls;
        let mut ray = init_ray;
        let mut alpha = init_alpha;
        let mut dir_pdf = init_dir_pdf;
        let mut sampled_type = init_sampled_type;
        let mut cos_last = init_cos_last;
        let mut rr_prob = 1.0;

        while let Some(isect) = self.scene.intersect(&ray) {
            let surf_pt = isect.surf_pt;
            let dist2 = isect.dist * isect.dist;
            let dir_out_local = surf_pt.shading_frame.to_local(&-ray.d);
            let g_normal_local =
                Normal3f::from(surf_pt.shading_frame.to_local(&surf_pt.g_normal.as_vec()));
            let bsdf = surf_pt.create_bsdf(&wls, self.arena);

            let cos_out = dir_out_local.dot(&g_normal_local.as_vec()).abs();
            let area_pdf = dir_pdf * cos_out / dist2;
            let at_infinity = surf_pt.at_infinity;
            vertices.push(PathVertex {
                surf_pt,
                dir_in_local: dir_out_local,
                g_normal_local,
                ddf: Ddf::Scatter(bsdf),
                alpha,
                area_pdf,
                rr_prob,
                rev_area_pdf: 0.0,
                rev_rr_prob: 0.0,
                sampled_type,
                wl_flags: wls.flags,
            });

            // Zero-light-vertex strategy: the subpath itself reached
            // an emitter.
            if !adjoint && vertices.last().unwrap().surf_pt.is_emitting() {
                let end = vertices.last().unwrap();
                let edf = end.surf_pt.create_edf(&wls, self.arena);
                let le0 = end.surf_pt.emittance(&wls);
                let edf_query = DdfQuery {
                    hero: self.wl_hint,
                    ..DdfQuery::default()
                };
                let (le1, _) = edf.evaluate(&edf_query, &dir_out_local);

                let light_prob = self.scene.evaluate_prob(&end.surf_pt);
                let (edf_pdf, _) = edf.evaluate_pdf(&edf_query, &dir_out_local);
                let pdfs = StrategyPdfs {
                    l_extend_1st_area_pdf: light_prob * end.surf_pt.evaluate_area_pdf(),
                    l_extend_1st_rr_prob: 1.0,
                    l_extend_2nd_area_pdf: edf_pdf * cos_last / dist2,
                    l_extend_2nd_rr_prob: 1.0,
                    ..StrategyPdfs::default()
                };

                let mis_weight = calculate_mis_weight(
                    &pdfs,
                    &self.light_vertices[..],
                    &vertices[..],
                    0,
                    vertices.len(),
                );
                if mis_weight.is_finite() {
                    let mut contribution = le0 * le1 * alpha * mis_weight;
                    if wls.flags & WAVELENGTH_PINNED != 0 {
                        contribution *= SPECTRUM_SAMPLES as Float;
                    }
                    let xyz = spectrum_to_xyz(&wls, &contribution);
                    self.tile.add_sample(self.pixel.0, self.pixel.1, xyz);
                }
            }

            // The environment sphere only terminates paths; it is
            // never an interior vertex.
            if at_infinity {
                vertices.pop();
                break;
            }

            let fs_query = DdfQuery {
                dir_in_local: dir_out_local,
                g_normal_local,
                hero: self.wl_hint,
                adjoint,
            };
            let u = (
                self.rng.uniform_float(),
                self.rng.uniform_float(),
                self.rng.uniform_float(),
            );
            let fs_sample = bsdf.sample(&fs_query, u);
            if fs_sample.value.is_zero() || fs_sample.dir_pdf == 0.0 {
                break;
            }
            if fs_sample.dir_type.is_dispersive() {
                wls.flags |= WAVELENGTH_PINNED;
            }
            let cos_in = fs_sample.dir_local.dot(&g_normal_local.as_vec()).abs();
            let mut weight = fs_sample.value * (cos_in / fs_sample.dir_pdf);

            rr_prob = weight[self.wl_hint].min(1.0);
            if self.rng.uniform_float() < rr_prob {
                weight /= rr_prob;
            } else {
                break;
            }

            alpha *= weight;
            debug_assert!(
                !weight.has_nans() && !weight.has_infs(),
                "scattering weight: {:?}, cos: {}, dirPDF: {}",
                weight,
                cos_in,
                fs_sample.dir_pdf
            );

            let dir_in = surf_pt.shading_frame.from_local(&fs_sample.dir_local);
            ray = Ray::new(
                &(surf_pt.p + dir_in * Ray::EPSILON),
                &dir_in,
                crate::core::common::INFINITY,
                ray.time,
            );

            assert!(vertices.len() >= 2);
            let next_to_last_idx = vertices.len() - 2;
            let next_to_last = &mut vertices[next_to_last_idx];
            next_to_last.rev_area_pdf = fs_sample.reverse_pdf * cos_last / dist2;
            next_to_last.rev_rr_prob = (fs_sample.reverse_value[self.wl_hint] * cos_out
                / fs_sample.reverse_pdf)
                .min(1.0);

            cos_last = cos_in;
            dir_pdf = fs_sample.dir_pdf;
            sampled_type = fs_sample.dir_type;
        }

        if adjoint {
            self.light_vertices = vertices;
        } else {
            self.eye_vertices = vertices;
        }
    }

    /// All connection strategies with at least one vertex on each
    /// side. One-eye-vertex connections reproject through the lens and
    /// splat into the worker's private buffer.
    fn connect(&mut self) {
        let light_vertices = std::mem::take(&mut self.light_vertices);
        let eye_vertices = std::mem::take(&mut self.eye_vertices);

        for t in 1..=eye_vertices.len() {
            let e_vtx = &eye_vertices[t - 1];
            for s in 1..=light_vertices.len() {
                let l_vtx = &light_vertices[s - 1];

                if !self
                    .scene
                    .test_visibility(&e_vtx.surf_pt, &l_vtx.surf_pt, self.time)
                {
                    continue;
                }

                let mut connection = e_vtx.surf_pt.p - l_vtx.surf_pt.p;
                let dist2 = connection.length_squared();
                connection /= dist2.sqrt();

                let c_vec_l = l_vtx.surf_pt.shading_frame.to_local(&connection);
                let query_light_end = DdfQuery {
                    dir_in_local: l_vtx.dir_in_local,
                    g_normal_local: l_vtx.g_normal_local,
                    hero: self.wl_hint,
                    adjoint: true,
                };
                let (ddf_l, rev_ddf_l) = l_vtx.ddf.evaluate(&query_light_end, &c_vec_l);
                let (l_extend_1st_dir_pdf, e_extend_2nd_dir_pdf) =
                    l_vtx.ddf.evaluate_pdf(&query_light_end, &c_vec_l);
                let cos_light_end = connection.abs_dot(&l_vtx.surf_pt.g_normal.as_vec());

                let c_vec_e = e_vtx.surf_pt.shading_frame.to_local(&-connection);
                let query_eye_end = DdfQuery {
                    dir_in_local: e_vtx.dir_in_local,
                    g_normal_local: e_vtx.g_normal_local,
                    hero: self.wl_hint,
                    adjoint: false,
                };
                let (ddf_e, rev_ddf_e) = e_vtx.ddf.evaluate(&query_eye_end, &c_vec_e);
                let (e_extend_1st_dir_pdf, l_extend_2nd_dir_pdf) =
                    e_vtx.ddf.evaluate_pdf(&query_eye_end, &c_vec_e);
                let cos_eye_end = connection.abs_dot(&e_vtx.surf_pt.g_normal.as_vec());

                let g = cos_eye_end * cos_light_end / dist2;
                let wl_prob = connection_wavelength_prob(l_vtx.wl_flags, e_vtx.wl_flags);
                let connection_term = ddf_l * (g / wl_prob) * ddf_e;
                if connection_term.is_zero() {
                    continue;
                }

                let mut pdfs = StrategyPdfs {
                    l_extend_1st_area_pdf: l_extend_1st_dir_pdf * cos_eye_end / dist2,
                    l_extend_1st_rr_prob: if s > 1 {
                        (ddf_l[self.wl_hint] * cos_light_end / l_extend_1st_dir_pdf).min(1.0)
                    } else {
                        1.0
                    },
                    e_extend_1st_area_pdf: e_extend_1st_dir_pdf * cos_light_end / dist2,
                    e_extend_1st_rr_prob: if t > 1 {
                        (ddf_e[self.wl_hint] * cos_eye_end / e_extend_1st_dir_pdf).min(1.0)
                    } else {
                        1.0
                    },
                    ..StrategyPdfs::default()
                };
                if t > 1 {
                    let prev = &eye_vertices[t - 2];
                    let mut dir_2nd = e_vtx.surf_pt.p - prev.surf_pt.p;
                    let d2 = dir_2nd.length_squared();
                    dir_2nd /= d2.sqrt();
                    pdfs.l_extend_2nd_area_pdf = l_extend_2nd_dir_pdf
                        * prev.surf_pt.g_normal.as_vec().dot(&dir_2nd).abs()
                        / d2;
                    pdfs.l_extend_2nd_rr_prob = (rev_ddf_e[self.wl_hint]
                        * e_vtx.g_normal_local.as_vec().dot(&e_vtx.dir_in_local).abs()
                        / l_extend_2nd_dir_pdf)
                        .min(1.0);
                }
                if s > 1 {
                    let prev = &light_vertices[s - 2];
                    let mut dir_2nd = l_vtx.surf_pt.p - prev.surf_pt.p;
                    let d2 = dir_2nd.length_squared();
                    dir_2nd /= d2.sqrt();
                    pdfs.e_extend_2nd_area_pdf = e_extend_2nd_dir_pdf
                        * prev.surf_pt.g_normal.as_vec().dot(&dir_2nd).abs()
                        / d2;
                    pdfs.e_extend_2nd_rr_prob = (rev_ddf_l[self.wl_hint]
                        * l_vtx.g_normal_local.as_vec().dot(&l_vtx.dir_in_local).abs()
                        / e_extend_2nd_dir_pdf)
                        .min(1.0);
                }

                let mis_weight =
                    calculate_mis_weight(&pdfs, &light_vertices[..], &eye_vertices[..], s, t);
                if !mis_weight.is_finite() {
                    continue;
                }

                let contribution = l_vtx.alpha * connection_term * e_vtx.alpha * mis_weight;
                let xyz = spectrum_to_xyz(&self.wls, &contribution);
                if t > 1 {
                    self.tile.add_sample(self.pixel.0, self.pixel.1, xyz);
                } else {
                    let idf = e_vtx.ddf.as_importance().unwrap();
                    if let Some((hit_px, hit_py)) = idf.calculate_pixel(&c_vec_e) {
                        let (w, h) = self.image_size;
                        let x = ((hit_px * w as Float) as usize).min(w - 1);
                        let y = ((hit_py * h as Float) as usize).min(h - 1);
                        self.splat.add_splat(x, y, xyz);
                    }
                }
            }
        }
    }
}

struct Worker {
    rng: XorShiftRng,
    arena: Bump,
    splat: SplatBuffer,
}

/// Tile-parallel renderer. Tiles are assigned to workers round-robin
/// up front, so a fixed (seed, thread count) pair replays the exact
/// sample stream of every pixel.
pub struct BptRenderer {
    samples_per_pixel: u32,
}

impl BptRenderer {
    pub fn new(samples_per_pixel: u32) -> Self {
        assert!(samples_per_pixel > 0);
        Self { samples_per_pixel }
    }

    pub fn render(
        &self,
        scene: &Scene,
        camera: &Cameras,
        settings: &RenderSettings,
    ) -> Result<Film> {
        let width = settings.width();
        let height = settings.height();
        let num_workers = settings.num_threads();
        let film = Film::new(width, height);

        let mut top_rng = XorShiftRng::new(settings.seed());
        let mut workers: Vec<Worker> = (0..num_workers)
            .map(|_| Worker {
                rng: XorShiftRng::new(top_rng.uniform_u32()),
                arena: Bump::new(),
                splat: SplatBuffer::new(width, height),
            })
            .collect();

        let mut tiles = Vec::new();
        for y0 in (0..height).step_by(TILE_SIZE) {
            for x0 in (0..width).step_by(TILE_SIZE) {
                tiles.push((
                    x0,
                    y0,
                    TILE_SIZE.min(width - x0),
                    TILE_SIZE.min(height - y0),
                ));
            }
        }

        let pool = ThreadPoolBuilder::new().num_threads(num_workers).build()?;
        let time_range = (settings.time_start(), settings.time_end());
        let brightness = settings.brightness();
        let output_dir = std::path::PathBuf::from(settings.output_dir());

        info!(
            "rendering {}x{} at {} spp on {} workers",
            width, height, self.samples_per_pixel, num_workers
        );
        let start = Instant::now();

        let mut export_pass = 1u32;
        let mut img_idx = 0u32;
        for sample in 0..self.samples_per_pixel {
            let film_ref = &film;
            let tiles_ref = &tiles;
            pool.scope(|scope| {
                for (worker_id, worker) in workers.iter_mut().enumerate() {
                    scope.spawn(move |_| {
                        for &(x0, y0, tw, th) in tiles_ref
                            .iter()
                            .skip(worker_id)
                            .step_by(num_workers)
                        {
                            let mut tile = FilmTile::new(x0, y0, tw, th);
                            for y in y0..y0 + th {
                                for x in x0..x0 + tw {
                                    render_pixel(
                                        scene,
                                        camera,
                                        (x, y),
                                        (width, height),
                                        time_range,
                                        &mut worker.rng,
                                        &worker.arena,
                                        &mut tile,
                                        &mut worker.splat,
                                    );
                                    worker.arena.reset();
                                }
                            }
                            film_ref.merge_tile(&tile);
                        }
                    });
                }
            });

            // Light-image buffers merge on this thread, in worker
            // order, once per round.
            for worker in workers.iter_mut() {
                film.merge_splats(&worker.splat);
                worker.splat.clear();
            }

            if settings.max_snapshots() > 0 && sample + 1 == export_pass {
                let filename = output_dir.join(format!("{:03}.png", img_idx));
                film.write_image(brightness / (sample + 1) as Float, &filename)?;
                info!("{} samples: {}", export_pass, filename.display());
                img_idx += 1;
                if img_idx == settings.max_snapshots() {
                    break;
                }
                export_pass += export_pass;
            }
        }

        info!("rendered in {:.3} s", start.elapsed().as_secs_f64());
        Ok(film)
    }
}

#[allow(clippy::too_many_arguments)]
fn render_pixel<'s>(
    scene: &'s Scene,
    camera: &'s Cameras,
    pixel: (usize, usize),
    image_size: (usize, usize),
    time_range: (Float, Float),
    rng: &mut XorShiftRng,
    arena: &Bump,
    tile: &mut FilmTile,
    splat: &mut SplatBuffer,
) {
    let time = time_range.0 + rng.uniform_float() * (time_range.1 - time_range.0);
    let px = pixel.0 as Float + rng.uniform_float();
    let py = pixel.1 as Float + rng.uniform_float();

    let (wls, wl_pdf) =
        WavelengthSamples::new_with_equal_offsets(rng.uniform_float(), rng.uniform_float());
    let wl_hint = wls.hero;

    let mut sampler = PathSampler {
        scene,
        camera,
        wls,
        wl_hint,
        time,
        pixel,
        image_size,
        light_vertices: VertexList::new(),
        eye_vertices: VertexList::new(),
        rng,
        arena,
        tile,
        splat,
    };

    sampler.sample_light_subpath();
    sampler.sample_eye_subpath(
        Point2f::new(px / image_size.0 as Float, py / image_size.1 as Float),
        wl_pdf,
    );
    sampler.connect();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestVertex {
        area_pdf: Float,
        rr_prob: Float,
        rev_area_pdf: Float,
        rev_rr_prob: Float,
        delta: bool,
    }

    impl TestVertex {
        fn new(area_pdf: Float, rev_area_pdf: Float) -> Self {
            Self {
                area_pdf,
                rr_prob: 1.0,
                rev_area_pdf,
                rev_rr_prob: 1.0,
                delta: false,
            }
        }
    }

    impl PathDensities for TestVertex {
        fn area_pdf(&self) -> Float {
            self.area_pdf
        }
        fn rr_prob(&self) -> Float {
            self.rr_prob
        }
        fn rev_area_pdf(&self) -> Float {
            self.rev_area_pdf
        }
        fn rev_rr_prob(&self) -> Float {
            self.rev_rr_prob
        }
        fn is_delta_sampled(&self) -> bool {
            self.delta
        }
    }

    #[test]
    fn weight_is_bounded() {
        let light = vec![TestVertex::new(0.7, 0.4)];
        let eye = vec![TestVertex::new(1.0, 0.0), TestVertex::new(0.3, 0.8)];
        let pdfs = StrategyPdfs {
            l_extend_1st_area_pdf: 0.5,
            l_extend_1st_rr_prob: 1.0,
            l_extend_2nd_area_pdf: 0.2,
            l_extend_2nd_rr_prob: 1.0,
            e_extend_1st_area_pdf: 0.9,
            e_extend_1st_rr_prob: 1.0,
            e_extend_2nd_area_pdf: 0.1,
            e_extend_2nd_rr_prob: 1.0,
        };

        let w = calculate_mis_weight(&pdfs, &light, &eye, 1, 2);
        assert!(w > 0.0 && w <= 1.0);
    }

    #[test]
    fn delta_sampled_end_gets_full_weight() {
        // A vertex reached through a delta event cannot be produced by
        // any shortened strategy, so the own strategy keeps weight 1.
        let light = vec![TestVertex::new(0.7, 0.0)];
        let mut eye = vec![TestVertex::new(1.0, 0.0), TestVertex::new(0.3, 0.0)];
        eye[1].delta = true;
        let pdfs = StrategyPdfs {
            l_extend_1st_area_pdf: 2.0,
            l_extend_1st_rr_prob: 1.0,
            // Light end also unreachable by extension.
            e_extend_1st_area_pdf: 0.0,
            e_extend_1st_rr_prob: 1.0,
            ..StrategyPdfs::default()
        };

        let w = calculate_mis_weight(&pdfs, &light, &eye, 1, 2);
        assert!((w - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn strategy_weights_form_partition_of_unity() {
        // Fixed path lens -> middle -> light, producible by exactly
        // three strategies: the implicit hit (0,3), a one-one
        // connection (1,2), and light tracing (2,1). Densities:
        //   l0: light position (area), e0: lens position,
        //   a: lens->middle extension, b: light->middle extension,
        //   c: middle->light extension.
        // The power heuristic weights of all three must sum to one.
        let (l0, e0, a, b, c) = (0.25, 1.0, 0.6, 0.9, 1.7);

        // (s=1, t=2)
        let light_1 = vec![TestVertex::new(l0, 0.0)];
        let eye_2 = vec![TestVertex::new(e0, 0.0), TestVertex::new(a, 0.0)];
        let pdfs_12 = StrategyPdfs {
            l_extend_1st_area_pdf: b,
            l_extend_1st_rr_prob: 1.0,
            e_extend_1st_area_pdf: c,
            e_extend_1st_rr_prob: 1.0,
            ..StrategyPdfs::default()
        };
        let w_12 = calculate_mis_weight(&pdfs_12, &light_1, &eye_2, 1, 2);

        // (s=2, t=1)
        let light_2 = vec![TestVertex::new(l0, 0.0), TestVertex::new(b, 0.0)];
        let eye_1 = vec![TestVertex::new(e0, 0.0)];
        let pdfs_21 = StrategyPdfs {
            e_extend_1st_area_pdf: a,
            e_extend_1st_rr_prob: 1.0,
            e_extend_2nd_area_pdf: c,
            e_extend_2nd_rr_prob: 1.0,
            ..StrategyPdfs::default()
        };
        let w_21 = calculate_mis_weight(&pdfs_21, &light_2, &eye_1, 2, 1);

        // (s=0, t=3) implicit
        let light_0: Vec<TestVertex> = Vec::new();
        let eye_3 = vec![
            TestVertex::new(e0, 0.0),
            TestVertex::new(a, 0.0),
            TestVertex::new(c, 0.0),
        ];
        let pdfs_03 = StrategyPdfs {
            l_extend_1st_area_pdf: l0,
            l_extend_1st_rr_prob: 1.0,
            l_extend_2nd_area_pdf: b,
            l_extend_2nd_rr_prob: 1.0,
            ..StrategyPdfs::default()
        };
        let w_03 = calculate_mis_weight(&pdfs_03, &light_0, &eye_3, 0, 3);

        assert!(w_12 > 0.0 && w_21 > 0.0 && w_03 > 0.0);
        let sum = w_12 + w_21 + w_03;
        assert!((sum - 1.0).abs() < 1.0e-5, "weights sum to {}", sum);
    }

    #[test]
    fn partition_holds_with_roulette_probabilities() {
        // Same three-strategy path as above, but every scattering step
        // carries a survival probability. The roulette probability of a
        // step multiplies its density wherever that step appears, so
        // the weights must still sum to one.
        let (l0, e0, a, b, c) = (0.25, 1.0, 0.6, 0.9, 1.7);
        let (ra, rb, rc) = (0.8, 0.5, 0.65);

        let with_rr = |area_pdf: Float, rr: Float| TestVertex {
            area_pdf,
            rr_prob: rr,
            rev_area_pdf: 0.0,
            rev_rr_prob: 1.0,
            delta: false,
        };

        // (s=1, t=2)
        let light_1 = vec![TestVertex::new(l0, 0.0)];
        let eye_2 = vec![TestVertex::new(e0, 0.0), with_rr(a, ra)];
        let pdfs_12 = StrategyPdfs {
            l_extend_1st_area_pdf: b,
            l_extend_1st_rr_prob: rb,
            e_extend_1st_area_pdf: c,
            e_extend_1st_rr_prob: rc,
            ..StrategyPdfs::default()
        };
        let w_12 = calculate_mis_weight(&pdfs_12, &light_1, &eye_2, 1, 2);

        // (s=2, t=1)
        let light_2 = vec![TestVertex::new(l0, 0.0), with_rr(b, rb)];
        let eye_1 = vec![TestVertex::new(e0, 0.0)];
        let pdfs_21 = StrategyPdfs {
            e_extend_1st_area_pdf: a,
            e_extend_1st_rr_prob: ra,
            e_extend_2nd_area_pdf: c,
            e_extend_2nd_rr_prob: rc,
            ..StrategyPdfs::default()
        };
        let w_21 = calculate_mis_weight(&pdfs_21, &light_2, &eye_1, 2, 1);

        // (s=0, t=3)
        let light_0: Vec<TestVertex> = Vec::new();
        let eye_3 = vec![TestVertex::new(e0, 0.0), with_rr(a, ra), with_rr(c, rc)];
        let pdfs_03 = StrategyPdfs {
            l_extend_1st_area_pdf: l0,
            l_extend_1st_rr_prob: 1.0,
            l_extend_2nd_area_pdf: b,
            l_extend_2nd_rr_prob: rb,
            ..StrategyPdfs::default()
        };
        let w_03 = calculate_mis_weight(&pdfs_03, &light_0, &eye_3, 0, 3);

        let sum = w_12 + w_21 + w_03;
        assert!((sum - 1.0).abs() < 1.0e-5, "weights sum to {}", sum);
    }

    #[test]
    fn pinned_connections_scale_by_channel_count() {
        let n = SPECTRUM_SAMPLES as Float;
        assert_eq!(connection_wavelength_prob(0, 0), 1.0);
        assert_eq!(connection_wavelength_prob(WAVELENGTH_PINNED, 0), 1.0 / n);
        assert_eq!(connection_wavelength_prob(0, WAVELENGTH_PINNED), 1.0 / n);
        assert_eq!(
            connection_wavelength_prob(WAVELENGTH_PINNED, WAVELENGTH_PINNED),
            1.0 / n
        );
    }
}
