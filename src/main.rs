use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use fern::colors::{Color, ColoredLevelConfig};
use fern::Output;
use structopt::StructOpt;

use prysm::cameras::PerspectiveCamera;
use prysm::core::camera::Cameras;
use prysm::core::common::Float;
use prysm::core::geometry::{Normal3f, Point3f, Vector3f};
use prysm::core::scene::{AreaEmitter, Scene, SceneObject};
use prysm::core::settings::{keys, RenderSettings};
use prysm::integrators::BptRenderer;
use prysm::materials::{Glass, Matte, Mirror};
use prysm::shapes::{Disk, Rectangle};

#[derive(StructOpt, Debug)]
#[structopt(name = "prysm")]
struct Args {
    /// set LOG verbosity
    #[structopt(short, long)]
    verbose: bool,

    /// Specify the file that log output should be written to
    #[structopt(short, long)]
    logfile: Option<PathBuf>,

    /// Print all logging messages to stderr
    #[structopt(short = "e", long)]
    logtostderr: bool,

    /// Use specified number of threads for rendering
    #[structopt(short, long, default_value = "0")]
    nthreads: u8,

    /// Samples per pixel
    #[structopt(short, long, default_value = "64")]
    spp: u32,

    /// Image width in pixels
    #[structopt(long, default_value = "512")]
    width: usize,

    /// Image height in pixels
    #[structopt(long, default_value = "512")]
    height: usize,

    /// Seed for the top-level random stream
    #[structopt(long, default_value = "1509761209")]
    seed: u32,

    /// Linear brightness applied when developing snapshots
    #[structopt(short, long, default_value = "1.0")]
    brightness: Float,

    /// Directory that snapshot images are written to
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    outdir: PathBuf,
}

fn setup_logging(verbose: bool, logfile: PathBuf, stderr: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow);
    let clevel = colors.clone().info(Color::Green);

    let mut base_config = fern::Dispatch::new();

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    base_config = base_config.level(level);

    let file_config = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .chain(fern::log_file(logfile)?);

    let stderr_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{level}] {message}\x1B[0m",
                color_line =
                    format_args!("\x1B[{}m", colors.get_color(&record.level()).to_fg_str()),
                level = clevel.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        .chain(Output::call(|record| {
            writeln!(std::io::stderr(), "{}", record.args()).ok();
        }));

    base_config = base_config.chain(file_config);
    if stderr {
        base_config = base_config.chain(stderr_config);
    }
    base_config.apply()?;

    Ok(())
}

/// Closed box with a ceiling disk light, a leaning mirror panel and a
/// standing dispersive glass pane. Exercises every connection
/// strategy, including delta and wavelength-pinned paths.
fn build_demo_scene(aspect: Float) -> (Scene, Cameras) {
    let mut objects = Vec::new();

    // Floor, ceiling, back and side walls; normals face inward.
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(-1.0, -1.0, -1.0),
            Vector3f::new(0.0, 0.0, 2.0),
            Vector3f::new(2.0, 0.0, 0.0),
        )
        .into(),
        material: Matte::new(0.75).into(),
        emitter: None,
    });
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(-1.0, 1.0, -1.0),
            Vector3f::new(2.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.0, 2.0),
        )
        .into(),
        material: Matte::new(0.75).into(),
        emitter: None,
    });
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(-1.0, -1.0, -1.0),
            Vector3f::new(2.0, 0.0, 0.0),
            Vector3f::new(0.0, 2.0, 0.0),
        )
        .into(),
        material: Matte::new(0.75).into(),
        emitter: None,
    });
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(-1.0, -1.0, -1.0),
            Vector3f::new(0.0, 2.0, 0.0),
            Vector3f::new(0.0, 0.0, 2.0),
        )
        .into(),
        material: Matte::new(0.55).into(),
        emitter: None,
    });
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(1.0, -1.0, -1.0),
            Vector3f::new(0.0, 0.0, 2.0),
            Vector3f::new(0.0, 2.0, 0.0),
        )
        .into(),
        material: Matte::new(0.55).into(),
        emitter: None,
    });

    // Mirror panel leaning against the back wall.
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(0.2, -1.0, -0.95),
            Vector3f::new(0.7, 0.0, 0.0),
            Vector3f::new(0.0, 1.2, -0.04),
        )
        .into(),
        material: Mirror::new(0.92).into(),
        emitter: None,
    });

    // Thin dispersive pane in front of the camera path.
    objects.push(SceneObject {
        shape: Rectangle::new(
            Point3f::new(-0.8, -1.0, 0.1),
            Vector3f::new(0.9, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
        )
        .into(),
        material: Glass::new(0.98, 1.458, 0.00354).into(),
        emitter: None,
    });

    // Ceiling light.
    objects.push(SceneObject {
        shape: Disk::new(
            Point3f::new(0.0, 0.99, 0.0),
            Normal3f::new(0.0, -1.0, 0.0),
            0.35,
        )
        .into(),
        material: Matte::new(0.0).into(),
        emitter: Some(AreaEmitter { radiance: 20.0 }),
    });

    let scene = Scene::new(objects, None);
    let camera = PerspectiveCamera::new(
        Point3f::new(0.0, 0.0, 3.2),
        Point3f::new(0.0, 0.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        40.0,
        aspect,
    )
    .into();

    (scene, camera)
}

fn main() -> Result<()> {
    let args: Args = Args::from_args();

    let logfile = args
        .logfile
        .unwrap_or_else(|| PathBuf::from("prysm.log"));
    setup_logging(args.verbose, logfile, args.logtostderr)?;

    let mut settings = RenderSettings::new();
    settings
        .set_int(keys::WIDTH, args.width as i64)
        .set_int(keys::HEIGHT, args.height as i64)
        .set_int(keys::SAMPLES_PER_PIXEL, args.spp as i64)
        .set_int(keys::SEED, args.seed as i64)
        .set_int(keys::NUM_THREADS, args.nthreads as i64)
        .set_float(keys::BRIGHTNESS, args.brightness)
        .set_string(keys::OUTPUT_DIR, &args.outdir.to_string_lossy());

    let aspect = args.width as Float / args.height as Float;
    let (scene, camera) = build_demo_scene(aspect);

    let renderer = BptRenderer::new(settings.samples_per_pixel());
    renderer.render(&scene, &camera, &settings)?;

    Ok(())
}
