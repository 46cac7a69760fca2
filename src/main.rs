//! geomosaic - build a normalized height field and quad mesh from elevation tiles.
//!
//! Reads a single GeoTIFF (`--input`) or a tile list (`--tiles`), optionally
//! crops it to `--region`, and writes into `--output-dir`:
//!
//! - `extent.wkt`: outline of the processed extent
//! - `min.wkt` / `max.wkt`: centers of the lowest and highest pixels
//! - `normalized.tif`: heights mapped onto `[0, 1]`
//! - `mesh.obj`: flat quad grid sized in normalized height units

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use geomosaic::{
    AnyResult, DEFAULT_SUBDIVISIONS, Extent, PixelAnchor, Point2D, Raster, TiffRasterSink,
    TiffRasterSource, TileList, write_obj, write_wkt_file,
};

#[derive(Parser, Debug)]
#[command(name = "geomosaic")]
#[command(about = "Mosaic elevation tiles into a normalized height field and quad mesh")]
#[command(version)]
struct Cli {
    /// Single GeoTIFF to process
    #[arg(long, conflicts_with = "tiles", required_unless_present = "tiles")]
    input: Option<PathBuf>,

    /// Tile list file describing a mosaic grid
    #[arg(long)]
    tiles: Option<PathBuf>,

    /// Crop to a geographic region before processing
    #[arg(
        long,
        num_args = 4,
        value_names = ["MINX", "MINY", "MAXX", "MAXY"],
        allow_negative_numbers = true
    )]
    region: Option<Vec<f64>>,

    /// Print the height at a geographic position
    #[arg(long, num_args = 2, value_names = ["LON", "LAT"], allow_negative_numbers = true)]
    sample: Option<Vec<f64>>,

    /// Quads along each side of the mesh
    #[arg(long, default_value_t = DEFAULT_SUBDIVISIONS)]
    subdivisions: usize,

    /// Directory for the output files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> AnyResult<()> {
    let directive = if verbose { "geomosaic=debug" } else { "geomosaic=info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();
    Ok(())
}

fn run(cli: &Cli) -> AnyResult<()> {
    let source = TiffRasterSource::new();
    let raster = match (&cli.input, &cli.tiles) {
        (Some(input), _) => Raster::open(&source, input)?,
        (None, Some(tiles)) => {
            let list = TileList::from_file(tiles)?;
            info!(rows = list.rows(), columns = list.columns(), "Loaded tile list");
            Raster::mosaic(&source, &list)?
        }
        (None, None) => return Err("either --input or --tiles is required".into()),
    };

    let mut raster = match cli.region.as_deref() {
        Some(&[minx, miny, maxx, maxy]) => raster.sub_region(&Extent::from_bounds(minx, miny, maxx, maxy))?,
        Some(_) => return Err("--region takes four values".into()),
        None => raster,
    };

    std::fs::create_dir_all(&cli.output_dir)?;
    let out = |name: &str| cli.output_dir.join(name);

    write_wkt_file(&out("extent.wkt"), &[raster.extent()])?;

    let size = raster.extent().size_in_meters();
    info!(
        width = raster.width(),
        height = raster.height(),
        width_m = size.x,
        length_m = size.y,
        "Raster extent {}",
        raster.extent()
    );

    if let Some(&[lon, lat]) = cli.sample.as_deref() {
        let position = Point2D::lonlat(lon, lat);
        let height = raster.sample(position)?;
        println!("Height at ({lon}, {lat}) is {height}m");
    }

    let stats = raster.scan_min_max();
    let min_geo = raster.pixel_to_geo(stats.min_pixel, PixelAnchor::Center);
    let max_geo = raster.pixel_to_geo(stats.max_pixel, PixelAnchor::Center);
    write_wkt_file(&out("min.wkt"), &[&min_geo])?;
    write_wkt_file(&out("max.wkt"), &[&max_geo])?;
    println!("Minimum height is {}m, maximum is {}m", stats.min, stats.max);

    raster.normalize()?;
    raster.write(&TiffRasterSink::new(), &out("normalized.tif"))?;

    let meters_per_unit = stats.meters_per_unit();
    let mesh = raster.tessellate(cli.subdivisions, meters_per_unit)?;
    let (grid_width, grid_length) = mesh.size();
    println!("Grid size with height between 0.0 and 1.0 is [{grid_width}, {grid_length}]");
    write_obj(&out("mesh.obj"), &mesh)?;

    info!(
        output_dir = %cli.output_dir.display(),
        faces = mesh.faces().len(),
        "Pipeline finished"
    );
    Ok(())
}
