//! GeoTIFF source and sink built on the `tiff` crate.
//!
//! Only single-band (grayscale) images are read; every sample type is
//! converted to `f32`. Geo-referencing comes from the model transformation
//! tag when present, otherwise from the pixel scale and tiepoint pair.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use tiff::TiffError;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray32Float;
use tiff::tags::Tag;
use tracing::debug;

use crate::affine::AffineTransform;
use crate::error::{OpenError, WriteError};
use crate::source::{DecodedRaster, RasterSink, RasterSource};

// GeoTIFF tag IDs
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;

// GeoKey values
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const EPSG_WGS84: u16 = 4326;

/// Reads GeoTIFF files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffRasterSource;

impl TiffRasterSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RasterSource for TiffRasterSource {
    fn open(&self, path: &Path) -> Result<DecodedRaster, OpenError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OpenError::NotFound(path.to_path_buf()),
            _ => OpenError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let tiff_err = |e: TiffError| open_error(path, e);
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(tiff_err)?
            .with_limits(Limits::unlimited());

        let color_type = decoder.colortype().map_err(tiff_err)?;
        if !matches!(color_type, tiff::ColorType::Gray(_)) {
            return Err(OpenError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("only single-band grayscale is supported, found {color_type:?}"),
            });
        }

        let (width, height) = decoder.dimensions().map_err(tiff_err)?;
        let (width, height) = (width as usize, height as usize);
        let affine = read_affine(&mut decoder).ok_or_else(|| OpenError::CorruptHeader {
            path: path.to_path_buf(),
            reason: "missing model transformation or pixel scale/tiepoint tags".to_string(),
        })?;

        let pixels = convert_decoding_result(decoder.read_image().map_err(tiff_err)?);
        if pixels.len() != width * height {
            return Err(OpenError::CorruptHeader {
                path: path.to_path_buf(),
                reason: format!(
                    "decoded {} samples for a {width}x{height} image",
                    pixels.len()
                ),
            });
        }

        debug!(path = %path.display(), width, height, ?affine, "Decoded GeoTIFF");
        Ok(DecodedRaster::new(pixels, width, height, affine))
    }
}

fn open_error(path: &Path, err: TiffError) -> OpenError {
    let path = path.to_path_buf();
    match err {
        TiffError::UnsupportedError(e) => OpenError::UnsupportedFormat {
            path,
            reason: e.to_string(),
        },
        TiffError::IoError(source) => OpenError::Io { path, source },
        other => OpenError::CorruptHeader {
            path,
            reason: other.to_string(),
        },
    }
}

/// Native affine from the GeoTIFF model tags, in GDAL coefficient order.
fn read_affine<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Option<[f64; 6]> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION))
        && m.len() >= 8
    {
        return Some([m[3], m[0], m[1], m[7], m[4], m[5]]);
    }

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
        .ok()
        .filter(|v| v.len() >= 2)?;
    let tie = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
        .ok()
        .filter(|v| v.len() >= 6)?;

    let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
    let (sx, sy) = (scale[0], scale[1]);
    Some([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])
}

fn convert_decoding_result(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
    }
}

/// Writes single-band `f32` GeoTIFFs in geographic WGS84 coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffRasterSink;

impl TiffRasterSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn encode<W: Write + Seek>(writer: W, raster: &DecodedRaster) -> Result<(), TiffError> {
        let mut encoder = TiffEncoder::new(writer)?;
        let mut image = encoder.new_image::<Gray32Float>(raster.width as u32, raster.height as u32)?;
        write_geotiff_tags(image.encoder(), &raster.affine)?;
        image.write_data(&raster.pixels)?;
        Ok(())
    }
}

impl RasterSink for TiffRasterSink {
    fn write(&self, path: &Path, raster: &DecodedRaster) -> Result<(), WriteError> {
        if raster.width == 0 || raster.height == 0 || raster.pixels.len() != raster.width * raster.height {
            return Err(WriteError::Encode {
                path: path.to_path_buf(),
                reason: format!(
                    "{} samples do not fill a {}x{} image",
                    raster.pixels.len(),
                    raster.width,
                    raster.height
                ),
            });
        }

        let file = File::create(path).map_err(|e| WriteError::from_io(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        Self::encode(&mut writer, raster).map_err(|e| match e {
            TiffError::IoError(io) => WriteError::from_io(path.to_path_buf(), io),
            other => WriteError::Encode {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
        writer
            .flush()
            .map_err(|e| WriteError::from_io(path.to_path_buf(), e))?;

        debug!(path = %path.display(), width = raster.width, height = raster.height, "Wrote GeoTIFF");
        Ok(())
    }
}

fn write_geotiff_tags<W: Write + Seek, K: tiff::encoder::TiffKind>(
    dir: &mut tiff::encoder::DirectoryEncoder<W, K>,
    affine: &[f64; 6],
) -> Result<(), TiffError> {
    let [c0, c1, c2, c3, c4, c5] = *affine;

    if AffineTransform::new(*affine).is_axis_aligned() && c5 < 0.0 {
        // ModelPixelScale: [ScaleX, ScaleY, ScaleZ]
        let pixel_scale = [c1, -c5, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        // ModelTiepoint: pixel (0, 0) to the native origin
        let tiepoint = [0.0, 0.0, 0.0, c0, c3, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        let transformation = [
            c1, c2, 0.0, c0, //
            c4, c5, 0.0, c3, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TRANSFORMATION), transformation.as_slice())?;
    }

    // [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
    //  KeyID, TIFFTagLocation, Count, Value, ...]
    let geokeys: [u16; 16] = [
        1,
        1,
        0,
        3,
        GT_MODEL_TYPE_GEO_KEY,
        0,
        1,
        MODEL_TYPE_GEOGRAPHIC,
        GT_RASTER_TYPE_GEO_KEY,
        0,
        1,
        RASTER_PIXEL_IS_AREA,
        GEOGRAPHIC_TYPE_GEO_KEY,
        0,
        1,
        EPSG_WGS84,
    ];
    dir.write_tag(Tag::Unknown(TAG_GEO_KEY_DIRECTORY), geokeys.as_slice())?;
    Ok(())
}
