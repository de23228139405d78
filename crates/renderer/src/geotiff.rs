//! Single-band GeoTIFF encoding for averaged temperature fields.
//!
//! The raster is written as 32-bit float grayscale with the GeoTIFF tags
//! GDAL needs to place it on a WGS84 lat/lon grid:
//!
//! - `ModelPixelScaleTag` / `ModelTiepointTag` for the affine transform
//!   (upper-left corner anchored, north-up)
//! - `GeoKeyDirectoryTag` declaring EPSG:4326 with pixel-is-area semantics
//! - `GDAL_NODATA` (42113) holding the nodata sentinel as ASCII
//! - `GDAL_METADATA` (42112) carrying dataset and band items, including
//!   the `STATISTICS_*` keys GDAL reads without rescanning the band
//!
//! Container layout (IFD, strips, offsets) is handled by the `tiff` crate.

use std::io::{Cursor, Seek, Write};

use chrono::NaiveDateTime;
use tiff::encoder::{colortype::Gray32Float, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Value written for pixels without data.
pub const NODATA: f32 = -9999.0;

/// Private GDAL tag holding the XML metadata block.
pub const GDAL_METADATA_TAG: u16 = 42112;

/// Private GDAL tag holding the nodata value as ASCII.
pub const GDAL_NODATA_TAG: u16 = 42113;

/// Baseline TIFF `DocumentName` tag.
const DOCUMENT_NAME_TAG: u16 = 269;

const EPSG_WGS84: u16 = 4326;

/// Summary statistics embedded in the raster metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Descriptive tags stored alongside the pixels.
#[derive(Debug, Clone)]
pub struct RasterTags {
    /// Requested export name, without extension.
    pub document_name: String,
    /// When the export was produced.
    pub report_date: NaiveDateTime,
    pub units: String,
    pub statistics: RasterStatistics,
}

impl RasterTags {
    pub fn new(
        document_name: impl Into<String>,
        report_date: NaiveDateTime,
        statistics: RasterStatistics,
    ) -> Self {
        Self {
            document_name: document_name.into(),
            report_date,
            units: "Celsius".to_string(),
            statistics,
        }
    }
}

/// A north-up float raster plus its georeference.
///
/// `values` are row-major with row 0 at `origin_y` (the northern edge).
/// NaN marks missing pixels and is written as [`NODATA`].
#[derive(Debug, Clone)]
pub struct GeoRaster<'a> {
    pub width: usize,
    pub height: usize,
    pub values: &'a [f32],
    /// Western edge longitude.
    pub origin_x: f64,
    /// Northern edge latitude.
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub tags: RasterTags,
}

impl GeoRaster<'_> {
    fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidRaster(format!(
                "raster has no pixels ({}x{})",
                self.width, self.height
            )));
        }
        if self.values.len() != self.width * self.height {
            return Err(RenderError::InvalidRaster(format!(
                "expected {} values for {}x{}, got {}",
                self.width * self.height,
                self.width,
                self.height,
                self.values.len()
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.pixel_width) && positive(self.pixel_height)) {
            return Err(RenderError::InvalidRaster(format!(
                "pixel size must be positive, got {}x{}",
                self.pixel_width, self.pixel_height
            )));
        }
        Ok(())
    }
}

/// Write `raster` as a GeoTIFF to `writer`.
pub fn write_geotiff<W: Write + Seek>(writer: W, raster: &GeoRaster<'_>) -> RenderResult<()> {
    raster.validate()?;

    let pixels: Vec<f32> = raster
        .values
        .iter()
        .map(|v| if v.is_nan() { NODATA } else { *v })
        .collect();

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image =
        encoder.new_image::<Gray32Float>(raster.width as u32, raster.height as u32)?;

    let tags = &raster.tags;
    let directory = image.encoder();
    directory.write_tag(
        Tag::ModelPixelScaleTag,
        &[raster.pixel_width, raster.pixel_height, 0.0][..],
    )?;
    directory.write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, raster.origin_x, raster.origin_y, 0.0][..],
    )?;
    directory.write_tag(Tag::GeoKeyDirectoryTag, &geo_key_directory()[..])?;
    directory.write_tag(Tag::Unknown(GDAL_NODATA_TAG), nodata_ascii().as_str())?;
    directory.write_tag(
        Tag::Unknown(GDAL_METADATA_TAG),
        gdal_metadata_xml(tags).as_str(),
    )?;
    directory.write_tag(
        Tag::Unknown(DOCUMENT_NAME_TAG),
        ascii_only(&tags.document_name).as_str(),
    )?;
    directory.write_tag(
        Tag::DateTime,
        tags.report_date.format("%Y:%m:%d %H:%M:%S").to_string().as_str(),
    )?;
    directory.write_tag(
        Tag::ImageDescription,
        format!("Time-mean temperature ({})", ascii_only(&tags.units)).as_str(),
    )?;

    image.write_data(&pixels)?;

    debug!(
        width = raster.width,
        height = raster.height,
        document = %tags.document_name,
        "Wrote GeoTIFF"
    );
    Ok(())
}

/// Encode `raster` into an in-memory GeoTIFF.
pub fn encode_geotiff(raster: &GeoRaster<'_>) -> RenderResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_geotiff(&mut cursor, raster)?;
    Ok(cursor.into_inner())
}

/// GeoKey directory for geographic WGS84, pixel-is-area.
fn geo_key_directory() -> [u16; 16] {
    [
        // header: version 1.1.0, 3 keys
        1, 1, 0, 3,
        // GTModelTypeGeoKey = ModelTypeGeographic
        1024, 0, 1, 2,
        // GTRasterTypeGeoKey = RasterPixelIsArea
        1025, 0, 1, 1,
        // GeographicTypeGeoKey
        2048, 0, 1, EPSG_WGS84,
    ]
}

fn nodata_ascii() -> String {
    format!("{}", NODATA as i32)
}

/// GDAL `<GDALMetadata>` block. Dataset-level items have no `sample`
/// attribute; band items are on sample 0.
pub fn gdal_metadata_xml(tags: &RasterTags) -> String {
    let stats = &tags.statistics;
    let dataset_items = [
        ("DOCUMENT_NAME", tags.document_name.clone()),
        (
            "REPORT_DATE",
            tags.report_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ),
    ];
    let band_items = [
        ("UNITS", tags.units.clone()),
        ("BAND_INTERPRETATION", "GrayIndex".to_string()),
        ("STATISTICS_MINIMUM", format!("{}", stats.min)),
        ("STATISTICS_MAXIMUM", format!("{}", stats.max)),
        ("STATISTICS_MEAN", format!("{}", stats.mean)),
        ("STATISTICS_STDDEV", format!("{}", stats.std_dev)),
    ];

    let mut xml = String::from("<GDALMetadata>\n");
    for (name, value) in &dataset_items {
        xml.push_str(&format!(
            "  <Item name=\"{}\">{}</Item>\n",
            name,
            escape_xml(&ascii_only(value))
        ));
    }
    for (name, value) in &band_items {
        xml.push_str(&format!(
            "  <Item name=\"{}\" sample=\"0\">{}</Item>\n",
            name,
            escape_xml(&ascii_only(value))
        ));
    }
    xml.push_str("</GDALMetadata>");
    xml
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// TIFF ASCII fields are 7-bit and NUL-terminated.
fn ascii_only(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() && c != '\0' { c } else { '_' })
        .collect()
}
