//! JSON configuration files.

use crate::Result;
use serde::Deserialize;
use spotpix_core::{CentroidConfig, Rect, SyncRegions};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Sensor geometry of the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraGeometry {
    /// Visible pixels per row.
    pub width: usize,
    /// Rows per frame.
    pub height: usize,
    /// Bytes per row, at least `width`.
    pub pitch: usize,
}

impl Default for CameraGeometry {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            pitch: 1024,
        }
    }
}

/// Camera geometry plus centroiding parameters, validated together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpotpixConfig {
    /// Frame geometry.
    pub camera: CameraGeometry,
    /// Centroiding parameters.
    pub centroid: CentroidConfig,
}

// Intermediate structs for the JSON schema
#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonConfig {
    camera: JsonCamera,
    centroid: JsonCentroid,
    aoi: Option<JsonAoi>,
    sync: JsonSync,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonCamera {
    width: usize,
    height: usize,
    pitch: Option<usize>,
}

impl Default for JsonCamera {
    fn default() -> Self {
        let camera = CameraGeometry::default();
        Self {
            width: camera.width,
            height: camera.height,
            pitch: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonCentroid {
    threshold: u8,
    min_pixels: u32,
    max_pixels: u32,
    window_size: u32,
    merge_radius: f64,
    use_hybrid: bool,
    region_capacity: usize,
    spot_capacity: usize,
    candidate_capacity: usize,
}

impl Default for JsonCentroid {
    fn default() -> Self {
        let defaults = CentroidConfig::default();
        Self {
            threshold: defaults.threshold,
            min_pixels: defaults.min_pixels,
            max_pixels: defaults.max_pixels,
            window_size: defaults.window_size,
            merge_radius: defaults.merge_radius,
            use_hybrid: defaults.use_hybrid,
            region_capacity: defaults.region_capacity,
            spot_capacity: defaults.spot_capacity,
            candidate_capacity: defaults.candidate_capacity,
        }
    }
}

#[derive(Deserialize)]
struct JsonAoi {
    width: u32,
    height: u32,
    #[serde(default)]
    left: u32,
    #[serde(default)]
    top: u32,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonSync {
    signal: Option<JsonRect>,
    baseline: Option<JsonRect>,
}

#[derive(Deserialize)]
struct JsonRect {
    x_lower: u32,
    x_upper: u32,
    y_lower: u32,
    y_upper: u32,
}

impl From<JsonRect> for Rect {
    fn from(r: JsonRect) -> Self {
        Rect::new(r.x_lower, r.x_upper, r.y_lower, r.y_upper)
    }
}

impl SpotpixConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// describes an invalid configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json_config: JsonConfig = serde_json::from_reader(reader)?;
        Self::from_json_config(json_config)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON or describes an
    /// invalid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let camera = CameraGeometry {
            width: config.camera.width,
            height: config.camera.height,
            pitch: config.camera.pitch.unwrap_or(config.camera.width),
        };
        if camera.pitch < camera.width {
            return Err(crate::Error::InvalidFormat(format!(
                "camera pitch {} is smaller than width {}",
                camera.pitch, camera.width
            )));
        }

        let c = config.centroid;
        let centroid = CentroidConfig {
            threshold: c.threshold,
            min_pixels: c.min_pixels,
            max_pixels: c.max_pixels,
            window_size: c.window_size,
            merge_radius: c.merge_radius,
            aoi: config
                .aoi
                .map(|a| Rect::from_origin_size(a.left, a.top, a.width, a.height)),
            sync: SyncRegions {
                signal: config.sync.signal.map(Rect::from).unwrap_or_default(),
                baseline: config.sync.baseline.map(Rect::from).unwrap_or_default(),
            },
            use_hybrid: c.use_hybrid,
            region_capacity: c.region_capacity,
            spot_capacity: c.spot_capacity,
            candidate_capacity: c.candidate_capacity,
        };

        centroid.validate(camera.width, camera.height)?;
        Ok(Self { camera, centroid })
    }
}
