use crate::{
    foundation::core::{Point, Rect},
    foundation::error::{LoreError, LoreResult},
    geometry::parse::LatLng,
    snapshot::model::{Map, MapCanvas},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Zoom band of the flat image projection.
pub struct ViewportConfig {
    /// Zoom when the view opens.
    pub initial_zoom: f64,
    /// Lowest zoom level.
    pub min_zoom: f64,
    /// Highest zoom level.
    pub max_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            initial_zoom: -1.0,
            min_zoom: -3.0,
            max_zoom: 2.0,
        }
    }
}

impl ViewportConfig {
    /// Reject non-finite levels and an initial zoom outside the band.
    pub fn validate(&self) -> LoreResult<()> {
        let all_finite = [self.initial_zoom, self.min_zoom, self.max_zoom]
            .iter()
            .all(|z| z.is_finite());
        if !all_finite {
            return Err(LoreError::validation("zoom levels must be finite"));
        }
        if self.min_zoom > self.max_zoom {
            return Err(LoreError::validation("min_zoom must be <= max_zoom"));
        }
        if self.initial_zoom < self.min_zoom || self.initial_zoom > self.max_zoom {
            return Err(LoreError::validation(format!(
                "initial zoom {} is outside [{}, {}]",
                self.initial_zoom, self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }
}

/// Coordinate frame shared by the base image and every annotation.
///
/// One unit per pixel, no reprojection: bounds are `[[0, 0], [height, width]]`
/// and the initial center is the image midpoint.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    width: u32,
    height: u32,
    bounds: [[f64; 2]; 2],
    center: LatLng,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    /// Frame for `canvas`, failing on an empty canvas or bad zoom band.
    pub fn new(canvas: MapCanvas, config: ViewportConfig) -> LoreResult<Self> {
        canvas.validate()?;
        config.validate()?;
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            bounds: [[0.0, 0.0], [h, w]],
            center: LatLng::new(h / 2.0, w / 2.0),
            zoom: config.initial_zoom,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        })
    }

    /// Frame for a map's canvas.
    pub fn for_map(map: &Map, config: ViewportConfig) -> LoreResult<Self> {
        Self::new(map.canvas(), config)
    }

    /// Canvas the frame was built for.
    pub fn canvas(&self) -> MapCanvas {
        MapCanvas {
            width: self.width,
            height: self.height,
        }
    }

    /// `[[0, 0], [height, width]]` in `[lat, lng]` order.
    pub fn bounds(&self) -> [[f64; 2]; 2] {
        self.bounds
    }

    /// The image rectangle in pixel space.
    pub fn pixel_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Initial center, the image midpoint.
    pub fn center(&self) -> LatLng {
        self.center
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// `(min, max)` zoom.
    pub fn zoom_range(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Pixel-space point for a coordinate.
    pub fn to_pixel(&self, at: LatLng) -> Point {
        at.to_point()
    }

    /// Whether `at` lies on the base image (edges included).
    pub fn contains(&self, at: LatLng) -> bool {
        let r = self.pixel_rect();
        let p = self.to_pixel(at);
        p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
    }

    /// Screen pixels per image pixel at the current zoom.
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Same frame at another zoom, clamped to the configured band.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/projection.rs"]
mod tests;
