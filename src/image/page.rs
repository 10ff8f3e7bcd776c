//! Page raster with a lazily derived, cached brightness grid.
use super::brightness::BrightnessGrid;
use image::{DynamicImage, GrayImage};

/// A scanned page: the 8-bit raster, its resolution and the brightness grid
/// derived from it on first use.
#[derive(Clone, Debug)]
pub struct PageImage {
    raster: GrayImage,
    dpi: f32,
    brightness: Option<BrightnessGrid>,
}

impl PageImage {
    pub fn new(raster: GrayImage, dpi: f32) -> Self {
        Self {
            raster,
            dpi,
            brightness: None,
        }
    }

    pub fn from_dynamic(image: DynamicImage, dpi: f32) -> Self {
        Self::new(image.into_luma8(), dpi)
    }

    /// Page built directly from a brightness grid (synthetic inputs, tests).
    pub fn from_brightness(grid: BrightnessGrid, dpi: f32) -> Self {
        Self {
            raster: grid.to_gray_image(),
            dpi,
            brightness: Some(grid),
        }
    }

    pub fn raster(&self) -> &GrayImage {
        &self.raster
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    pub fn width(&self) -> usize {
        self.raster.width() as usize
    }

    pub fn height(&self) -> usize {
        self.raster.height() as usize
    }

    pub fn brightness(&mut self) -> &BrightnessGrid {
        self.brightness_mut()
    }

    pub fn brightness_mut(&mut self) -> &mut BrightnessGrid {
        let raster = &self.raster;
        self.brightness
            .get_or_insert_with(|| BrightnessGrid::from_gray_image(raster))
    }

    /// Cached grid if it has been derived already.
    pub fn cached_brightness(&self) -> Option<&BrightnessGrid> {
        self.brightness.as_ref()
    }

    /// Swap the raster and drop the derived grid.
    pub fn replace_raster(&mut self, raster: GrayImage, dpi: f32) {
        self.raster = raster;
        self.dpi = dpi;
        self.brightness = None;
    }

    /// Write the (possibly conditioned) grid back into the raster.
    pub fn commit_brightness(&mut self) {
        if let Some(grid) = &self.brightness {
            self.raster = grid.to_gray_image();
        }
    }

    pub fn into_brightness(mut self) -> BrightnessGrid {
        self.brightness_mut();
        self.brightness
            .take()
            .unwrap_or_else(|| BrightnessGrid::new(0, 0))
    }
}
