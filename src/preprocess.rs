use clap::ValueEnum;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, RgbImage};
use ndarray::Array4;

/// Memory layout of the classifier input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, as exported from Keras.
    Nhwc,
    /// `[1, 3, H, W]`
    Nchw,
}

impl TensorLayout {
    pub fn shape(self, side: usize) -> [usize; 4] {
        match self {
            TensorLayout::Nhwc => [1, side, side, 3],
            TensorLayout::Nchw => [1, 3, side, side],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    /// Input images are resized to `side x side`.
    pub side: u32,
    /// Multiplier applied to every channel value.
    pub scale: f32,
    pub layout: TensorLayout,
}

impl PreprocessConfig {
    pub fn flower(layout: TensorLayout) -> Self {
        Self {
            side: 299,
            scale: 1.0 / 255.0,
            layout,
        }
    }

    /// The animal model takes raw 0..=255 channel values.
    pub fn animal(layout: TensorLayout) -> Self {
        Self {
            side: 224,
            scale: 1.0,
            layout,
        }
    }

    pub fn input_shape(&self) -> [usize; 4] {
        self.layout.shape(self.side as usize)
    }

    /// Resize to the configured square (aspect ratio is not preserved), scale
    /// each channel and add a batch dimension of one. Interpolation happens in
    /// f32 so resized values are not rounded back to whole channel levels.
    pub fn to_tensor(&self, image: &RgbImage) -> Array4<f32> {
        let side = self.side;
        let float = DynamicImage::ImageRgb8(image.clone()).into_rgb32f();
        let resized = image::imageops::resize(&float, side, side, FilterType::Triangle);

        // into_rgb32f maps 0..=255 onto 0.0..=1.0
        let scale = 255.0 * self.scale;
        let mut tensor = Array4::zeros(self.input_shape());
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let value = pixel[c] * scale;
                match self.layout {
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
                }
            }
        }
        tensor
    }
}

/// Sniff the format from the bytes and decode to 8-bit RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, ImageError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}
