use crate::utils::error::WayangError;
use crate::Result;
use axum::body::Bytes;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array3;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_bytes: usize) -> Result<DynamicImage> {
        // 检测并移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = if base64_data.starts_with("data:") {
            base64_data.split(',').nth(1).unwrap_or(base64_data)
        } else {
            base64_data
        };

        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_clean.trim())
            .map_err(WayangError::Base64)?;

        Self::decode(&image_bytes, max_bytes)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &Bytes, max_bytes: usize) -> Result<DynamicImage> {
        Self::decode(bytes, max_bytes)
    }

    /// 解码图像字节，校验大小和格式
    fn decode(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.len() > max_bytes {
            return Err(WayangError::FileTooLarge(bytes.len(), max_bytes));
        }

        let format = Self::detect_format(bytes).ok_or_else(|| {
            WayangError::UnsupportedFormat("unrecognized image data".to_string())
        })?;

        if !Self::is_supported_format(format) {
            return Err(WayangError::UnsupportedFormat(format!("{:?}", format)));
        }

        let image = image::load_from_memory(bytes).map_err(WayangError::ImageDecode)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }

    /// 转换DynamicImage为ndarray::Array3<f32> (HWC格式, 0..=255)
    pub fn to_array3(image: &DynamicImage) -> Result<Array3<f32>> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let raw_data: Vec<f32> = rgb_image.into_raw().into_iter().map(f32::from).collect();

        Array3::from_shape_vec((height as usize, width as usize, 3), raw_data)
            .map_err(|e| WayangError::ImageProcessing(format!("Invalid pixel buffer: {}", e)))
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width < 16 || height < 16 {
            return Err(WayangError::InvalidInput(format!(
                "Image too small: {}x{}, minimum 16x16",
                width, height
            )));
        }

        if width > 8192 || height > 8192 {
            return Err(WayangError::InvalidInput(format!(
                "Image too large: {}x{}, maximum 8192x8192",
                width, height
            )));
        }

        Ok(())
    }

    /// 预处理图像：校验尺寸并转为HWC数组
    pub fn preprocess(image: DynamicImage) -> Result<Array3<f32>> {
        Self::validate_dimensions(&image)?;
        Self::to_array3(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgb(color);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn to_array3_is_hwc_with_byte_range() {
        let image = solid_image(4, 2, [255, 128, 0]);
        let array = ImageLoader::to_array3(&image).unwrap();

        assert_eq!(array.dim(), (2, 4, 3));
        assert_eq!(array[[0, 0, 0]], 255.0);
        assert_eq!(array[[0, 0, 1]], 128.0);
        assert_eq!(array[[1, 3, 2]], 0.0);
    }

    #[test]
    fn tiny_images_are_rejected() {
        let image = solid_image(8, 8, [0, 0, 0]);
        assert!(ImageLoader::validate_dimensions(&image).is_err());

        let image = solid_image(16, 16, [0, 0, 0]);
        assert!(ImageLoader::validate_dimensions(&image).is_ok());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let bytes = vec![0u8; 64];
        let err = ImageLoader::decode(&bytes, 32).unwrap_err();
        assert!(matches!(err, WayangError::FileTooLarge(64, 32)));
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let bytes = b"definitely not an image";
        let err = ImageLoader::decode(bytes, 1024).unwrap_err();
        assert!(matches!(err, WayangError::UnsupportedFormat(_)));
    }

    #[test]
    fn png_roundtrip_decodes() {
        let image = solid_image(32, 32, [10, 20, 30]);
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();

        let bytes = buffer.into_inner();
        assert_eq!(ImageLoader::detect_format(&bytes), Some(ImageFormat::Png));

        let decoded = ImageLoader::decode(&bytes, 1024 * 1024).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
    }

    #[test]
    fn base64_data_url_prefix_is_stripped() {
        let image = solid_image(32, 32, [1, 2, 3]);
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();

        let encoded = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
        let with_prefix = format!("data:image/png;base64,{}", encoded);

        let decoded = ImageLoader::from_base64(&with_prefix, 1024 * 1024).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
    }
}
