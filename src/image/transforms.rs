use crate::utils::error::WayangError;
use crate::Result;
use ndarray::{s, Array3};

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 双线性插值缩放到指定尺寸
    pub fn resize_bilinear(
        image: &Array3<f32>,
        target_width: usize,
        target_height: usize,
    ) -> Result<Array3<f32>> {
        let (orig_h, orig_w, channels) = image.dim();

        if orig_h == 0 || orig_w == 0 || target_width == 0 || target_height == 0 {
            return Err(WayangError::ImageProcessing(
                "Cannot resize empty image".to_string(),
            ));
        }

        if orig_h == target_height && orig_w == target_width {
            return Ok(image.clone());
        }

        let scale_x = orig_w as f32 / target_width as f32;
        let scale_y = orig_h as f32 / target_height as f32;

        let mut resized = Array3::<f32>::zeros((target_height, target_width, channels));

        for h in 0..target_height {
            for w in 0..target_width {
                let src_h = h as f32 * scale_y;
                let src_w = w as f32 * scale_x;

                let h1 = src_h.floor() as usize;
                let h2 = (h1 + 1).min(orig_h - 1);
                let w1 = src_w.floor() as usize;
                let w2 = (w1 + 1).min(orig_w - 1);

                let dh = src_h - h1 as f32;
                let dw = src_w - w1 as f32;

                for c in 0..channels {
                    let v11 = image[[h1, w1, c]];
                    let v12 = image[[h1, w2, c]];
                    let v21 = image[[h2, w1, c]];
                    let v22 = image[[h2, w2, c]];

                    let interpolated = v11 * (1.0 - dh) * (1.0 - dw)
                        + v12 * (1.0 - dh) * dw
                        + v21 * dh * (1.0 - dw)
                        + v22 * dh * dw;

                    resized[[h, w, c]] = interpolated;
                }
            }
        }

        Ok(resized)
    }

    /// 缩放短边到目标长度，保持宽高比
    pub fn resize_shortest_side(image: &Array3<f32>, target: usize) -> Result<Array3<f32>> {
        let (orig_h, orig_w, _) = image.dim();

        if orig_h == 0 || orig_w == 0 {
            return Err(WayangError::ImageProcessing(
                "Cannot resize empty image".to_string(),
            ));
        }

        let (new_w, new_h) = if orig_h <= orig_w {
            let scaled_w = (orig_w as f32 * target as f32 / orig_h as f32).round() as usize;
            (scaled_w.max(target), target)
        } else {
            let scaled_h = (orig_h as f32 * target as f32 / orig_w as f32).round() as usize;
            (target, scaled_h.max(target))
        };

        Self::resize_bilinear(image, new_w, new_h)
    }

    /// 中心裁剪到 size x size
    pub fn center_crop(image: &Array3<f32>, size: usize) -> Result<Array3<f32>> {
        let (orig_h, orig_w, _) = image.dim();

        if orig_h < size || orig_w < size {
            return Err(WayangError::ImageProcessing(format!(
                "Image {}x{} smaller than crop size {}",
                orig_w, orig_h, size
            )));
        }

        let top = (orig_h - size) / 2;
        let left = (orig_w - size) / 2;

        Ok(image
            .slice(s![top..top + size, left..left + size, ..])
            .to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(height: usize, width: usize) -> Array3<f32> {
        Array3::from_shape_fn((height, width, 3), |(h, w, c)| {
            (h * 100 + w * 10 + c) as f32
        })
    }

    #[test]
    fn resize_produces_target_dimensions() {
        let image = gradient_image(100, 60);
        let resized = ImageTransforms::resize_bilinear(&image, 224, 224).unwrap();
        assert_eq!(resized.dim(), (224, 224, 3));
    }

    #[test]
    fn resize_preserves_constant_images() {
        let image = Array3::from_elem((50, 80, 3), 127.0);
        let resized = ImageTransforms::resize_bilinear(&image, 20, 30).unwrap();

        assert_eq!(resized.dim(), (30, 20, 3));
        assert!(resized.iter().all(|&v| (v - 127.0).abs() < 1e-4));
    }

    #[test]
    fn resize_same_size_is_identity() {
        let image = gradient_image(16, 16);
        let resized = ImageTransforms::resize_bilinear(&image, 16, 16).unwrap();
        assert_eq!(resized, image);
    }

    #[test]
    fn shortest_side_resize_keeps_aspect_ratio() {
        let landscape = gradient_image(100, 200);
        let resized = ImageTransforms::resize_shortest_side(&landscape, 224).unwrap();
        assert_eq!(resized.dim(), (224, 448, 3));

        let portrait = gradient_image(200, 100);
        let resized = ImageTransforms::resize_shortest_side(&portrait, 224).unwrap();
        assert_eq!(resized.dim(), (448, 224, 3));
    }

    #[test]
    fn center_crop_takes_the_middle() {
        let image = gradient_image(10, 10);
        let cropped = ImageTransforms::center_crop(&image, 4).unwrap();

        assert_eq!(cropped.dim(), (4, 4, 3));
        // 裁剪窗口从 (3, 3) 开始
        assert_eq!(cropped[[0, 0, 0]], image[[3, 3, 0]]);
        assert_eq!(cropped[[3, 3, 0]], image[[6, 6, 0]]);
    }

    #[test]
    fn center_crop_rejects_small_images() {
        let image = gradient_image(10, 10);
        assert!(ImageTransforms::center_crop(&image, 32).is_err());
    }
}
