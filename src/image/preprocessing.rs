use crate::image::ImageTransforms;
use crate::Result;
use ndarray::{Array3, Array4, Axis};

/// 所有分类模型的输入边长
pub const INPUT_SIZE: usize = 224;

const DEIT_MEAN: f32 = 0.5;
const DEIT_STD: f32 = 0.5;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Keras系模型预处理：缩放到224x224，归一化到[0,1]，NHWC布局
    pub fn for_keras(image: &Array3<f32>) -> Result<Array4<f32>> {
        let resized = ImageTransforms::resize_bilinear(image, INPUT_SIZE, INPUT_SIZE)?;
        let scaled = resized / 255.0;

        Ok(scaled.insert_axis(Axis(0)))
    }

    /// DeiT预处理：短边缩放到224，中心裁剪，均值0.5/标准差0.5归一化，NCHW布局
    pub fn for_deit(image: &Array3<f32>) -> Result<Array4<f32>> {
        let resized = ImageTransforms::resize_shortest_side(image, INPUT_SIZE)?;
        let cropped = ImageTransforms::center_crop(&resized, INPUT_SIZE)?;

        let (height, width, channels) = cropped.dim();
        let mut chw = Array3::<f32>::zeros((channels, height, width));

        for h in 0..height {
            for w in 0..width {
                for c in 0..channels {
                    let scaled = cropped[[h, w, c]] / 255.0;
                    chw[[c, h, w]] = (scaled - DEIT_MEAN) / DEIT_STD;
                }
            }
        }

        Ok(chw.insert_axis(Axis(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keras_tensor_is_nhwc_in_unit_range() {
        let image = Array3::from_elem((100, 160, 3), 255.0);
        let tensor = ImagePreprocessor::for_keras(&image).unwrap();

        assert_eq!(tensor.dim(), (1, INPUT_SIZE, INPUT_SIZE, 3));
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn deit_tensor_is_nchw_and_normalized() {
        // 全白图像归一化后应为 (1.0 - 0.5) / 0.5 = 1.0
        let white = Array3::from_elem((300, 400, 3), 255.0);
        let tensor = ImagePreprocessor::for_deit(&white).unwrap();

        assert_eq!(tensor.dim(), (1, 3, INPUT_SIZE, INPUT_SIZE));
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-5));

        // 全黑图像应为 (0.0 - 0.5) / 0.5 = -1.0
        let black = Array3::from_elem((300, 400, 3), 0.0);
        let tensor = ImagePreprocessor::for_deit(&black).unwrap();
        assert!(tensor.iter().all(|&v| (v + 1.0).abs() < 1e-5));
    }

    #[test]
    fn deit_handles_non_square_inputs() {
        let wide = Array3::from_elem((240, 1000, 3), 42.0);
        let tensor = ImagePreprocessor::for_deit(&wide).unwrap();
        assert_eq!(tensor.dim(), (1, 3, INPUT_SIZE, INPUT_SIZE));

        let tall = Array3::from_elem((1000, 240, 3), 42.0);
        let tensor = ImagePreprocessor::for_deit(&tall).unwrap();
        assert_eq!(tensor.dim(), (1, 3, INPUT_SIZE, INPUT_SIZE));
    }
}
