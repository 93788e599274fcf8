//! ONNX Runtime 分割模型后端.
//!
//! 模型文件需为 ONNX 格式, 单输入单输出, 布局 `N x 256 x 256 x 1` (NHWC).

use super::SegmentationModel;
use crate::error::{LoadModelError, PredictError};
use ndarray::{Array4, ArrayView4};
use ort::session::Session;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 基于 ONNX Runtime 会话的分割模型.
///
/// 底层会话的推理接口需要独占访问, 因此用 `Mutex` 包装, 使模型本身可以只读共享.
pub struct OnnxModel {
    session: Mutex<Session>,
    path: PathBuf,
}

impl OnnxModel {
    /// 从路径 `path` 加载模型. 只加载一次, 不做任何训练.
    ///
    /// 文件不存在时返回 [`LoadModelError::NotFound`], 后端无法构建会话时返回
    /// [`LoadModelError::Backend`]. 两者都是致命错误.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadModelError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadModelError::NotFound(path.to_owned()));
        }

        let backend = |e: &dyn Display| LoadModelError::Backend {
            path: path.to_owned(),
            reason: e.to_string(),
        };
        let builder = Session::builder().map_err(|e| backend(&e))?;
        let session = builder.commit_from_file(path).map_err(|e| backend(&e))?;
        log::info!("Segmentation model loaded: {}", path.display());

        Ok(Self {
            session: Mutex::new(session),
            path: path.to_owned(),
        })
    }

    /// 模型文件路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[inline]
fn backend_err(e: impl Display) -> PredictError {
    PredictError::Backend(e.to_string())
}

impl SegmentationModel for OnnxModel {
    fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
        let (n, h, w, c) = batch.dim();
        let input = Tensor::from_array(([n, h, w, c], batch.iter().copied().collect::<Vec<f32>>()))
            .map_err(backend_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictError::Backend("session mutex poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![input]).map_err(backend_err)?;
        let (shape, probs) = outputs[0].try_extract_tensor::<f32>().map_err(backend_err)?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        if dims != [n, h, w, 1] {
            return Err(PredictError::Shape([n, h, w, 1], dims));
        }
        Array4::from_shape_vec((n, h, w, 1), probs.to_vec()).map_err(backend_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        match OnnxModel::open(&path) {
            Err(LoadModelError::NotFound(p)) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("missing model should not load"),
        }

        // 目录不是模型文件.
        assert!(matches!(
            OnnxModel::open(dir.path()),
            Err(LoadModelError::NotFound(_))
        ));
    }

    #[test]
    fn test_garbage_model_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"this is not an onnx graph").unwrap();
        match OnnxModel::open(&path) {
            Err(LoadModelError::Backend { path: p, reason }) => {
                assert_eq!(p, path);
                assert!(!reason.is_empty());
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("garbage model should not load"),
        }
    }
}
