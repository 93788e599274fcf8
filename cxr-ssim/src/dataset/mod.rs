//! 数据集操作.
//!
//! 一次运行使用三个目录: 健康参考图像, 患病参考图像, 待分类的未知图像.

use std::path::{Path, PathBuf};

mod loader;

pub use loader::{image_loader, load_dir, ImageLoader};

/// 健康参考图像的默认目录名.
pub const HEALTHY_DIR_NAME: &str = "valid_normais_frontal";

/// 患病参考图像的默认目录名.
pub const DISEASED_DIR_NAME: &str = "valid_Doentes_frontal";

/// 未知图像的默认目录名.
pub const UNKNOWN_DIR_NAME: &str = "valid_desconhecidos_frontal";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
