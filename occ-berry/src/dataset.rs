//! 数据目录定位.

use std::path::{Path, PathBuf};

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_dataset_dir_with() {
        let (Some(base), Some(full)) = (
            home_dataset_dir(),
            home_dataset_dir_with(["models", "tiny.npz"]),
        ) else {
            // 没有用户主目录的环境下无从比较.
            return;
        };
        assert!(base.ends_with("dataset"));
        assert_eq!(full, base.join("models").join("tiny.npz"));
    }
}
