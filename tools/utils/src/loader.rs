//! 对 `occ-berry::dataset` 的更一层封装. 提供模型与类别映射表的默认路径.

use occ_berry::dataset::home_dataset_dir_with;
use std::env;
use std::path::PathBuf;

/// 模型文件路径的环境变量.
pub const MODEL_ENV: &str = "OCCLUSION_MODEL";

/// synset 列表路径的环境变量.
pub const SYNSETS_ENV: &str = "OCCLUSION_SYNSETS";

/// synset 名称表路径的环境变量.
pub const SYNSET_WORDS_ENV: &str = "OCCLUSION_SYNSET_WORDS";

/// 依次尝试: 显式给出的路径, 环境变量 `key` 的非空值, `$HOME/dataset/{rest}`.
///
/// 三者都不可用时 (没有用户主目录) 返回 `None`.
pub fn resolve<I>(explicit: Option<PathBuf>, key: &str, rest: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'static str>,
{
    explicit
        .or_else(|| {
            env::var(key)
                .ok()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| home_dataset_dir_with(rest))
}

/// 获取模型文件路径.
///
/// 1. 若给出 `explicit`, 则返回它;
/// 2. 若环境变量 `$OCCLUSION_MODEL` 非空, 则返回其值;
/// 3. 否则, 返回 `$HOME/dataset/models/occlusion.npz`.
#[inline]
pub fn model_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    resolve(explicit, MODEL_ENV, ["models", "occlusion.npz"])
}

/// 获取 synset 列表路径, 默认为 `$HOME/dataset/ilsvrc12/synsets.txt`.
#[inline]
pub fn synsets_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    resolve(explicit, SYNSETS_ENV, ["ilsvrc12", "synsets.txt"])
}

/// 获取 synset 名称表路径, 默认为 `$HOME/dataset/ilsvrc12/synset_words.txt`.
#[inline]
pub fn synset_words_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    resolve(explicit, SYNSET_WORDS_ENV, ["ilsvrc12", "synset_words.txt"])
}
