//! 类别映射表.
//!
//! 两张表在启动时加载一次, 之后只读:
//!
//! 1. 索引 -> synset. 文件每行一个 synset, 行号 (从 0 开始) 即类别索引;
//! 2. synset -> 可读名称. 文件每行形如 `synset<TAB>名称1, 名称2, ...`.
//!
//! 两张表只用于图例和真值标签解析, 与热力图算法本身无关.

use crate::error::{OcclusionError, OcclusionResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 图例条目: (类别索引, 可读名称).
pub type Legend = Vec<(usize, String)>;

/// 不可变的类别映射表.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    idx_to_synset: Vec<String>,
    synset_to_idx: HashMap<String, usize>,
    synset_to_class: HashMap<String, String>,
}

/// 打开文本文件.
fn open_buffered(path: &Path) -> OcclusionResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| OcclusionError::LabelTableIo(path.to_owned(), e))
}

/// 逐行读取 synset 列表. 行号 (从 0 开始) 即类别索引.
fn read_synsets<R: BufRead>(
    reader: R,
    path: &Path,
) -> OcclusionResult<(Vec<String>, HashMap<String, usize>)> {
    let mut idx_to_synset = Vec::new();
    let mut synset_to_idx = HashMap::new();
    for line in reader.lines() {
        let synset = line
            .map_err(|e| OcclusionError::LabelTableIo(path.to_owned(), e))?
            .trim()
            .to_owned();
        if !synset.is_empty() {
            synset_to_idx.insert(synset.clone(), idx_to_synset.len());
        }
        idx_to_synset.push(synset);
    }
    Ok((idx_to_synset, synset_to_idx))
}

/// 逐行读取 `synset<TAB>名称` 表.
fn read_words<R: BufRead>(reader: R, path: &Path) -> OcclusionResult<HashMap<String, String>> {
    let mut synset_to_class = HashMap::new();
    for (no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| OcclusionError::LabelTableIo(path.to_owned(), e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((synset, class)) = line.split_once('\t') else {
            return Err(OcclusionError::LabelTableFormat {
                line: no + 1,
                reason: "缺少制表符分隔".to_owned(),
            });
        };
        synset_to_class.insert(synset.trim().to_owned(), class.trim().to_owned());
    }
    Ok(synset_to_class)
}

impl LabelTable {
    /// 从 synset 列表文件 `synsets` 和 synset 名称文件 `words` 加载映射表.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(synsets: P, words: Q) -> OcclusionResult<Self> {
        let (synsets, words) = (synsets.as_ref(), words.as_ref());
        let table = Self::load(open_buffered(synsets)?, synsets, open_buffered(words)?, words)?;
        log::info!(
            "Label table loaded: {} classes, {} names",
            table.len(),
            table.synset_to_class.len()
        );
        Ok(table)
    }

    /// 从任意文本来源加载映射表.
    ///
    /// synset 列表中的空行会被跳过但仍占用索引; 名称文件中的空行被忽略.
    /// 读取错误中的路径为空.
    #[inline]
    pub fn from_readers<R1: BufRead, R2: BufRead>(synsets: R1, words: R2) -> OcclusionResult<Self> {
        Self::load(synsets, Path::new(""), words, Path::new(""))
    }

    /// 读取错误分别归到各自的来源路径.
    fn load<R1: BufRead, R2: BufRead>(
        synsets: R1,
        synsets_path: &Path,
        words: R2,
        words_path: &Path,
    ) -> OcclusionResult<Self> {
        let (idx_to_synset, synset_to_idx) = read_synsets(synsets, synsets_path)?;
        let synset_to_class = read_words(words, words_path)?;
        Ok(Self {
            idx_to_synset,
            synset_to_idx,
            synset_to_class,
        })
    }

    /// 类别总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.idx_to_synset.len()
    }

    /// 映射表是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx_to_synset.is_empty()
    }

    /// synset 对应的类别索引.
    #[inline]
    pub fn index_of(&self, synset: &str) -> Option<usize> {
        self.synset_to_idx.get(synset).copied()
    }

    /// 类别索引对应的 synset.
    #[inline]
    pub fn synset_of(&self, idx: usize) -> Option<&str> {
        self.idx_to_synset
            .get(idx)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// 类别索引对应的完整名称, 如 `"tabby, tabby cat"`.
    pub fn full_name(&self, idx: usize) -> Option<&str> {
        self.synset_to_class
            .get(self.synset_of(idx)?)
            .map(String::as_str)
    }

    /// 类别索引对应的简短名称, 即完整名称中第一个逗号之前的部分.
    pub fn class_name(&self, idx: usize) -> Option<&str> {
        self.full_name(idx)
            .map(|s| s.split(',').next().unwrap_or(s).trim())
    }

    /// 由图像文件名解析真值类别索引, 规则见 [`true_label_from_path`].
    ///
    /// 解析出的标签不在表中时返回 [`OcclusionError::UnknownLabel`].
    pub fn true_class<P: AsRef<Path>>(&self, image_path: P) -> OcclusionResult<usize> {
        let label = true_label_from_path(image_path.as_ref())
            .ok_or_else(|| OcclusionError::UnknownLabel(image_path.as_ref().display().to_string()))?;
        self.index_of(&label)
            .ok_or(OcclusionError::UnknownLabel(label))
    }

    /// 为给定类别构建图例. 表中没有名称的类别以 synset 或索引代替.
    pub fn legend<I: IntoIterator<Item = usize>>(&self, classes: I) -> Legend {
        classes
            .into_iter()
            .map(|idx| {
                let name = self
                    .class_name(idx)
                    .or_else(|| self.synset_of(idx))
                    .map_or_else(|| format!("#{idx}"), str::to_owned);
                (idx, name)
            })
            .collect()
    }
}

/// 图像文件名中第一个 `_` 之前的部分即为真值 synset, 如
/// `n02123045_1234.JPEG` -> `n02123045`. 没有 `_` 时取整个文件名.
///
/// 路径没有文件名部分时返回 `None`.
pub fn true_label_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.split('_').next().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SYNSETS: &str = "n01440764\nn02123045\n\nn02504458\n";
    const WORDS: &str = "n01440764\ttench, Tinca tinca\n\
                         n02123045\ttabby, tabby cat\n\
                         \n\
                         n02504458\tAfrican elephant, Loxodonta africana\n";

    fn table() -> LabelTable {
        LabelTable::from_readers(Cursor::new(SYNSETS), Cursor::new(WORDS)).unwrap()
    }

    #[test]
    fn test_lookup() {
        let t = table();
        assert_eq!(t.len(), 4);
        assert_eq!(t.index_of("n02123045"), Some(1));
        assert_eq!(t.index_of("n02504458"), Some(3));
        assert_eq!(t.synset_of(2), None);
        assert_eq!(t.full_name(1), Some("tabby, tabby cat"));
        assert_eq!(t.class_name(1), Some("tabby"));
        assert_eq!(t.class_name(3), Some("African elephant"));
        assert_eq!(t.class_name(9), None);
    }

    #[test]
    fn test_true_class() {
        let t = table();
        assert_eq!(t.true_class("/data/n02123045_77.JPEG").unwrap(), 1);
        assert!(matches!(
            t.true_class("/data/n99999999_1.JPEG"),
            Err(OcclusionError::UnknownLabel(l)) if l == "n99999999"
        ));
    }

    #[test]
    fn test_true_label_from_path() {
        assert_eq!(
            true_label_from_path(Path::new("a/b/n01440764_10026.JPEG")).as_deref(),
            Some("n01440764")
        );
        assert_eq!(
            true_label_from_path(Path::new("cat.png")).as_deref(),
            Some("cat.png")
        );
        assert_eq!(true_label_from_path(Path::new("/")), None);
    }

    #[test]
    fn test_legend() {
        let t = table();
        let legend = t.legend([0, 2, 7]);
        assert_eq!(
            legend,
            vec![
                (0, "tench".to_owned()),
                (2, "#2".to_owned()),
                (7, "#7".to_owned())
            ]
        );
    }

    #[test]
    fn test_words_format_error() {
        let err = LabelTable::from_readers(Cursor::new(SYNSETS), Cursor::new("n01440764 tench\n"))
            .unwrap_err();
        assert!(matches!(err, OcclusionError::LabelTableFormat { line: 1, .. }));
    }

    /// 总是读取失败的数据源.
    struct Broken;

    impl std::io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "broken"))
        }
    }

    #[test]
    fn test_read_error_carries_its_own_path() {
        let err = LabelTable::load(
            Cursor::new(SYNSETS),
            Path::new("synsets.txt"),
            std::io::BufReader::new(Broken),
            Path::new("synset_words.txt"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OcclusionError::LabelTableIo(ref p, _) if p == Path::new("synset_words.txt")
        ));

        let err = LabelTable::load(
            std::io::BufReader::new(Broken),
            Path::new("synsets.txt"),
            Cursor::new(WORDS),
            Path::new("synset_words.txt"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OcclusionError::LabelTableIo(ref p, _) if p == Path::new("synsets.txt")
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = LabelTable::open("/no/such/synsets.txt", "/no/such/words.txt").unwrap_err();
        assert!(matches!(err, OcclusionError::LabelTableIo(..)));
    }
}
