//! 运行结果.

use occ_berry::labels::Legend;
use occ_berry::sweep::SweepOutcome;
use std::io::{self, Write};

/// 将扫描结果写进 `w` 中.
fn describe_into<W: Write>(r: &SweepReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn range_to_display(r: Option<(f64, f64)>) -> String {
        match r {
            Some((lo, hi)) => format!("[{lo:.6}, {hi:.6}]"),
            None => "/".to_string(),
        }
    }

    let maps = &r.outcome.maps;
    writeln!(w, "Image `{}`:", r.image)?;
    writeln!(w, "{S4}True class: {}", r.true_class)?;
    writeln!(w, "{S4}Most active filter: {}", r.outcome.filter)?;
    writeln!(w, "{S4}Occluded images processed: {}", r.outcome.processed)?;
    let (rows, cols) = maps.shape();
    writeln!(w, "{S4}Heat map shape: {rows} x {cols}")?;
    writeln!(w, "{S4}Kept rows: {:?}", maps.kept_rows())?;
    writeln!(w, "{S4}Kept columns: {:?}", maps.kept_cols())?;
    writeln!(
        w,
        "{S4}True class probability range: {}",
        range_to_display(maps.prob_range())
    )?;
    write!(w, "{S4}Legend:")?;
    if r.legend.is_empty() {
        write!(w, " /")?;
    }
    for (idx, name) in r.legend.iter() {
        write!(w, "\n{S4}{S4}{idx}: {name}")?;
    }
    Ok(())
}

/// 单张图像的最终结果.
#[derive(Debug)]
pub struct SweepReport {
    image: String,
    true_class: usize,
    outcome: SweepOutcome,
    legend: Legend,
}

impl SweepReport {
    /// 组装结果.
    pub fn new(image: String, true_class: usize, outcome: SweepOutcome, legend: Legend) -> Self {
        Self {
            image,
            true_class,
            outcome,
            legend,
        }
    }

    /// 打印运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        utils::sep();
        let mut buf = Vec::with_capacity(512);
        describe_into(self, &mut buf)?;
        println!("{}", String::from_utf8_lossy(&buf));
        utils::sep();
        Ok(())
    }
}
