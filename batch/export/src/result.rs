//! 导出结果汇总.

use std::io::{self, Write};
use std::time::Duration;

/// 批量导出的最终结果.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// 写入的病例数.
    pub written: usize,

    /// 因文件缺失跳过的病例数.
    pub skipped: usize,

    /// 失败的病例数.
    pub failed: usize,

    /// 总耗时.
    pub elapsed: Duration,
}

impl ExportSummary {
    /// 病例总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed
    }

    /// 将结果写进 `w` 中.
    pub fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        const S4: &str = "    ";

        writeln!(w, "Export summary ({} cases):", self.total())?;
        writeln!(w, "{S4}Cases written: {}", self.written)?;
        writeln!(w, "{S4}Cases skipped: {}", self.skipped)?;
        writeln!(w, "{S4}Cases failed: {}", self.failed)?;
        write!(w, "{S4}Elapsed: {:.3} s", self.elapsed.as_secs_f64())?;
        Ok(())
    }

    /// 打印结果.
    pub fn report(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        utils::sep_to(&mut out)?;
        self.describe_into(&mut out)?;
        writeln!(out)?;
        utils::sep_to(&mut out)
    }
}
