use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error};

static HEADER: &str = "links";

/// 记录所有图片链接的 CSV 文件
///
/// 创建时截断文件并写入表头，drop 时刷新缓冲，出错提前返回也不会丢数据。
pub struct Manifest {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    count: usize,
}

impl Manifest {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("无法创建 {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            count: 0,
        })
    }

    pub fn append(&mut self, url: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("{} 已关闭", self.path.display()))?;
        writeln!(writer, "{}", url)
            .with_context(|| format!("写入 {} 失败", self.path.display()))?;
        self.count += 1;
        Ok(())
    }

    /// 已写入的链接数量（不含表头）
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .with_context(|| format!("写入 {} 失败", self.path.display()))?;
        }
        debug!("{} 已关闭，共 {} 条链接", self.path.display(), self.count);
        Ok(())
    }
}

impl Drop for Manifest {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("关闭 {} 时出错: {}", self.path.display(), e);
            }
        }
    }
}
