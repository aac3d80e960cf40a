//! 命令行工具依赖的通用组件.

use std::io;
use std::path::{Path, PathBuf};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: io::Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 初始化日志. 默认级别为 `info`, 可由环境变量 `RUST_LOG` 覆盖.
///
/// 重复初始化时静默忽略.
pub fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init();
}

/// 获取本地数据集目录 `$HOME/dataset` 下的路径.
///
/// 如果无法获取 home 目录, 则返回 `None`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}
