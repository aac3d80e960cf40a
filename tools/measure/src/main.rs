//! 软骨下骨层平均厚度测量.
//!
//! 从 `$CT_CORTEX_SCAN` 读取 nii 切片堆栈, 从 `$CT_CORTEX_JOB` 读取测量任务,
//! 并把单行报告追加到任务指定的输出文件.

mod job;
mod result;
mod runner;

fn main() {
    utils::init_logger();
    if let Err(e) = runner::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
