//! 输入文件定位与加载.

use crate::home_dataset_dir_with;
use ct_cortex::CtStack;
use std::env;
use std::path::{Path, PathBuf};

/// 切片堆栈路径的环境变量.
pub const SCAN_ENV: &str = "CT_CORTEX_SCAN";

/// 测量任务路径的环境变量.
pub const JOB_ENV: &str = "CT_CORTEX_JOB";

/// 环境变量 `key` 非空时返回其值, 否则返回 `$HOME/dataset/cortex/<file>`.
fn from_env_or_home(key: &str, file: &str) -> Option<PathBuf> {
    match env::var(key) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["cortex", file]),
    }
}

/// 获取 nii 切片堆栈路径.
///
/// 1. 若环境变量 `$CT_CORTEX_SCAN` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cortex/scan.nii`.
pub fn scan_path_from_env_or_home() -> Option<PathBuf> {
    from_env_or_home(SCAN_ENV, "scan.nii")
}

/// 获取测量任务 (json) 路径.
///
/// 1. 若环境变量 `$CT_CORTEX_JOB` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cortex/job.json`.
pub fn job_path_from_env_or_home() -> Option<PathBuf> {
    from_env_or_home(JOB_ENV, "job.json")
}

/// 打开 nii 切片堆栈, 并记录其基本信息.
pub fn open_stack<P: AsRef<Path>>(path: P) -> nifti::Result<CtStack> {
    use ct_cortex::StackAttr;

    let stack = CtStack::open(path.as_ref())?;
    log::info!(
        "已加载 {}: 形状 {:?}, 体素 {:?} {}",
        path.as_ref().display(),
        stack.shape(),
        stack.pix_dim(),
        stack.unit()
    );
    Ok(stack)
}
