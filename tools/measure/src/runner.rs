//! 程序运行函数.

use crate::job::{Job, JobError};
use crate::result;
use ct_cortex::thickness::{InputError, MeasureError, Outcome, SliceAggregator};
use ct_cortex::ImgWriteVis;
use utils::loader;

/// 运行错误.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// 既没有设置环境变量, 也无法获取 home 目录.
    #[error("无法定位 {0}: 请设置环境变量 ${0}")]
    NoPath(&'static str),

    /// 无法打开切片堆栈.
    #[error("无法打开切片堆栈: {0}")]
    Open(#[from] nifti::NiftiError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// 实际运行.
pub fn run() -> Result<(), RunError> {
    let scan_path =
        loader::scan_path_from_env_or_home().ok_or(RunError::NoPath(loader::SCAN_ENV))?;
    let job_path = loader::job_path_from_env_or_home().ok_or(RunError::NoPath(loader::JOB_ENV))?;

    let job = Job::load(&job_path)?;
    let mut stack = loader::open_stack(&scan_path)?;
    let spec = job.to_spec(&stack)?;

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(utils::cpus())
        .build_global()
    {
        log::warn!("线程池初始化失败, 使用默认配置: {e}");
    }

    let (outcome, paint) = {
        let mut agg = SliceAggregator::new(&stack, spec)?;
        log::info!("测量 {} 张切片 (阈值 {})", agg.count(), agg.threshold().value());
        let outcome = agg.run()?;
        let paint = match outcome {
            Outcome::Preview(_) => agg.preview_paint(),
            Outcome::Batch(_) => None,
        };
        (outcome, paint)
    };

    match outcome {
        Outcome::Batch(t) => {
            result::show(&t);
            result::save_or_warn(job.output.as_deref(), &t);
        }
        Outcome::Preview(p) => {
            result::show_preview(&p);
            if let (Some(path), Some(paint)) = (job.preview_image.as_deref(), paint) {
                let mirror = paint.apply(&mut stack);
                match stack.slice_at(paint.slice()).save(path) {
                    Ok(()) => log::info!("预览图像已保存到 {}", path.display()),
                    Err(e) => log::error!("无法保存预览图像 {}: {e}", path.display()),
                }
                stack.slice_at_mut(paint.slice()).resume(&mirror);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::RunError;
    use std::error::Error;
    use utils::loader;

    #[test]
    fn test_open_error_keeps_source() {
        let e = RunError::from(loader::open_stack("/nonexistent/scan.nii").unwrap_err());
        assert!(matches!(e, RunError::Open(_)));
        assert!(e.source().is_some());
    }
}
