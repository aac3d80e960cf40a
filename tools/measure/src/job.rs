//! 测量任务描述 (json).

use ct_cortex::roi::{AnchoredRoi, InitRoiError, Quad};
use ct_cortex::thickness::{InputError, MeasureSpec, Mode, ThresholdState};
use ct_cortex::{Calibration, CtStack, Point};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 单个 ROI.
#[derive(Debug, Deserialize)]
pub struct RoiJob {
    /// 切片索引 (从 0 开始).
    pub slice: usize,

    /// 顶点 `[x, y]`, 应恰好 4 个.
    pub points: Vec<Point>,
}

impl RoiJob {
    fn to_roi(&self) -> Result<AnchoredRoi, InitRoiError> {
        Ok(AnchoredRoi::new(
            self.slice,
            Quad::try_from(self.points.as_slice())?,
        ))
    }
}

/// 测量任务.
#[derive(Debug, Deserialize)]
pub struct Job {
    /// 图像标题.
    pub title: String,

    /// 第一个 ROI.
    pub first: RoiJob,

    /// 第二个 ROI.
    pub second: RoiJob,

    /// 阈值. 缺省时取显示范围推出区间的中点.
    #[serde(default)]
    pub threshold: Option<i32>,

    /// 由显示范围推出阈值区间时使用的标定.
    #[serde(default)]
    pub calibration: Calibration,

    /// 报告追加写入的文件.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// 是否以预览模式运行.
    #[serde(default)]
    pub preview: bool,

    /// 预览模式下, 着色后的预览切片图像的保存路径.
    #[serde(default)]
    pub preview_image: Option<PathBuf>,
}

/// 任务转换错误.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// 读取失败.
    #[error("无法读取任务文件 {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// 解析失败.
    #[error("无法解析任务文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// ROI 不合法.
    #[error(transparent)]
    Roi(#[from] InitRoiError),

    /// 阈值等输入不合法.
    #[error(transparent)]
    Input(#[from] InputError),
}

impl Job {
    /// 从 json 文件加载.
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let data = fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data).map_err(|source| JobError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 从 json 文本解析.
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// 推出阈值状态.
    ///
    /// 堆栈有显示范围时, 区间由显示范围和标定推出, 再以任务中的阈值 (若有) 覆盖;
    /// 否则任务必须给出阈值, 区间退化为该值本身.
    fn threshold_for(&self, stack: &CtStack) -> Result<ThresholdState, InputError> {
        let state = match stack.display_range() {
            Some(r) => ThresholdState::from_display_range(r, self.calibration)?,
            None => {
                let t = self.threshold.ok_or(InputError::BadThreshold)?;
                ThresholdState::new(t, t, t)?
            }
        };
        match self.threshold {
            Some(t) => state.with_value(t),
            None => Ok(state),
        }
    }

    /// 结合堆栈信息, 构建测量参数.
    pub fn to_spec(&self, stack: &CtStack) -> Result<MeasureSpec, JobError> {
        Ok(MeasureSpec {
            title: self.title.clone(),
            first: self.first.to_roi()?,
            second: self.second.to_roi()?,
            threshold: self.threshold_for(stack)?,
            scale: stack.physical_scale(),
            mode: if self.preview {
                Mode::Preview
            } else {
                Mode::Batch
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Job, JobError};
    use ct_cortex::thickness::{InputError, Mode};
    use ct_cortex::CtStack;

    const JOB: &str = r#"{
        "title": "knee",
        "first": { "slice": 0, "points": [[0, 0], [4, 0], [4, 4], [0, 4]] },
        "second": { "slice": 1, "points": [[1, 1], [5, 1], [5, 5], [1, 5]] },
        "output": "out.txt"
    }"#;

    fn stack() -> CtStack {
        let data = (0..2 * 4 * 4).map(|v| v as f32).collect();
        CtStack::from_shape_vec((2, 4, 4), data, [1.5, 0.25, 0.25], "mm").unwrap()
    }

    #[test]
    fn test_job_to_spec() {
        let job = Job::parse(JOB).unwrap();
        assert!(job.threshold.is_none());
        let spec = job.to_spec(&stack()).unwrap();
        assert_eq!(spec.mode, Mode::Batch);
        assert_eq!(spec.second.quad.points()[2], (5.0, 5.0));
        // 显示范围 [0, 31].
        let t = spec.threshold;
        assert_eq!((t.value(), t.min(), t.max()), (15, 0, 31));
        assert_eq!(spec.scale.in_plane, 0.25);
        assert_eq!(spec.scale.inter_slice, 1.5);
    }

    #[test]
    fn test_job_threshold_override() {
        let mut job = Job::parse(JOB).unwrap();
        job.threshold = Some(20);
        assert_eq!(job.to_spec(&stack()).unwrap().threshold.value(), 20);
        job.threshold = Some(40);
        assert!(matches!(
            job.to_spec(&stack()),
            Err(JobError::Input(InputError::BadThreshold))
        ));
    }

    #[test]
    fn test_job_bad_roi() {
        let text = JOB.replace("[[1, 1], [5, 1], [5, 5], [1, 5]]", "[[1, 1], [5, 1]]");
        let job = Job::parse(&text).unwrap();
        assert!(matches!(job.to_spec(&stack()), Err(JobError::Roi(_))));
    }
}
