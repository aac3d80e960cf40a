//! 测量结果的输出.

use ct_cortex::thickness::{Preview, Thickness};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// 将 `t` 的单行报告写进 `w` 中.
fn describe_into<W: Write>(t: &Thickness, w: &mut W) -> io::Result<()> {
    writeln!(w, "{t}")
}

/// 以追加模式将报告写入 `path`. 文件不存在时创建.
pub fn append_report<P: AsRef<Path>>(path: P, t: &Thickness) -> io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    describe_into(t, &mut f)
}

/// 保存报告. 没有指定输出文件, 或写入失败时仅记录日志.
pub fn save_or_warn(output: Option<&Path>, t: &Thickness) {
    match output {
        None => log::warn!("No filename specified, unable to save results"),
        Some(p) => match append_report(p, t) {
            Ok(()) => log::info!("报告已追加到 {}", p.display()),
            Err(e) => log::error!("无法写入 {}: {e}", p.display()),
        },
    }
}

/// 在终端展示批量测量结果.
pub fn show(t: &Thickness) {
    utils::sep();
    println!(
        "The Average Thickness of your sample is {:?} {}",
        t.average(),
        t.unit()
    );
    println!("The depth of your sample is {:?} {}", t.depth(), t.unit());
    if t.excluded_slices() > 0 {
        println!(
            "{} slice(s) have been excluded from the analysis",
            t.excluded_slices()
        );
    }
    utils::sep();
}

/// 在终端展示预览结果.
pub fn show_preview(p: &Preview) {
    utils::sep();
    match p {
        Preview::Converged { gap, state } => {
            println!("Preview gap: {gap:?} px at threshold {}", state.value())
        }
        Preview::Exhausted { state } => println!(
            "Preview failed, threshold range exhausted at {} (range [{}, {}])",
            state.value(),
            state.min(),
            state.max()
        ),
    }
    utils::sep();
}

#[cfg(test)]
mod tests {
    use super::describe_into;
    use ct_cortex::roi::{AnchoredRoi, Quad};
    use ct_cortex::thickness::{MeasureSpec, Mode, SliceAggregator, ThresholdState};
    use ct_cortex::{CtStack, PhysicalScale};

    #[test]
    fn test_describe_into() {
        // 两张切片, 每张为间隔 3 列的两条竖线.
        let data = (0..2 * 10 * 10)
            .map(|i| {
                let w = i % 10;
                if w == 3 || w == 6 {
                    1000.0
                } else {
                    0.0
                }
            })
            .collect();
        let stack = CtStack::from_shape_vec((2, 10, 10), data, [3.0, 0.5, 0.5], "mm").unwrap();
        let quad = Quad::new([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).unwrap();
        let spec = MeasureSpec {
            title: "lines".to_string(),
            first: AnchoredRoi::new(0, quad),
            second: AnchoredRoi::new(1, quad),
            threshold: ThresholdState::new(500, 0, 1000).unwrap(),
            scale: PhysicalScale::new(0.5, 3.0, "mm"),
            mode: Mode::Batch,
        };
        let t = SliceAggregator::new(&stack, spec)
            .unwrap()
            .run_batch()
            .unwrap();

        let mut buf = Vec::new();
        describe_into(&t, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Image: lines Average thickness: 2.0 mm depth: 6.0 mm\n"
        );
    }
}
