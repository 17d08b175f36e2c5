//! Writes the result document and the console summary.

use common::{Direction, TestResult};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write `result` as JSON to `path`, creating parent directories as needed.
pub fn write_result(result: &TestResult, path: &Path, pretty: bool) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, result)?;
    } else {
        serde_json::to_writer(&mut writer, result)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Human-readable summary, one block per direction with data.
pub fn render_summary(result: &TestResult) -> String {
    let mut out = String::from("=== SUMMARY ===\n");
    for direction in Direction::ALL {
        let count = result
            .samples
            .iter()
            .filter(|s| s.direction == direction)
            .count();
        let _ = writeln!(out, "{:<10} samples: {}", direction.as_str(), count);

        let Some(summary) = result.summary.get(&direction) else {
            let _ = writeln!(out, "  no usable data");
            continue;
        };
        let _ = writeln!(
            out,
            "  BW Mbps: {:.2} avg | {:.2} min | {:.2} max | {:.2} std",
            summary.avg_mbps, summary.min_mbps, summary.max_mbps, summary.std_mbps
        );
        if let Some(jitter) = summary.avg_jitter_ms {
            let _ = writeln!(out, "  Jitter ms (avg): {:.3}", jitter);
        }
        if let Some(loss) = summary.avg_loss_pct {
            let _ = writeln!(out, "  Loss % (avg):    {:.3}", loss);
        }
    }
    out
}
