//! File writers for spot lists and accumulated images.

use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use spotpix_algorithms::AccumulatedImage;
use spotpix_core::{FrameDiagnostics, FrameResult, Spot};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output format of a [`ResultWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One spot per line: `frame,method,x,y,intensity`.
    Csv,
    /// 29 bytes per spot, little-endian:
    /// u32 (frame) + u8 (method) + f64 (x) + f64 (y) + f64 (intensity).
    Binary,
    /// One [`FrameSummary`] JSON object per line.
    JsonLines,
}

impl OutputFormat {
    /// Picks the format from a file extension (`csv`, `bin`, `jsonl`).
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "csv" => Some(Self::Csv),
            "bin" => Some(Self::Binary),
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Per-frame record written in JSON-lines output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Frame index in the input.
    pub frame: u32,
    /// Number of electrons (hybrid list if enabled, CoM list otherwise).
    pub electrons: usize,
    /// Center-of-mass spot count.
    pub com_count: usize,
    /// Spots from pileup decomposition.
    pub decomposed_count: usize,
    /// Sync signal detected in this frame.
    pub signal_present: bool,
    /// Mean signal-region intensity.
    pub avg_signal: Option<f64>,
    /// Mean baseline-region intensity.
    pub avg_baseline: Option<f64>,
    /// Pipeline time in microseconds.
    pub computation_time_us: u64,
    /// Degradation counters.
    pub diagnostics: FrameDiagnostics,
    /// The electrons themselves.
    pub spots: Vec<Spot>,
}

impl FrameSummary {
    /// Builds the summary of frame `frame`.
    #[must_use]
    pub fn new(frame: u32, result: &FrameResult) -> Self {
        Self {
            frame,
            electrons: result.electrons().len(),
            com_count: result.com_spots.len(),
            decomposed_count: result.decomposed_count(),
            signal_present: result.sync.signal_present,
            avg_signal: result.sync.avg_signal,
            avg_baseline: result.sync.avg_baseline,
            computation_time_us: u64::try_from(result.computation_time.as_micros()).unwrap_or(u64::MAX),
            diagnostics: result.diagnostics,
            spots: result.electrons().as_slice().to_vec(),
        }
    }
}

/// Writer for per-frame centroiding output.
///
/// Every frame contributes its electrons: the hybrid list when the hybrid
/// pass ran, the CoM list otherwise. The hybrid list holds every CoM spot
/// tagged `com`, so the CoM list is recovered from CSV or binary output by
/// keeping the `com` rows. JSON lines additionally carry the per-frame
/// `com_count` and `decomposed_count`.
pub struct ResultWriter {
    writer: BufWriter<File>,
    format: OutputFormat,
    frames_written: u64,
    spots_written: u64,
}

impl ResultWriter {
    /// Creates the output file and writes the CSV header if needed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        if format == OutputFormat::Csv {
            writeln!(writer, "frame,method,x,y,intensity")?;
        }
        debug!("writing {:?} output to {}", format, path.as_ref().display());
        Ok(Self {
            writer,
            format,
            frames_written: 0,
            spots_written: 0,
        })
    }

    /// Creates the output file with the format implied by its extension.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for an unknown extension.
    pub fn create_for_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = OutputFormat::from_path(&path).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "cannot infer output format from {}; use .csv, .bin or .jsonl",
                path.as_ref().display()
            ))
        })?;
        Self::create(path, format)
    }

    /// Writes one frame's electrons.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_frame(&mut self, frame: u32, result: &FrameResult) -> Result<()> {
        if result.is_degraded() {
            warn!(
                "frame {frame} output truncated: table exhausted={}, {} CoM / {} hybrid spots dropped, {} candidates dropped",
                result.diagnostics.region_table_exhausted,
                result.com_spots.dropped(),
                result.hybrid_spots.dropped(),
                result.diagnostics.candidates_dropped
            );
        }

        let spots = result.electrons();
        match self.format {
            OutputFormat::Csv => {
                for s in spots {
                    writeln!(
                        self.writer,
                        "{},{},{},{},{}",
                        frame,
                        s.method.label(),
                        s.x,
                        s.y,
                        s.intensity
                    )?;
                }
            }
            OutputFormat::Binary => {
                for s in spots {
                    self.writer.write_all(&frame.to_le_bytes())?;
                    self.writer.write_all(&[s.method.code()])?;
                    self.writer.write_all(&s.x.to_le_bytes())?;
                    self.writer.write_all(&s.y.to_le_bytes())?;
                    self.writer.write_all(&s.intensity.to_le_bytes())?;
                }
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &FrameSummary::new(frame, result))?;
                self.writer.write_all(b"\n")?;
            }
        }

        self.frames_written += 1;
        self.spots_written += spots.len() as u64;
        Ok(())
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Spots written so far.
    #[must_use]
    pub fn spots_written(&self) -> u64 {
        self.spots_written
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes rows of values as space-separated text, one line per row.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_rows<'a, P, I, T>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a [T]>,
    T: Display + 'a,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        let mut first = true;
        for value in row {
            if !first {
                writer.write_all(b" ")?;
            }
            write!(writer, "{value}")?;
            first = false;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes an accumulated image as space-separated text.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_accumulated_image<P: AsRef<Path>>(path: P, image: &AccumulatedImage) -> Result<()> {
    write_rows(path, image.rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotpix_core::{Rect, SpotList, SpotMethod};
    use tempfile::NamedTempFile;

    fn sample_result() -> FrameResult {
        let mut result = FrameResult {
            com_spots: SpotList::with_capacity(4),
            hybrid_spots: SpotList::with_capacity(4),
            hybrid_enabled: true,
            ..Default::default()
        };
        let com = Spot::new(1.5, 2.5, 40.0, SpotMethod::CenterOfMass);
        result.com_spots.push(com);
        result.hybrid_spots.push(com);
        result
            .hybrid_spots
            .push(Spot::new(10.25, 20.75, 80.0, SpotMethod::HybridGradient));
        result
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path("a/b.csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path("out.bin"), Some(OutputFormat::Binary));
        assert_eq!(OutputFormat::from_path("out.jsonl"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::from_path("out.txt"), None);
        assert_eq!(OutputFormat::from_path("out"), None);
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = ResultWriter::create(file.path(), OutputFormat::Csv).unwrap();
        writer.write_frame(7, &sample_result()).unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "frame,method,x,y,intensity");
        assert_eq!(lines[1], "7,com,1.5,2.5,40");
        assert_eq!(lines[2], "7,hybrid,10.25,20.75,80");
        assert_eq!(writer.spots_written(), 2);

        // the CoM list is the com-tagged subset
        let com_rows = lines[1..]
            .iter()
            .filter(|line| line.split(',').nth(1) == Some("com"))
            .count();
        assert_eq!(com_rows, sample_result().com_spots.len());
    }

    #[test]
    fn test_write_binary() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = ResultWriter::create(file.path(), OutputFormat::Binary).unwrap();
        writer.write_frame(3, &sample_result()).unwrap();
        writer.flush().unwrap();

        let data = std::fs::read(file.path()).unwrap();
        // 4 (u32) + 1 (u8) + 8 (f64) + 8 (f64) + 8 (f64) = 29 bytes per spot
        assert_eq!(data.len(), 2 * 29);
        assert_eq!(u32::from_le_bytes(data[29..33].try_into().unwrap()), 3);
        assert_eq!(data[33], SpotMethod::HybridGradient.code());
        assert_eq!(f64::from_le_bytes(data[34..42].try_into().unwrap()), 10.25);
    }

    #[test]
    fn test_write_json_lines() {
        let file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        let mut writer = ResultWriter::create_for_path(file.path()).unwrap();
        writer.write_frame(0, &sample_result()).unwrap();
        writer.write_frame(1, &FrameResult::default()).unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let summaries: Vec<FrameSummary> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].electrons, 2);
        assert_eq!(summaries[0].decomposed_count, 1);
        assert_eq!(summaries[0].spots[1].method, SpotMethod::HybridGradient);
        assert_eq!(summaries[1].frame, 1);
        assert_eq!(summaries[1].avg_signal, None);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = NamedTempFile::new().unwrap();
        let result = ResultWriter::create_for_path(file.path().with_extension("xyz"));
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_write_accumulated_image() {
        let mut image = AccumulatedImage::new(3, Rect::new(0, 3, 0, 3));
        image.add_spot(&Spot::new(1.0, 0.0, 1.0, SpotMethod::CenterOfMass));
        image.add_spot(&Spot::new(1.0, 0.0, 1.0, SpotMethod::CenterOfMass));
        image.add_spot(&Spot::new(2.0, 2.0, 1.0, SpotMethod::CenterOfMass));

        let file = NamedTempFile::new().unwrap();
        write_accumulated_image(file.path(), &image).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "0 2 0\n0 0 0\n0 0 1\n");
    }
}
