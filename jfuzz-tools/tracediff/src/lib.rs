//! Execution trace comparison.
//!
//! Walks two interpreter trace logs line by line and reports the first
//! points where they disagree. A trace record looks like
//!
//! ```text
//! [12] 1043 7 0x000000000000002a 0x00007f3c fast_iload_1
//! ```
//!
//! with the step count, bytecode index, top-of-stack value (hex) and, in
//! the sixth field, the opcode. Lines of any other shape are not records.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

/// Top-of-stack values closer than this are a suspicious near miss.
pub const TOS_TOLERANCE: u64 = 100;

/// Opcode after which the right-hand trace carries one extra line.
pub const REALIGN_OPCODE: &str = "iload2";

const TOS_MASK: u64 = 0xffff_ffff;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to open trace {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type TraceResult<T> = Result<T, TraceError>;

/// One parsed trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub step: i64,
    pub index: i64,
    pub opcode: String,
    /// Top of stack, masked to 32 bits.
    pub tos: u32,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {:#x})",
            self.step, self.index, self.opcode, self.tos
        )
    }
}

/// Parses a trace line, returning `None` for anything that is not a record.
pub fn parse_trace_line(line: &str) -> Option<TraceRecord> {
    if !line.starts_with('[') {
        return None;
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let step = fields[1].parse().ok()?;
    let index = fields[2].parse().ok()?;
    let tos = parse_hex(fields[3])? & TOS_MASK;

    Some(TraceRecord {
        step,
        index,
        opcode: normalize_opcode(fields[5]),
        tos: tos as u32,
    })
}

/// Parses a hexadecimal value with optional sign and `0x` prefix,
/// keeping the low 64 bits of its two's complement form.
fn parse_hex(field: &str) -> Option<u64> {
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field.strip_prefix('+').unwrap_or(field)),
    };
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let magnitude = u128::from_str_radix(digits, 16).ok()? as u64;
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

/// Maps interpreter-specific opcode spellings onto a common name.
pub fn normalize_opcode(raw: &str) -> String {
    let opcode = raw.replace("fast_", "");
    let opcode = match opcode.find('[') {
        Some(pos) => &opcode[..pos],
        None => opcode.as_str(),
    };
    match opcode {
        "linearswitch" => "lookupswitch".to_string(),
        other => other.to_string(),
    }
}

/// How two top-of-stack values relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TosMatch {
    Equal,
    /// Different, but too close to be a coincidence.
    NearMiss,
    /// Far apart; most likely unrelated stack contents.
    Unrelated,
}

impl TosMatch {
    pub fn is_divergence(self) -> bool {
        self == TosMatch::NearMiss
    }
}

pub fn compare_tos(left: u32, right: u32) -> TosMatch {
    if left == right {
        TosMatch::Equal
    } else if u64::from(left.abs_diff(right)) < TOS_TOLERANCE {
        TosMatch::NearMiss
    } else {
        TosMatch::Unrelated
    }
}

/// A point where the traces disagree. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// One side has a record where the other does not.
    Structural { left_line: usize, right_line: usize },
    /// Both sides have records that differ.
    Record {
        left_line: usize,
        right_line: usize,
        left: TraceRecord,
        right: TraceRecord,
    },
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Structural {
                left_line,
                right_line,
            } => write!(
                f,
                "Mismatch at line {left_line} (right line {right_line}): record on one side only"
            ),
            Divergence::Record {
                left_line,
                right_line,
                left,
                right,
            } => write!(
                f,
                "Mismatch at line {left_line} (right line {right_line})\n  \
                 left:  {left}\n  right: {right}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Stop at the first record mismatch instead of collecting all.
    pub stop_at_first: bool,
    /// Include the step count in record equality.
    pub compare_step: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            stop_at_first: false,
            compare_step: true,
        }
    }
}

/// Outcome of a comparison run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// Record pairs compared.
    pub compared: usize,
    /// Line pairs where neither side was a record.
    pub skipped: usize,
    pub divergences: Vec<Divergence>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.divergences.is_empty()
    }
}

fn records_agree(left: &TraceRecord, right: &TraceRecord, options: &CompareOptions) -> bool {
    (!options.compare_step || left.step == right.step)
        && left.index == right.index
        && left.opcode == right.opcode
        && !compare_tos(left.tos, right.tos).is_divergence()
}

/// Compares two traces until either runs out of lines.
///
/// A structural mismatch always ends the walk since the streams can no
/// longer be aligned.
pub fn compare_traces<L, R>(
    mut left: L,
    mut right: R,
    options: &CompareOptions,
) -> TraceResult<Report>
where
    L: BufRead,
    R: BufRead,
{
    let mut report = Report::default();
    let mut left_buf = String::new();
    let mut right_buf = String::new();
    let mut left_line = 0;
    let mut right_line = 0;

    loop {
        left_buf.clear();
        right_buf.clear();
        if left.read_line(&mut left_buf)? == 0 || right.read_line(&mut right_buf)? == 0 {
            break;
        }
        left_line += 1;
        right_line += 1;

        match (parse_trace_line(&left_buf), parse_trace_line(&right_buf)) {
            (None, None) => {
                trace!("Skip line {}", left_line);
                report.skipped += 1;
            }
            (Some(_), None) | (None, Some(_)) => {
                report.divergences.push(Divergence::Structural {
                    left_line,
                    right_line,
                });
                break;
            }
            (Some(l), Some(_)) if l.opcode == REALIGN_OPCODE => {
                right_buf.clear();
                if right.read_line(&mut right_buf)? > 0 {
                    right_line += 1;
                }
                debug!("Realigned after {} at line {}", REALIGN_OPCODE, left_line);
            }
            (Some(l), Some(r)) => {
                report.compared += 1;
                if !records_agree(&l, &r, options) {
                    report.divergences.push(Divergence::Record {
                        left_line,
                        right_line,
                        left: l,
                        right: r,
                    });
                    if options.stop_at_first {
                        break;
                    }
                }
            }
        }
    }

    debug!(
        "Compared {} records, skipped {} lines",
        report.compared, report.skipped
    );
    Ok(report)
}

fn open(path: &Path) -> TraceResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Compares the trace files at `left` and `right`.
pub fn compare_files(left: &Path, right: &Path, options: &CompareOptions) -> TraceResult<Report> {
    compare_traces(open(left)?, open(right)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    fn record(step: i64, index: i64, opcode: &str, tos: u32) -> String {
        format!("[7] {step} {index} {tos:#018x} 0x00007f3c {opcode}\n")
    }

    fn run(left: &str, right: &str, options: CompareOptions) -> Report {
        compare_traces(Cursor::new(left), Cursor::new(right), &options).unwrap()
    }

    #[test]
    fn test_parse_record() {
        let parsed = parse_trace_line("[12] 1043 7 0xffffffff0000002a 0x1 fast_iload_1").unwrap();
        assert_eq!(
            parsed,
            TraceRecord {
                step: 1043,
                index: 7,
                opcode: "iload_1".to_string(),
                tos: 0x2a,
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_records() {
        assert_eq!(parse_trace_line("Executing main"), None);
        assert_eq!(parse_trace_line("[12] abc 7 0x2a 0x1 iadd"), None);
        assert_eq!(parse_trace_line("[12] 3 7 0x2a"), None);
        assert_eq!(parse_trace_line("[12] 3 7 zz 0x1 iadd"), None);
    }

    #[test]
    fn test_signed_counters_parse() {
        let parsed = parse_trace_line("[3] -1 -4 0x0 0x0 nop").unwrap();
        assert_eq!((parsed.step, parsed.index), (-1, -4));

        let left = "[3] -1 0 0x5 0x0 iconst_5\n";
        let right = "[3] -1 0 0x5 0x0 iconst_5\n";
        let report = run(left, right, CompareOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.compared, 1);
    }

    #[test]
    fn test_negative_tos_is_masked() {
        let parsed = parse_trace_line("[1] 1 1 -0x1 0 iconst_m1").unwrap();
        assert_eq!(parsed.tos, u32::MAX);
    }

    #[test]
    fn test_normalize_opcode() {
        assert_eq!(normalize_opcode("fast_agetfield"), "agetfield");
        assert_eq!(normalize_opcode("invokevirtual[3]"), "invokevirtual");
        assert_eq!(normalize_opcode("fast_linearswitch"), "lookupswitch");
        assert_eq!(normalize_opcode("iadd"), "iadd");
    }

    #[test]
    fn test_tos_tolerance() {
        assert_eq!(compare_tos(5, 5), TosMatch::Equal);
        assert_eq!(compare_tos(5, 104), TosMatch::NearMiss);
        assert_eq!(compare_tos(104, 5), TosMatch::NearMiss);
        assert_eq!(compare_tos(5, 105), TosMatch::Unrelated);
        assert_eq!(compare_tos(0, u32::MAX), TosMatch::Unrelated);
    }

    #[test]
    fn test_identical_traces() {
        let trace = format!(
            "header\n{}{}",
            record(1, 0, "iconst_1", 1),
            record(2, 1, "ireturn", 1)
        );
        let report = run(&trace, &trace, CompareOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.compared, 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_unrelated_tos_is_accepted() {
        let left = record(1, 0, "iadd", 0x1000);
        let right = record(1, 0, "iadd", 0x7f00_0000);
        assert!(run(&left, &right, CompareOptions::default()).is_clean());
    }

    #[test]
    fn test_near_miss_continues_by_default() {
        let left = format!("{}{}", record(1, 0, "iadd", 10), record(2, 1, "isub", 3));
        let right = format!("{}{}", record(1, 0, "iadd", 11), record(2, 1, "isub", 4));

        let report = run(&left, &right, CompareOptions::default());
        assert_eq!(report.divergences.len(), 2);

        let options = CompareOptions {
            stop_at_first: true,
            ..CompareOptions::default()
        };
        let report = run(&left, &right, options);
        assert_eq!(report.divergences.len(), 1);
        assert_eq!(report.compared, 1);
    }

    #[test]
    fn test_structural_mismatch_stops() {
        let left = format!("{}{}", record(1, 0, "iadd", 1), record(2, 1, "iadd", 1));
        let right = format!("noise\n{}", record(2, 1, "iadd", 1));

        let report = run(&left, &right, CompareOptions::default());
        assert_eq!(
            report.divergences,
            vec![Divergence::Structural {
                left_line: 1,
                right_line: 1
            }]
        );
    }

    #[test]
    fn test_iload2_realigns_right_side() {
        let left = format!("{}{}", record(1, 0, "iload2", 0), record(2, 1, "iadd", 9));
        let right = format!(
            "{}{}{}",
            record(1, 0, "iload", 0),
            record(1, 0, "iload", 0),
            record(2, 1, "iadd", 9)
        );

        let report = run(&left, &right, CompareOptions::default());
        assert!(report.is_clean(), "{:?}", report.divergences);
        assert_eq!(report.compared, 1);
    }

    #[test]
    fn test_step_comparison_can_be_disabled() {
        let left = record(1, 4, "iadd", 9);
        let right = record(2, 4, "iadd", 9);
        assert!(!run(&left, &right, CompareOptions::default()).is_clean());

        let options = CompareOptions {
            compare_step: false,
            ..CompareOptions::default()
        };
        assert!(run(&left, &right, options).is_clean());
    }

    #[test]
    fn test_shorter_trace_ends_comparison() {
        let left = format!("{}{}", record(1, 0, "iadd", 1), record(2, 1, "iadd", 1));
        let right = record(1, 0, "iadd", 1);
        let report = run(&left, &right, CompareOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.compared, 1);
    }

    #[test]
    fn test_compare_files() {
        let dir = tempfile::tempdir().unwrap();
        let left_path = dir.path().join("trace_riscv");
        let right_path = dir.path().join("trace_zero");
        let mut left = File::create(&left_path).unwrap();
        let mut right = File::create(&right_path).unwrap();
        left.write_all(record(1, 0, "iadd", 1).as_bytes()).unwrap();
        right.write_all(record(1, 0, "isub", 1).as_bytes()).unwrap();

        let report = compare_files(&left_path, &right_path, &CompareOptions::default()).unwrap();
        assert_eq!(report.divergences.len(), 1);

        let missing_path = dir.path().join("nope");
        let missing = compare_files(&missing_path, &right_path, &CompareOptions::default());
        assert!(matches!(missing, Err(TraceError::Open { .. })));
    }
}
