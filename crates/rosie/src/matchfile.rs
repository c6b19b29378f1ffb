// Record-by-record matching over streams
// Input is split on '\n' (a '\r' before it stays in the record). Each
// record is matched on its own; matches go to the output stream in the
// chosen encoding, non-matches go verbatim to the error stream. A match
// the engine aborts stops processing with an error.

use crate::rosie_vm::{RosieError, RosieResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Where `match_file` reads and writes. `None` or an empty path means the
/// process's standard stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchFileRequest<'a> {
    pub input: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub errors: Option<&'a Path>,
    /// Treat the whole input as a single record
    pub whole_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFileCounts {
    /// Records read
    pub cin: u64,
    /// Records that matched
    pub cout: u64,
    /// Records that did not match
    pub cerr: u64,
}

/// What happened to one record.
pub enum RecordOutcome {
    /// Encoded match; `None` when the encoder carries no payload
    Matched(Option<Vec<u8>>),
    Unmatched,
    /// The engine aborted the match; processing stops here
    Aborted,
}

fn given(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn stream_name(path: Option<&Path>, fallback: &str) -> PathBuf {
    given(path).map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(fallback))
}

fn open_input(path: Option<&Path>) -> RosieResult<Box<dyn BufRead>> {
    match given(path) {
        Some(p) => {
            let file = File::open(p).map_err(|e| RosieError::io(p, e))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(path: Option<&Path>, stderr: bool) -> RosieResult<Box<dyn Write>> {
    match given(path) {
        Some(p) => {
            let file = File::create(p).map_err(|e| RosieError::io(p, e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None if stderr => Ok(Box::new(io::stderr())),
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Run `match_record` over every record of the request's input.
pub fn match_stream<F>(request: &MatchFileRequest, mut match_record: F) -> RosieResult<MatchFileCounts>
where
    F: FnMut(&[u8]) -> RosieResult<RecordOutcome>,
{
    let in_name = stream_name(request.input, "<stdin>");
    let out_name = stream_name(request.output, "<stdout>");
    let err_name = stream_name(request.errors, "<stderr>");

    let mut input = open_input(request.input)?;
    let mut output = open_output(request.output, false)?;
    let mut errors = open_output(request.errors, true)?;

    let mut counts = MatchFileCounts::default();
    let mut record = Vec::new();

    let mut handle = |record: &[u8], counts: &mut MatchFileCounts| -> RosieResult<()> {
        counts.cin += 1;
        match match_record(record)? {
            RecordOutcome::Matched(data) => {
                counts.cout += 1;
                if let Some(data) = data {
                    output
                        .write_all(&data)
                        .and_then(|_| output.write_all(b"\n"))
                        .map_err(|e| RosieError::io(&out_name, e))?;
                }
            }
            RecordOutcome::Unmatched => {
                counts.cerr += 1;
                errors
                    .write_all(record)
                    .and_then(|_| errors.write_all(b"\n"))
                    .map_err(|e| RosieError::io(&err_name, e))?;
            }
            RecordOutcome::Aborted => return Err(RosieError::Abend { record: counts.cin }),
        }
        Ok(())
    };

    if request.whole_file {
        input
            .read_to_end(&mut record)
            .map_err(|e| RosieError::io(&in_name, e))?;
        if !record.is_empty() {
            handle(&record, &mut counts)?;
        }
    } else {
        loop {
            record.clear();
            let n = input
                .read_until(b'\n', &mut record)
                .map_err(|e| RosieError::io(&in_name, e))?;
            if n == 0 {
                break;
            }
            if record.last() == Some(&b'\n') {
                record.pop();
            }
            handle(&record, &mut counts)?;
        }
    }

    drop(handle);
    output.flush().map_err(|e| RosieError::io(&out_name, e))?;
    errors.flush().map_err(|e| RosieError::io(&err_name, e))?;
    Ok(counts)
}
