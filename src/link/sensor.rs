// Line-oriented sensor input
//
// Every read yields exactly one `Reading`. Timeouts and isolated channel
// faults (framing, parity, a dropped byte) become `Reading::Idle`, unparsable
// text becomes `Reading::Malformed`. Only a run of consecutive read failures
// longer than the sensor's error limit is reported as `LinkError`.

use std::io::{self, BufRead};

use crate::error::LinkError;

/// Result of one read attempt on the sensor channel
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// One parsed sample
    Sample(f64),
    /// A complete line that is not a finite number
    Malformed(String),
    /// No sample this iteration (timeout, blank line, partial line)
    Idle,
    /// The stream ended; no further samples will arrive
    Closed,
}

/// A source of raw sensor readings
pub trait SampleSource {
    fn read(&mut self) -> Result<Reading, LinkError>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn read(&mut self) -> Result<Reading, LinkError> {
        (**self).read()
    }
}

/// Parse one line of sensor text
///
/// Bytes are decoded as Latin-1 and surrounding whitespace is ignored.
pub fn parse_sample(line: &[u8]) -> Reading {
    let text: String = line.iter().map(|&b| b as char).collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Reading::Idle;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Reading::Sample(value),
        _ => Reading::Malformed(trimmed.to_string()),
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Consecutive non-timeout read failures tolerated before the link is declared gone
pub const DEFAULT_MAX_READ_ERRORS: u32 = 10;

/// Newline-delimited numeric samples over any buffered reader
///
/// A line split by a read timeout is kept and completed by later reads.
#[derive(Debug)]
pub struct LineSensor<R> {
    reader: R,
    pending: Vec<u8>,
    max_read_errors: u32,
    read_errors: u32,
}

impl<R: BufRead> LineSensor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(32),
            max_read_errors: DEFAULT_MAX_READ_ERRORS,
            read_errors: 0,
        }
    }

    /// Give up after `limit` consecutive failed reads (at least 1)
    pub fn with_error_limit(mut self, limit: u32) -> Self {
        self.max_read_errors = limit.max(1);
        self
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn take_line(&mut self) -> Reading {
        let reading = parse_sample(&self.pending);
        self.pending.clear();
        reading
    }
}

impl<R: BufRead> SampleSource for LineSensor<R> {
    fn read(&mut self) -> Result<Reading, LinkError> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(Reading::Closed),
            // Either a full line or the unterminated tail before end of stream
            Ok(_) => {
                self.read_errors = 0;
                Ok(self.take_line())
            }
            Err(err) if is_transient(&err) => Ok(Reading::Idle),
            Err(err) => {
                self.read_errors += 1;
                if self.read_errors >= self.max_read_errors {
                    return Err(LinkError::Disconnected {
                        reason: format!("{} ({} consecutive read errors)", err, self.read_errors),
                    });
                }
                log::warn!(
                    "[Sensor] Read error {}/{}: {}; skipping",
                    self.read_errors,
                    self.max_read_errors,
                    err
                );
                Ok(Reading::Idle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    fn sensor(text: &str) -> LineSensor<Cursor<Vec<u8>>> {
        LineSensor::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn drain<S: SampleSource>(source: &mut S) -> Vec<Reading> {
        let mut readings = Vec::new();
        loop {
            match source.read().unwrap() {
                Reading::Closed => return readings,
                reading => readings.push(reading),
            }
        }
    }

    #[test]
    fn test_parses_lines_and_skips_garbage() {
        let mut source = sensor("1.5\r\n  -2\nabc\n\n3e2\nnan\n4");
        assert_eq!(
            drain(&mut source),
            vec![
                Reading::Sample(1.5),
                Reading::Sample(-2.0),
                Reading::Malformed("abc".to_string()),
                Reading::Idle,
                Reading::Sample(300.0),
                Reading::Malformed("nan".to_string()),
                Reading::Sample(4.0),
            ]
        );
    }

    #[test]
    fn test_latin1_bytes_do_not_abort() {
        assert_eq!(
            parse_sample(&[0xff, b'1', b'\n']),
            Reading::Malformed("\u{ff}1".to_string())
        );
    }

    /// Reader that times out once in the middle of a line
    struct Stutter {
        chunks: Vec<io::Result<Vec<u8>>>,
    }

    impl Read for Stutter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            match self.chunks.remove(0) {
                Ok(bytes) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(err) => Err(err),
            }
        }
    }

    #[test]
    fn test_timeout_keeps_partial_line() {
        let reader = Stutter {
            chunks: vec![
                Ok(b"12".to_vec()),
                Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
                Ok(b".5\n".to_vec()),
            ],
        };
        let mut source = LineSensor::new(BufReader::new(reader));
        assert_eq!(source.read().unwrap(), Reading::Idle);
        assert_eq!(source.read().unwrap(), Reading::Sample(12.5));
        assert_eq!(source.read().unwrap(), Reading::Closed);
    }

    #[test]
    fn test_channel_fault_is_skipped() {
        let reader = Stutter {
            chunks: vec![
                Err(io::Error::new(io::ErrorKind::Other, "framing error")),
                Ok(b"1.0\n".to_vec()),
            ],
        };
        let mut source = LineSensor::new(BufReader::new(reader));
        assert_eq!(source.read().unwrap(), Reading::Idle);
        assert_eq!(source.read().unwrap(), Reading::Sample(1.0));
        assert_eq!(source.read().unwrap(), Reading::Closed);
    }

    #[test]
    fn test_good_read_resets_error_count() {
        let fault = || Err(io::Error::new(io::ErrorKind::Other, "parity error"));
        let reader = Stutter {
            chunks: vec![fault(), Ok(b"2\n".to_vec()), fault(), Ok(b"3\n".to_vec())],
        };
        let mut source = LineSensor::new(BufReader::new(reader)).with_error_limit(2);
        assert_eq!(
            drain(&mut source),
            vec![
                Reading::Idle,
                Reading::Sample(2.0),
                Reading::Idle,
                Reading::Sample(3.0)
            ]
        );
    }

    #[test]
    fn test_persistent_failure_is_fatal() {
        let unplugged = || Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        let reader = Stutter {
            chunks: vec![unplugged(), unplugged(), unplugged()],
        };
        let mut source = LineSensor::new(BufReader::new(reader)).with_error_limit(3);
        assert_eq!(source.read().unwrap(), Reading::Idle);
        assert_eq!(source.read().unwrap(), Reading::Idle);
        assert!(matches!(
            source.read(),
            Err(LinkError::Disconnected { .. })
        ));
    }
}
