use std::fs::File;
use std::io::{self, BufRead};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref TRACE_LINE: Regex = Regex::new(r"^\s*(?:0[xX](?P<hex>[0-9a-fA-F]+)|(?P<dec>[0-9]+))?\s*(?:#.*)?$").unwrap();
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't read the trace: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: `{text}` is not an address")]
    Parse { line: usize, text: String },
}

pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // The trace is only ever read front to back
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(m))
        }
    }
}

/// Iterates over the addresses of a trace
///
/// A trace holds one address per line, either hexadecimal with a `0x` prefix or decimal. Blank
/// lines and anything after a `#` are ignored
///
/// ```
/// use cachelib::io::TraceReader;
/// let trace = "# warm up\n0x1000\n4096  # same line\n\n0XfF\n";
/// let addresses: Vec<u64> = TraceReader::new(trace.as_bytes()).collect::<Result<_, _>>().unwrap();
/// assert_eq!(addresses, vec![0x1000, 4096, 0xff]);
/// ```
pub struct TraceReader<B: BufRead> {
    lines: io::Lines<B>,
    line_number: usize,
}

impl<B: BufRead> TraceReader<B> {
    pub fn new(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Parses one line, `None` if it holds no address
    fn parse_line(&self, text: &str) -> Result<Option<u64>, TraceError> {
        let error = || TraceError::Parse {
            line: self.line_number,
            text: text.trim().to_string(),
        };
        let tokens = TRACE_LINE.captures(text).ok_or_else(error)?;
        if let Some(hex) = tokens.name("hex") {
            u64::from_str_radix(hex.as_str(), 16).map(Some).map_err(|_| error())
        } else if let Some(dec) = tokens.name("dec") {
            dec.as_str().parse::<u64>().map(Some).map_err(|_| error())
        } else {
            Ok(None)
        }
    }
}

impl<B: BufRead> Iterator for TraceReader<B> {
    type Item = Result<u64, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            match self.parse_line(&text) {
                Ok(Some(address)) => return Some(Ok(address)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
