//! `Range` header parsing and resolution against a known resource size.
//!
//! Only the `bytes` unit is understood. Several ranges may be requested, but
//! a partial response is served only when they merge into one interval.

use thiserror::Error;

/// One requested range, before it is resolved against a resource size.
///
/// `start: None` is the suffix form (`-N`), in which case `end` holds the
/// suffix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Inclusive byte interval within a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteRange {
    pub start: u64,
    pub end: u64,
}

impl AbsoluteRange {
    /// Number of bytes covered
    pub fn len(self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this interval of a `size`-byte resource
    pub fn content_range(self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("The Range unit `{0}` is not supported. Only `bytes` is supported.")]
    UnsupportedUnit(String),

    #[error("No ranges specified in the Range header.")]
    Empty,

    #[error("Invalid range `{0}` in the Range header.")]
    Malformed(String),

    #[error("Bad range start `{0}`")]
    BadStart(i128),

    #[error("Bad range end `{0}`")]
    BadEnd(u64),
}

impl RangeError {
    /// Whether the header was well-formed but cannot be satisfied (416)
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, RangeError::BadStart(_) | RangeError::BadEnd(_))
    }
}

/// Parse a `Range` header value into its requested ranges
pub fn parse(header: &str) -> Result<Vec<ByteRange>, RangeError> {
    let (unit, specs) = header.split_once('=').unwrap_or((header, ""));
    if unit != "bytes" {
        return Err(RangeError::UnsupportedUnit(unit.to_string()));
    }

    if specs.trim().is_empty() {
        return Err(RangeError::Empty);
    }

    specs.split(',').map(|spec| parse_spec(spec.trim())).collect()
}

fn parse_spec(spec: &str) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(spec.to_string());
    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;

    // Only the leading digits count; anything after them is ignored
    let bound = |value: &str| -> Result<Option<u64>, RangeError> {
        let value = value.trim_start();
        let digits = value
            .find(|c: char| !c.is_ascii_digit())
            .map_or(value, |end| &value[..end]);
        if digits.is_empty() {
            return Ok(None);
        }
        digits.parse().map(Some).map_err(|_| malformed())
    };

    let range = ByteRange {
        start: bound(start)?,
        end: bound(end)?,
    };

    if range.start.is_none() && range.end.is_none() {
        return Err(malformed());
    }

    Ok(range)
}

impl ByteRange {
    /// Resolve against a resource of `size` bytes
    pub fn resolve(self, size: u64) -> Result<AbsoluteRange, RangeError> {
        match (self.start, self.end) {
            (Some(start), end) => {
                if start >= size {
                    return Err(RangeError::BadStart(i128::from(start)));
                }
                let last = size - 1;
                let end = end.map_or(last, |end| end.min(last));
                if end < start {
                    return Err(RangeError::BadEnd(end));
                }
                Ok(AbsoluteRange { start, end })
            }
            (None, Some(suffix)) => {
                let start = i128::from(size) - i128::from(suffix);
                if start < 0 || start >= i128::from(size) {
                    return Err(RangeError::BadStart(start));
                }
                Ok(AbsoluteRange {
                    start: size - suffix,
                    end: size - 1,
                })
            }
            (None, None) => Err(RangeError::Malformed("-".to_string())),
        }
    }
}

/// Sort by start and merge overlapping or adjacent intervals
pub fn merge(mut ranges: Vec<AbsoluteRange>) -> Vec<AbsoluteRange> {
    ranges.sort_by_key(|range| range.start);

    let mut merged: Vec<AbsoluteRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start <= current.end.saturating_add(1) => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Resolve a `Range` header to the single interval worth serving.
///
/// `Ok(None)` means the whole resource should be sent: the ranges did not
/// collapse into exactly one interval.
pub fn resolve(header: &str, size: u64) -> Result<Option<AbsoluteRange>, RangeError> {
    let ranges = parse(header)?
        .into_iter()
        .map(|range| range.resolve(size))
        .collect::<Result<Vec<_>, _>>()?;

    match merge(ranges).as_slice() {
        [single] => Ok(Some(*single)),
        _ => Ok(None),
    }
}
