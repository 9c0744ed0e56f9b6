//! Aggregate a measurements file into per-station mean, min and max.
//!
//! The input is split into chunks that end on a line boundary. Each chunk is
//! parsed into its own [`StationMap`] on the rayon thread pool and the maps are
//! merged at the end.

use crate::error::{Error, Result};
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Default number of bytes read per chunk, 64 MiB.
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024 * 1024;

/// Running statistics for one station.
///
/// min/max/sum are 10x larger than the true values, so every measurement with
/// one decimal is summed exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Station {
    min: i64,
    max: i64,
    sum: i64,
    count: u64,
}

impl Station {
    /// A station that has seen a single measurement, given in tenths.
    fn new(tenths: i64) -> Self {
        Self {
            min: tenths,
            max: tenths,
            sum: tenths,
            count: 1,
        }
    }

    fn add(&mut self, tenths: i64) {
        self.min = self.min.min(tenths);
        self.max = self.max.max(tenths);
        self.sum += tenths;
        self.count += 1;
    }

    /// Fold the statistics of `other` into `self`.
    pub fn update(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn min(&self) -> f64 {
        self.min as f64 / 10.0
    }

    pub fn max(&self) -> f64 {
        self.max as f64 / 10.0
    }

    pub fn mean(&self) -> f64 {
        (self.sum as f64 / 10.0) / self.count as f64
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Display for Station {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6},{:.6}", self.mean(), self.min(), self.max())
    }
}

/// Statistics keyed by the raw station name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StationMap(HashMap<Vec<u8>, Station>);

impl StationMap {
    pub fn new() -> Self {
        Self(HashMap::with_capacity(512))
    }

    /// Record one measurement, in tenths, for `name`.
    pub fn record(&mut self, name: &[u8], tenths: i64) {
        // Only allocate a key the first time a station is seen.
        match self.0.get_mut(name) {
            Some(station) => station.add(tenths),
            None => {
                self.0.insert(name.to_vec(), Station::new(tenths));
            }
        }
    }

    /// Merge the statistics of `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (name, station2) in other.0 {
            self.0
                .entry(name)
                .and_modify(|station1| station1.update(&station2))
                .or_insert(station2);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.0.get(name.as_bytes())
    }

    /// Stations sorted by name. Invalid UTF-8 in a name is replaced.
    pub fn into_sorted(self) -> Vec<(String, Station)> {
        let mut res = self
            .0
            .into_iter()
            .map(|(name, station)| (String::from_utf8_lossy(&name).into_owned(), station))
            .collect::<Vec<_>>();
        res.sort_unstable_by(|(n1, _), (n2, _)| n1.cmp(n2));
        res
    }
}

/// Parse a temperature with exactly one decimal, e.g. `-12.3`, into tenths.
fn parse_tenths(s: &[u8]) -> Option<i64> {
    let (negative, s) = match s.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, s),
    };
    let (&fraction, s) = s.split_last()?;
    let (&dot, whole) = s.split_last()?;
    if dot != b'.' || whole.is_empty() || !fraction.is_ascii_digit() {
        return None;
    }
    let mut num: i64 = 0;
    for &d in whole {
        if !d.is_ascii_digit() {
            return None;
        }
        num = num.checked_mul(10)?.checked_add((d - b'0') as i64)?;
    }
    num = num.checked_mul(10)?.checked_add((fraction - b'0') as i64)?;
    Some(if negative { -num } else { num })
}

fn parse_line(map: &mut StationMap, line: &[u8]) -> Result<()> {
    let malformed = || Error::MalformedLine {
        line: String::from_utf8_lossy(line).into_owned(),
    };
    // Station names may contain ';', the measurement never does.
    let sep = memchr::memrchr(b';', line).ok_or_else(malformed)?;
    let tenths = parse_tenths(&line[sep + 1..]).ok_or_else(malformed)?;
    map.record(&line[..sep], tenths);
    Ok(())
}

/// Parse every `station;temperature` line of `buf`. Empty lines are skipped and
/// the last line need not end with a newline.
pub fn parse_chunk(buf: &[u8]) -> Result<StationMap> {
    let mut map = StationMap::new();
    let mut start = 0;
    for pos in memchr::Memchr::new(b'\n', buf) {
        let line = &buf[start..pos];
        start = pos + 1;
        if !line.is_empty() {
            parse_line(&mut map, line)?;
        }
    }
    if start < buf.len() {
        parse_line(&mut map, &buf[start..])?;
    }
    Ok(map)
}

/// Splits a reader into chunks of whole lines.
///
/// Each chunk is the leftover partial line of the previous chunk plus the next
/// `chunk_bytes` bytes, cut after its last newline. Only the final chunk may end
/// without a newline. A line longer than `chunk_bytes` makes its chunk grow
/// until the line ends.
pub struct ChunkReader<R> {
    reader: R,
    chunk_bytes: usize,
    // Partial line left over from the previous chunk.
    carry: Vec<u8>,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    /// `chunk_bytes` must be greater than zero.
    pub fn new(reader: R, chunk_bytes: usize) -> Result<Self> {
        if chunk_bytes == 0 {
            return Err(Error::ZeroParam { name: "chunk bytes" });
        }
        Ok(Self {
            reader,
            chunk_bytes,
            carry: Vec::new(),
            done: false,
        })
    }

    fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut buf = std::mem::take(&mut self.carry);
        loop {
            let want = self.chunk_bytes;
            let read = self.reader.by_ref().take(want as u64).read_to_end(&mut buf)?;
            if read < want {
                // End of input.
                self.done = true;
                return Ok((!buf.is_empty()).then_some(buf));
            }
            if let Some(last_nl) = memchr::memrchr(b'\n', &buf) {
                self.carry = buf.split_off(last_nl + 1);
                return Ok(Some(buf));
            }
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Aggregate all measurements read from `reader`, parsing chunks of about
/// `chunk_bytes` in parallel on the current rayon thread pool. At most a few
/// chunks per thread are held in memory at a time.
pub fn aggregate_reader<R: Read + Send>(reader: R, chunk_bytes: usize) -> Result<StationMap> {
    let chunks = ChunkReader::new(reader, chunk_bytes)?;
    chunks
        .par_bridge()
        .map(|chunk| {
            let chunk = chunk?;
            tracing::debug!(bytes = chunk.len(), "parsing chunk");
            parse_chunk(&chunk)
        })
        .try_reduce(StationMap::new, |mut map1, map2| {
            map1.merge(map2);
            Ok(map1)
        })
}

/// Delegates to [`aggregate_reader()`], reading the file at `path`.
pub fn aggregate_file<P: AsRef<Path>>(path: P, chunk_bytes: usize) -> Result<StationMap> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), chunk_bytes, "aggregating measurements");
    let map = aggregate_reader(File::open(path)?, chunk_bytes)?;
    tracing::info!(stations = map.len(), "finished aggregating measurements");
    Ok(map)
}

/// Write a `Station,Mean,Min,Max` header and one line per station, with
/// values printed to six decimals.
pub fn write_report<W: Write>(stations: &[(String, Station)], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Station,Mean,Min,Max")?;
    for (name, station) in stations {
        writeln!(out, "{name},{station}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(text: &str) -> StationMap {
        parse_chunk(text.as_bytes()).unwrap()
    }

    #[test]
    fn parses_tenths() {
        assert_eq!(parse_tenths(b"12.3"), Some(123));
        assert_eq!(parse_tenths(b"0.0"), Some(0));
        assert_eq!(parse_tenths(b"40.0"), Some(400));
        assert_eq!(parse_tenths(b"-7.5"), Some(-75));
        assert_eq!(parse_tenths(b"12"), None);
        assert_eq!(parse_tenths(b".5"), None);
        assert_eq!(parse_tenths(b"1.23"), None);
        assert_eq!(parse_tenths(b"a.1"), None);
        assert_eq!(parse_tenths(b""), None);
    }

    #[test]
    fn min_max_start_from_first_measurement() {
        let map = map_of("Oslo;12.5\nOslo;20.0\nOslo;15.0\n");
        let oslo = map.get("Oslo").unwrap();
        assert_eq!(oslo.count(), 3);
        assert!((oslo.min() - 12.5).abs() < 1e-9);
        assert!((oslo.max() - 20.0).abs() < 1e-9);
        assert!((oslo.mean() - 47.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn last_line_without_newline_and_blank_lines() {
        let map = map_of("Lima;1.0\n\nLima;3.0");
        assert_eq!(map.get("Lima").unwrap().count(), 2);
        assert!((map.get("Lima").unwrap().mean() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn name_with_separator_splits_on_last() {
        let map = map_of("a;b;1.5\n");
        assert!((map.get("a;b").unwrap().max() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn malformed_line_is_an_error() {
        let err = parse_chunk(b"Tokyo;12.3\nTokyo 12.3\n").unwrap_err();
        assert!(matches!(err, Error::MalformedLine { ref line } if line == "Tokyo 12.3"));
        assert!(parse_chunk(b"Tokyo;warm\n").is_err());
    }

    #[test]
    fn merge_combines_overlapping_stations() {
        let mut map1 = map_of("Tokyo;10.0\nLima;5.0\n");
        let map2 = map_of("Tokyo;30.0\nTokyo;2.0\nOslo;1.1\n");
        map1.merge(map2);

        assert_eq!(map1.len(), 3);
        let tokyo = map1.get("Tokyo").unwrap();
        assert_eq!(tokyo.count(), 3);
        assert!((tokyo.min() - 2.0).abs() < 1e-9);
        assert!((tokyo.max() - 30.0).abs() < 1e-9);
        assert!((tokyo.mean() - 14.0).abs() < 1e-9);
        assert_eq!(map1.get("Lima"), map_of("Lima;5.0\n").get("Lima"));
        assert_eq!(map1.get("Oslo").unwrap().count(), 1);
    }

    #[test]
    fn merge_is_same_as_parsing_together() {
        let text = "Tokyo;10.0\nLima;5.0\nTokyo;30.0\nOslo;1.1\nLima;39.9\n";
        let (left, right) = text.split_at(text.find("Tokyo;30.0").unwrap());
        let mut merged = map_of(left);
        merged.merge(map_of(right));
        assert_eq!(merged, map_of(text));
    }

    #[test]
    fn chunks_end_on_line_boundaries() {
        let text = "Tokyo;10.0\nLima;5.0\nOslo;1.1\nQuito;22.2\n";
        let chunks = ChunkReader::new(text.as_bytes(), 8)
            .unwrap()
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.last(), Some(&b'\n'));
        }
        assert_eq!(chunks.concat(), text.as_bytes());
    }

    #[test]
    fn line_longer_than_chunk_is_kept_whole() {
        let text = "Llanfairpwllgwyngyll;3.0\nLima;1.0";
        let chunks = ChunkReader::new(text.as_bytes(), 4)
            .unwrap()
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chunks[0], b"Llanfairpwllgwyngyll;3.0\n");
        assert_eq!(chunks.concat(), text.as_bytes());
    }

    #[test]
    fn zero_chunk_bytes_is_rejected() {
        assert!(matches!(
            ChunkReader::new(&b""[..], 0),
            Err(Error::ZeroParam { name: "chunk bytes" })
        ));
    }

    #[test]
    fn small_chunks_give_same_result() {
        let text = "Tokyo;10.0\nLima;5.0\nTokyo;30.0\nOslo;1.1\nLima;39.9\n".repeat(50);
        let whole = aggregate_reader(text.as_bytes(), 1 << 20).unwrap();
        let chunked = aggregate_reader(text.as_bytes(), 16).unwrap();
        assert_eq!(whole, chunked);
        assert_eq!(chunked.get("Lima").unwrap().count(), 100);
    }

    #[test]
    fn empty_input_has_no_stations() {
        assert!(aggregate_reader(&b""[..], 16).unwrap().is_empty());
    }

    #[test]
    fn report_format() {
        let stations = map_of("Tokyo;10.0\nLima;5.0\nTokyo;30.0\nAbidjan;0.5\n").into_sorted();
        let mut out = Vec::new();
        write_report(&stations, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Station,Mean,Min,Max\n\
             Abidjan,0.500000,0.500000,0.500000\n\
             Lima,5.000000,5.000000,5.000000\n\
             Tokyo,20.000000,10.000000,30.000000\n"
        );
    }

    #[test]
    fn report_without_stations_is_just_header() {
        let mut out = Vec::new();
        write_report(&[], &mut out).unwrap();
        assert_eq!(out, b"Station,Mean,Min,Max\n");
    }
}
