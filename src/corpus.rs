use crate::error::{TfResult, TriadForgeError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::ops::BitOr;
use std::path::Path;
use tracing::{debug, info, warn};

/// Corpus files are streamed in batches of this many bytes.
pub const BATCH_SIZE: usize = 32 * 1024;

/// Bitmask of the character classes that take part in triads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorpusMode(u8);

impl CorpusMode {
    pub const LETTERS: CorpusMode = CorpusMode(0x01);
    pub const NUMBERS: CorpusMode = CorpusMode(0x02);
    pub const PUNCTUATION: CorpusMode = CorpusMode(0x04);
    pub const WHITESPACE: CorpusMode = CorpusMode(0x08);
    pub const SYMBOLS: CorpusMode = CorpusMode(0x10);
    pub const ALL: CorpusMode = CorpusMode(0x1F);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: CorpusMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn from_classes(classes: &[CorpusClass]) -> Self {
        classes
            .iter()
            .fold(CorpusMode(0), |mode, class| mode | class.mode())
    }

    /// Class of a (lower-cased) byte, or `None` for bytes outside 0x20..0x7F.
    pub fn classify(c: u8) -> Option<CorpusMode> {
        match c {
            b'a'..=b'z' | b'A'..=b'Z' => Some(Self::LETTERS),
            b'0'..=b'9' => Some(Self::NUMBERS),
            b' ' => Some(Self::WHITESPACE),
            b'!' | b'"' | b'\'' | b'(' | b')' | b',' | b'-' | b'.' | b'/' | b':' | b';'
            | b'?' | b'[' | b'\\' | b']' | b'_' | b'{' | b'}' => Some(Self::PUNCTUATION),
            b'#' | b'$' | b'%' | b'&' | b'*' | b'+' | b'<' | b'=' | b'>' | b'@' | b'^'
            | b'`' | b'|' | b'~' => Some(Self::SYMBOLS),
            _ => None,
        }
    }

    #[inline]
    pub fn accepts(&self, c: u8) -> bool {
        match Self::classify(c) {
            Some(class) => self.contains(class),
            None => false,
        }
    }
}

impl Default for CorpusMode {
    fn default() -> Self {
        Self::LETTERS
    }
}

impl BitOr for CorpusMode {
    type Output = CorpusMode;

    fn bitor(self, rhs: Self) -> Self::Output {
        CorpusMode(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusClass {
    Letters,
    Numbers,
    Punctuation,
    Whitespace,
    Symbols,
}

impl CorpusClass {
    pub fn mode(&self) -> CorpusMode {
        match self {
            Self::Letters => CorpusMode::LETTERS,
            Self::Numbers => CorpusMode::NUMBERS,
            Self::Punctuation => CorpusMode::PUNCTUATION,
            Self::Whitespace => CorpusMode::WHITESPACE,
            Self::Symbols => CorpusMode::SYMBOLS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriadOrder {
    #[default]
    Frequency,
    Lexical,
}

/// Rolling window over the filtered character stream. Survives batch
/// boundaries so no triad is lost where one read ends and the next begins.
#[derive(Default)]
struct Window {
    chars: [u8; 3],
    filled: usize,
}

impl Window {
    #[inline]
    fn push(&mut self, c: u8) {
        self.chars = [self.chars[1], self.chars[2], c];
        if self.filled < 3 {
            self.filled += 1;
        }
    }
}

/// Occurrence counts of every triad (and digraph) seen in a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriadIndex {
    triads: BTreeMap<[u8; 3], u64>,
    digraphs: HashMap<[u8; 2], u64>,
    total: u64,
}

impl TriadIndex {
    pub fn from_reader<R: Read>(mut reader: R, mode: CorpusMode) -> TfResult<Self> {
        let mut index = Self::default();
        let mut window = Window::default();
        let mut buf = vec![0u8; BATCH_SIZE];
        let mut bytes_read = 0usize;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            bytes_read += n;
            index.absorb(&buf[..n], mode, &mut window);
        }

        debug!(
            "Scanned {} bytes: {} distinct triads, {} total",
            bytes_read,
            index.triads.len(),
            index.total
        );
        Ok(index)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, mode: CorpusMode) -> TfResult<Self> {
        let path = path.as_ref();
        info!("📖 Reading corpus: {}", path.display());
        let file = File::open(path).map_err(|e| {
            TriadForgeError::Corpus(format!(
                "could not open corpus '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file, mode)
    }

    pub fn from_text(text: &str, mode: CorpusMode) -> Self {
        let mut index = Self::default();
        let mut window = Window::default();
        index.absorb(text.as_bytes(), mode, &mut window);
        index
    }

    fn absorb(&mut self, batch: &[u8], mode: CorpusMode, window: &mut Window) {
        for &raw in batch {
            let c = raw.to_ascii_lowercase();
            if !mode.accepts(c) {
                continue;
            }
            window.push(c);
            if window.filled >= 2 {
                *self
                    .digraphs
                    .entry([window.chars[1], window.chars[2]])
                    .or_default() += 1;
            }
            if window.filled == 3 {
                *self.triads.entry(window.chars).or_default() += 1;
                self.total += 1;
            }
        }
    }

    /// Loads a pre-counted `triad<TAB>count` table.
    pub fn load_tsv<P: AsRef<Path>>(path: P) -> TfResult<Self> {
        let path = path.as_ref();
        info!("📖 Loading triad table: {}", path.display());
        let file = File::open(path).map_err(|e| {
            TriadForgeError::Corpus(format!(
                "could not open triad table '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(file);

        let mut index = Self::default();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let rec = result?;
            if rec.len() < 2 {
                skipped += 1;
                continue;
            }
            let triad = rec[0].as_bytes();
            let count: u64 = match rec[1].trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if triad.len() != 3 {
                skipped += 1;
                continue;
            }
            index.insert([triad[0], triad[1], triad[2]], count);
        }

        if skipped > 0 {
            warn!("⚠️  Skipped {} invalid rows in triad table.", skipped);
        }
        Ok(index)
    }

    pub fn save_tsv<P: AsRef<Path>>(&self, path: P) -> TfResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_path(path)?;
        for (triad, count) in self.top_triads(1, TriadOrder::Frequency) {
            wtr.write_record([&triad[..], count.to_string().as_bytes()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Adds `count` occurrences of `triad`.
    pub fn insert(&mut self, triad: [u8; 3], count: u64) {
        if count == 0 {
            return;
        }
        *self.triads.entry(triad).or_default() += count;
        self.total += count;
    }

    pub fn count(&self, triad: &[u8; 3]) -> u64 {
        self.triads.get(triad).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8; 3], &u64)> {
        self.triads.iter()
    }

    /// Number of distinct triads.
    pub fn len(&self) -> usize {
        self.triads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triads.is_empty()
    }

    /// Total triad occurrences (sum of all counts).
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn digraph_count(&self, digraph: &[u8; 2]) -> u64 {
        self.digraphs.get(digraph).copied().unwrap_or(0)
    }

    /// Digraphs sorted by descending count, ties broken lexically.
    pub fn digraphs(&self) -> Vec<([u8; 2], u64)> {
        let mut entries: Vec<_> = self.digraphs.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    pub fn top_triads(&self, min_count: u64, order: TriadOrder) -> Vec<([u8; 3], u64)> {
        let mut entries: Vec<_> = self
            .triads
            .iter()
            .filter(|(_, &c)| c >= min_count)
            .map(|(k, v)| (*k, *v))
            .collect();
        if order == TriadOrder::Frequency {
            // BTreeMap iteration is already lexical; stable sort keeps that for ties.
            entries.sort_by(|a, b| b.1.cmp(&a.1));
        }
        entries
    }
}
