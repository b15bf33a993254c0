use crate::error::{TfResult, TriadForgeError};
use crate::geometry::NUM_KEYS;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Per-key intrinsic cost, one integer per slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseEffort {
    values: [f64; NUM_KEYS],
}

impl Default for BaseEffort {
    fn default() -> Self {
        Self::zeros()
    }
}

impl BaseEffort {
    pub fn zeros() -> Self {
        Self {
            values: [0.0; NUM_KEYS],
        }
    }

    pub fn from_values(values: [f64; NUM_KEYS]) -> Self {
        Self { values }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TfResult<Self> {
        let path = path.as_ref();
        debug!("   Loading base effort from: {}", path.display());
        let file = File::open(path).map_err(|e| {
            TriadForgeError::Config(format!(
                "could not open base effort config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file)
    }

    /// Whitespace-separated integers, any number per line. Lines whose first
    /// non-blank character is `#` are comments.
    pub fn from_reader<R: Read>(reader: R) -> TfResult<Self> {
        let mut parsed: Vec<f64> = Vec::with_capacity(NUM_KEYS);

        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            for token in trimmed.split_whitespace() {
                let value: i64 = token.parse().map_err(|_| {
                    TriadForgeError::Config(format!(
                        "line {}: '{}' is not an integer",
                        line_no + 1,
                        token
                    ))
                })?;
                if value < 0 {
                    return Err(TriadForgeError::Config(format!(
                        "line {}: base effort must not be negative (got {})",
                        line_no + 1,
                        value
                    )));
                }
                parsed.push(value as f64);
            }
        }

        if parsed.len() != NUM_KEYS {
            return Err(TriadForgeError::BaseEffortCount {
                found: parsed.len(),
                expected: NUM_KEYS,
            });
        }

        let mut values = [0.0; NUM_KEYS];
        values.copy_from_slice(&parsed);
        Ok(Self { values })
    }

    #[inline(always)]
    pub fn get(&self, pos: usize) -> f64 {
        self.values[pos]
    }

    pub fn values(&self) -> &[f64; NUM_KEYS] {
        &self.values
    }
}
