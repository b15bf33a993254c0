use crate::corpus::{CorpusClass, CorpusMode, TriadIndex};
use crate::error::{TfResult, TriadForgeError};
use crate::geometry::LayoutMask;
use crate::layouts::Layout;
use crate::optimizer::{AnnealSchedule, Annealer, Mutator};
use crate::scorer::{BaseEffort, Scorer, StrokeModel};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchParams {
    /// Iterations per annealing run
    #[arg(long, default_value_t = 1_000_000)]
    pub iterations: u64,
    /// Independent runs (searched in parallel)
    #[arg(long, default_value_t = 1)]
    pub rounds: usize,
    /// Initial temperature
    #[arg(long, default_value_t = 0.5)]
    pub t0: f64,
    /// Acceptance scale for non-improving moves
    #[arg(long, default_value_t = 0.3)]
    pub p0: f64,
    /// Cooling constant k; 0 keeps the temperature constant
    #[arg(long, default_value_t = 500.0)]
    pub cooling: f64,
    #[arg(long, default_value_t = 1)]
    pub min_swaps: usize,
    #[arg(long, default_value_t = 3)]
    pub max_swaps: usize,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = StrokeModel::FirstKey)]
    pub stroke_model: StrokeModel,
    /// 47 `0`/`1` flags marking swappable slots (default: the three letter rows)
    #[arg(long)]
    pub mask: Option<String>,
    /// Starting layout: a known layout name or a 47-character layout
    #[arg(long, default_value = "qwerty")]
    pub start: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
            rounds: 1,
            t0: 0.5,
            p0: 0.3,
            cooling: 500.0,
            min_swaps: 1,
            max_swaps: 3,
            seed: None,
            stroke_model: StrokeModel::FirstKey,
            mask: None,
            start: "qwerty".to_string(),
        }
    }
}

impl SearchParams {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TriadForgeError::Config(format!(
                "could not read search params '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn layout_mask(&self) -> TfResult<LayoutMask> {
        match &self.mask {
            Some(s) => LayoutMask::parse(s),
            None => Ok(LayoutMask::standard()),
        }
    }

    pub fn schedule(&self) -> TfResult<AnnealSchedule> {
        AnnealSchedule::new(self.t0, self.p0, self.cooling)
    }

    pub fn mutator(&self) -> TfResult<Mutator> {
        Mutator::new(&self.layout_mask()?, self.min_swaps, self.max_swaps)
    }

    pub fn start_layout(&self) -> TfResult<Layout> {
        Layout::resolve(&self.start)
    }

    /// Wires a scorer into an annealer using these parameters.
    pub fn annealer(&self, scorer: Scorer, seed: Option<u64>) -> TfResult<Annealer> {
        Ok(Annealer::new(scorer, self.mutator()?, self.schedule()?, seed))
    }

    /// Command-line form of these parameters, for spawning `node` processes.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--iterations".to_string(),
            self.iterations.to_string(),
            "--rounds".to_string(),
            self.rounds.to_string(),
            "--t0".to_string(),
            self.t0.to_string(),
            "--p0".to_string(),
            self.p0.to_string(),
            "--cooling".to_string(),
            self.cooling.to_string(),
            "--min-swaps".to_string(),
            self.min_swaps.to_string(),
            "--max-swaps".to_string(),
            self.max_swaps.to_string(),
            "--start".to_string(),
            self.start.clone(),
        ];
        if let Some(name) = value_name(&self.stroke_model) {
            args.push("--stroke-model".to_string());
            args.push(name);
        }
        if let Some(mask) = &self.mask {
            args.push("--mask".to_string());
            args.push(mask.clone());
        }
        args
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorpusParams {
    /// Text corpus to count triads from
    #[arg(long, default_value = "data/corpus.txt")]
    pub corpus: String,
    /// Pre-counted triad table (TSV); used instead of --corpus when given
    #[arg(long)]
    pub triads: Option<String>,
    /// Character classes that take part in triads
    #[arg(long, value_enum, value_delimiter = ',', default_value = "letters")]
    pub mode: Vec<CorpusClass>,
    /// Per-key base effort configuration
    #[arg(long, default_value = "data/base_effort.conf")]
    pub base_effort: String,
    /// Abort instead of falling back to zero base effort when the config fails to load
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,
}

impl Default for CorpusParams {
    fn default() -> Self {
        Self {
            corpus: "data/corpus.txt".to_string(),
            triads: None,
            mode: vec![CorpusClass::Letters],
            base_effort: "data/base_effort.conf".to_string(),
            strict_config: false,
        }
    }
}

impl CorpusParams {
    pub fn corpus_mode(&self) -> CorpusMode {
        CorpusMode::from_classes(&self.mode)
    }

    pub fn load_index(&self) -> TfResult<TriadIndex> {
        let index = match &self.triads {
            Some(path) => TriadIndex::load_tsv(path)?,
            None => TriadIndex::from_file(&self.corpus, self.corpus_mode())?,
        };
        if index.is_empty() {
            return Err(TriadForgeError::Corpus(format!(
                "no triads found in '{}'",
                self.triads.as_deref().unwrap_or(&self.corpus)
            )));
        }
        info!(
            "📊 Corpus: {} distinct triads, {} total",
            index.len(),
            index.total()
        );
        Ok(index)
    }

    /// A failed load is reported; without `strict_config` the search goes on
    /// with zero base effort.
    pub fn load_base_effort(&self) -> TfResult<BaseEffort> {
        match BaseEffort::load_from_file(&self.base_effort) {
            Ok(base) => {
                info!("⚖️  Base effort loaded from: {}", self.base_effort);
                Ok(base)
            }
            Err(e) if !self.strict_config => {
                warn!("⚠️  {}. Using zero base effort.", e);
                Ok(BaseEffort::zeros())
            }
            Err(e) => Err(e),
        }
    }

    pub fn build_scorer(&self, stroke_model: StrokeModel) -> TfResult<Scorer> {
        let base = self.load_base_effort()?;
        let index = self.load_index()?;
        Scorer::with_stroke_model(base, &index, stroke_model)
    }

    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["--corpus".to_string(), self.corpus.clone()];
        if let Some(triads) = &self.triads {
            args.push("--triads".to_string());
            args.push(triads.clone());
        }
        let modes: Vec<String> = self.mode.iter().filter_map(value_name).collect();
        if !modes.is_empty() {
            args.push("--mode".to_string());
            args.push(modes.join(","));
        }
        args.push("--base-effort".to_string());
        args.push(self.base_effort.clone());
        if self.strict_config {
            args.push("--strict-config".to_string());
        }
        args
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HiveParams {
    /// Total jobs to hand out
    #[arg(long, default_value_t = 5)]
    pub jobs: usize,
    /// Iterations per job
    #[arg(long, default_value_t = 100_000)]
    pub layouts_per_job: u32,
    /// Seconds to wait for a job's result before the worker is given up on
    #[arg(long, default_value_t = 600)]
    pub result_timeout: u64,
    /// Hand a lost job to another worker instead of dropping it
    #[arg(long, default_value_t = false)]
    pub requeue_lost: bool,
}

impl Default for HiveParams {
    fn default() -> Self {
        Self {
            jobs: 5,
            layouts_per_job: 100_000,
            result_timeout: 600,
            requeue_lost: false,
        }
    }
}

impl HiveParams {
    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout)
    }
}

fn value_name<V: ValueEnum>(value: &V) -> Option<String> {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
}
