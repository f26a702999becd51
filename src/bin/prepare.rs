use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cortalign::{
    BrennanConfig, BrennanDataset, CosineBankEncoder, Dataset, DiskStore, GwilliamsConfig,
    GwilliamsDataset, ToyConfig, ToyDataset,
};

#[derive(Parser)]
#[command(name = "prepare", about = "Windowed brain/speech dataset preparation")]
struct Args {
    #[command(subcommand)]
    corpus: Corpus,
}

#[derive(Subcommand)]
enum Corpus {
    /// EEG audiobook study: shared stimulus, embedded audio targets
    Brennan {
        /// Corpus root containing raw/ and audio/merged_audio.wav
        #[arg(long, default_value = "data/Brennan2018")]
        data_root: PathBuf,

        /// Cache directory for preprocessed stages
        #[arg(long, default_value = "cache/brennan")]
        cache: PathBuf,

        /// Samples per training window
        #[arg(long, default_value_t = 256)]
        seq_len: usize,

        /// Neural latency compensation in milliseconds
        #[arg(long, default_value_t = 150.0)]
        shift_ms: f64,

        /// Highpass cutoff in Hz
        #[arg(long, default_value_t = 1.0)]
        l_freq: f32,

        /// Only process the first N recordings
        #[arg(long)]
        num_subjects: Option<usize>,
    },

    /// MEG multi-task study: per-task stimuli, waveform targets
    Gwilliams {
        /// Corpus root containing sub-*/ses-*/meg/ and stimuli/audio/
        #[arg(long, default_value = "data/Gwilliams2022")]
        data_root: PathBuf,

        /// Cache directory for preprocessed stages
        #[arg(long, default_value = "cache/gwilliams")]
        cache: PathBuf,

        /// Subjects to process
        #[arg(long, default_value_t = 27)]
        num_subjects: usize,

        /// Window length in seconds
        #[arg(long, default_value_t = 3)]
        seq_len_s: usize,

        /// Sensor rate after resampling, in Hz
        #[arg(long, default_value_t = 120.0)]
        resample_hz: f64,
    },

    /// Synthetic cosine dataset for smoke tests
    Toy {
        /// Windows to generate
        #[arg(long, default_value_t = 10_000)]
        num_samples: usize,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.corpus {
        Corpus::Brennan {
            data_root,
            cache,
            seq_len,
            shift_ms,
            l_freq,
            num_subjects,
        } => {
            let cfg = BrennanConfig {
                data_root,
                seq_len,
                shift_ms,
                l_freq,
                num_subjects,
                ..BrennanConfig::default()
            };
            let store = DiskStore::new(&cache)?;
            let encoder = CosineBankEncoder::default();
            let ds = BrennanDataset::build(&cfg, &encoder, &store)?;
            summarize("brennan", &ds);
            println!("Effective EEG rate: {:.3} Hz", ds.srate());
            println!("Cache → {}", cache.display());
        }

        Corpus::Gwilliams {
            data_root,
            cache,
            num_subjects,
            seq_len_s,
            resample_hz,
        } => {
            let cfg = GwilliamsConfig {
                data_root,
                num_subjects,
                seq_len_s,
                resample_hz,
                ..GwilliamsConfig::default()
            };
            let store = DiskStore::new(&cache)?;
            let ds = GwilliamsDataset::build(&cfg, &store)?;
            summarize("gwilliams", &ds);
            println!("Cache → {}", cache.display());
        }

        Corpus::Toy { num_samples, seed } => {
            let cfg = ToyConfig {
                num_samples,
                seed,
                ..ToyConfig::default()
            };
            let ds = ToyDataset::new(&cfg)?;
            summarize("toy", &ds);
        }
    }

    Ok(())
}

fn summarize(name: &str, ds: &dyn Dataset) {
    match ds.get(0) {
        Some(s) => println!(
            "{name}: {} windows, brain {:?}, audio {:?}",
            ds.len(),
            s.brain.shape(),
            s.audio.shape()
        ),
        None => println!("{name}: 0 windows"),
    }
}
