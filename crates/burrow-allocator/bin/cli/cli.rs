use burrow_allocator::{AllocatorSettings, DEFAULT_RETRY_WARN_THRESHOLD};
use burrow_core::{ReservedNames, SequenceSeed, SequenceState};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "BURROW_MYSQL_DSN";
pub const LCG_A_ENV: &str = "BURROW_LCG_A";
pub const LCG_B_ENV: &str = "BURROW_LCG_B";
pub const SEED_COUNTER_ENV: &str = "BURROW_SEED_COUNTER";
pub const SEED_LAST_OUTPUT_ENV: &str = "BURROW_SEED_LAST_OUTPUT";
pub const RESERVED_ENV: &str = "BURROW_RESERVED";
pub const RETRY_WARN_THRESHOLD_ENV: &str = "BURROW_RETRY_WARN_THRESHOLD";
pub const LOG_JSON_ENV: &str = "BURROW_LOG_JSON";
pub const BASE_URL_ENV: &str = "BURROW_BASE_URL";

// Knuth's MMIX constants: odd increment, multiplier ≡ 1 (mod 4).
pub const DEFAULT_LCG_A: u64 = 6_364_136_223_846_793_005;
pub const DEFAULT_LCG_B: u64 = 1_442_695_040_888_963_407;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    /// State lives only as long as the process.
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the schema and the sequence row if they are missing.
    Init,
    /// Assign a path to a payload.
    Shorten {
        /// URL to redirect to, or text to serve.
        payload: String,
        /// Serve the payload verbatim instead of redirecting.
        #[arg(long)]
        literal: bool,
        /// Ask for this path instead of a generated one.
        #[arg(long)]
        path: Option<String>,
        /// Print the full short URL under this base.
        #[arg(long, env = BASE_URL_ENV)]
        base_url: Option<String>,
    },
    /// Show what a path points to.
    Resolve { path: String },
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Allocate obfuscated short paths")]
pub struct Cli {
    /// Where codes and the sequence row live. `in-memory` keeps them only
    /// for this one invocation, so `resolve` finds nothing and every
    /// `shorten` starts a fresh sequence; use `mysql` for anything durable.
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Permutation multiplier. Only used when the sequence row is created.
    #[arg(long, env = LCG_A_ENV, default_value_t = DEFAULT_LCG_A)]
    pub lcg_a: u64,

    /// Permutation increment. Only used when the sequence row is created.
    #[arg(long, env = LCG_B_ENV, default_value_t = DEFAULT_LCG_B)]
    pub lcg_b: u64,

    #[arg(long, env = SEED_COUNTER_ENV, default_value_t = 0)]
    pub seed_counter: u64,

    #[arg(long, env = SEED_LAST_OUTPUT_ENV, default_value_t = 0)]
    pub seed_last_output: u64,

    /// Comma-separated paths that may never be assigned.
    #[arg(long, env = RESERVED_ENV, value_delimiter = ',')]
    pub reserved: Option<Vec<String>>,

    #[arg(
        long,
        env = RETRY_WARN_THRESHOLD_ENV,
        default_value_t = DEFAULT_RETRY_WARN_THRESHOLD
    )]
    pub retry_warn_threshold: u32,

    /// Emit logs as JSON.
    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn seed(&self) -> SequenceSeed {
        SequenceSeed {
            a: self.lcg_a,
            b: self.lcg_b,
            state: SequenceState {
                counter: self.seed_counter,
                last_output: self.seed_last_output,
            },
        }
    }

    pub fn settings(&self) -> AllocatorSettings {
        let reserved = match &self.reserved {
            Some(names) => ReservedNames::new(names.iter().map(|name| name.trim())),
            None => ReservedNames::default(),
        };

        AllocatorSettings::builder()
            .reserved(reserved)
            .retry_warn_threshold(self.retry_warn_threshold)
            .build()
    }
}
