use clap::{Parser, ValueEnum};
use interview_flow::archive::DEFAULT_ARCHIVE_DIR;
use std::path::PathBuf;

use crate::llm::LlmProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Stakeholder interview and EA deliverables service
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the persisted interview files
    #[arg(long, env = "CATALOGUE_DIR", default_value = DEFAULT_ARCHIVE_DIR)]
    pub catalogue_dir: PathBuf,

    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Openai)]
    pub provider: LlmProvider,

    /// Model judging interview answers
    #[arg(long, env = "VALIDATION_MODEL", default_value = "gpt-3.5-turbo")]
    pub validation_model: String,

    /// Model writing catalogues and the gap analysis
    #[arg(long, env = "DELIVERABLE_MODEL", default_value = "gpt-4")]
    pub deliverable_model: String,

    #[arg(long, env = "GOVERNANCE_MODEL", default_value = "gpt-3.5-turbo")]
    pub governance_model: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}
