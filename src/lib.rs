//! # rulecheck - Linter for proxy routing configuration
//!
//! Catches malformed or inconsistent rule lists and rule-set/proxy-group
//! configuration before it is shipped to a proxy client.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        rulecheck                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap) + Settings (serde_yaml)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Discovery (walkdir)                                        │
//! │    └── root directory, *.list files                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Rule lists                                                 │
//! │    ├── Line syntax (regex, ipnet)                           │
//! │    └── Duplicates (per file, across files)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Profile (ruleset= / custom_proxy_group=)                   │
//! │    ├── Selector vs node sections                            │
//! │    ├── Group references                                     │
//! │    └── Rule-set sources (HTTPS, allowlist, reqwest probe)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Report ([ERROR]/[WARN]/[INFO] text or JSON, exit code)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use rulecheck::runner::Runner;
//! use rulecheck::settings::Settings;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = Path::new("/srv/proxy-rules");
//!     let settings = Settings::load_from_root(root)?;
//!
//!     let report = Runner::new(root, settings).run().await?;
//!     print!("{}", report.render_text());
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`diagnostic`] - Diagnostics, report and rendering
//! - [`discovery`] - Root directory and rule file discovery
//! - [`duplicates`] - Intra-file and cross-file duplicate rules
//! - [`error`] - Fatal error types
//! - [`probe`] - Reachability probe for remote rule-sets
//! - [`profile`] - Profile parser (rule-sets, proxy groups)
//! - [`references`] - Selector group reference checks
//! - [`rules`] - Rule line syntax
//! - [`runner`] - Orchestration of all checks
//! - [`settings`] - Settings file and overrides
//! - [`sources`] - Rule-set source checks

pub mod cli;
pub mod diagnostic;
pub mod discovery;
pub mod duplicates;
pub mod error;
pub mod probe;
pub mod profile;
pub mod references;
pub mod rules;
pub mod runner;
pub mod settings;
pub mod sources;

pub use cli::Cli;
pub use diagnostic::{Diagnostic, Report, Severity};
pub use error::LintError;
pub use settings::Settings;
