//! Macro recommender backed by an external program.
//!
//! The program receives the JSON-encoded `RecommendationRequest` on stdin
//! and must print a JSON `Recommendation` on stdout. Timeouts and retries
//! are applied by the caller, see [`crate::recommend`].

use crate::config::RecommenderConfig;
use crate::{Error, MacroRecommender, Recommendation, RecommendationRequest, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct CommandRecommender {
    program: String,
    args: Vec<String>,
}

impl CommandRecommender {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RecommenderConfig) -> Result<Self> {
        let program = config.command.clone().ok_or_else(|| {
            Error::Config("no macro recommender configured (set recommender.command)".into())
        })?;
        Ok(Self::new(program, config.args.clone()))
    }

    /// Recommender for the configured command, or one that reports the
    /// missing configuration when first asked for a recommendation
    pub fn resolve(config: &RecommenderConfig) -> Arc<dyn MacroRecommender> {
        match Self::from_config(config) {
            Ok(recommender) => Arc::new(recommender),
            Err(e) => Arc::new(UnconfiguredRecommender {
                reason: e.to_string(),
            }),
        }
    }
}

/// Stands in for a recommender that could not be set up
#[derive(Clone, Debug)]
pub struct UnconfiguredRecommender {
    reason: String,
}

impl MacroRecommender for UnconfiguredRecommender {
    fn recommend(&self, _request: &RecommendationRequest) -> Result<Recommendation> {
        Err(Error::Config(self.reason.clone()))
    }
}

impl MacroRecommender for CommandRecommender {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Recommender(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program may answer without reading its input
            if let Err(e) = stdin.write_all(&payload) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Recommender(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Recommender(format!("malformed recommender output: {}", e)))
    }
}
