//! Conversion of filled documents to the distribution format.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use super::AssemblyError;
use crate::config::ConverterConfig;

/// Turns a filled document into its converted form.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Extension of the files this converter produces, without the dot.
    fn target_extension(&self) -> &str;

    /// Converts `source` into `output_dir` and returns the expected output path.
    ///
    /// The caller is responsible for checking the output actually exists.
    async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError>;
}

/// Headless LibreOffice (`soffice --convert-to`).
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary: String,
    target_format: String,
    timeout: Option<Duration>,
}

impl LibreOfficeConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            binary: config.libreoffice_path.clone(),
            target_format: config.target_format.clone(),
            timeout: config.timeout(),
        }
    }
}

/// `<output_dir>/<source stem>.<extension>`
pub fn expected_output(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", stem, extension))
}

#[async_trait]
impl DocumentConverter for LibreOfficeConverter {
    fn target_extension(&self) -> &str {
        &self.target_format
    }

    async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
        let mut cmd = TokioCommand::new(&self.binary);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg(&self.target_format)
            .arg("--outdir")
            .arg(output_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!(
            "Converting {} to {} with {}",
            crate::sanitize::redact_path(source),
            self.target_format,
            self.binary
        );

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    AssemblyError::ConversionFailed(format!(
                        "{} did not finish within {}s",
                        self.binary,
                        limit.as_secs()
                    ))
                })?,
            None => cmd.output().await,
        }
        .map_err(|e| AssemblyError::ConversionFailed(format!("Failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssemblyError::ConversionFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                crate::sanitize::truncate(stderr.trim(), 500)
            )));
        }

        Ok(expected_output(source, output_dir, &self.target_format))
    }
}
