use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::domain::TaxId;
use crate::error::TaxError;

/// Narrow seam over the external taxonomy query tool.
pub trait TaxonomyTool {
    /// Runs a single taxonomy summary for `taxid` and returns the raw stdout.
    fn summary(&self, taxid: &TaxId) -> Result<String, TaxError>;

    fn version(&self) -> Option<String> {
        None
    }
}

/// Invokes `datasets summary taxonomy taxon <id> --as-json-lines`.
#[derive(Debug, Clone)]
pub struct DatasetsCli {
    program: PathBuf,
    api_key: Option<String>,
}

impl DatasetsCli {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        let api_key = std::env::var("NCBI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Self {
            program: program.into(),
            api_key,
        }
    }

    /// Resolves an explicit tool path, falling back to PATH lookup when it is
    /// a bare command name.
    pub fn resolve(program: &str) -> Result<Self, TaxError> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 || candidate.exists() {
            if !candidate.exists() {
                return Err(TaxError::MissingTool(program.to_string()));
            }
            return Ok(Self::with_program(candidate));
        }
        let found =
            find_in_path(program).ok_or_else(|| TaxError::MissingTool(program.to_string()))?;
        Ok(Self::with_program(found))
    }

    fn summary_args(&self, taxid: &TaxId) -> Vec<String> {
        let mut args = vec![
            "summary".to_string(),
            "taxonomy".to_string(),
            "taxon".to_string(),
            taxid.as_str().to_string(),
            "--as-json-lines".to_string(),
        ];
        if let Some(key) = &self.api_key {
            args.push("--api-key".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl TaxonomyTool for DatasetsCli {
    fn summary(&self, taxid: &TaxId) -> Result<String, TaxError> {
        debug!(program = %self.program.display(), %taxid, "running taxonomy summary");
        let output = Command::new(&self.program)
            .args(self.summary_args(taxid))
            .output()
            .map_err(|err| TaxError::ToolSpawn {
                taxid: taxid.to_string(),
                message: err.to_string(),
            })?;
        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(TaxError::ToolStatus {
                taxid: taxid.to_string(),
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn version(&self) -> Option<String> {
        tool_version(&self.program, &["--version"])
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}

fn tool_version(path: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(path).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() { None } else { Some(stdout) }
}
