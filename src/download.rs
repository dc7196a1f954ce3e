use std::fs;
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::config::SourceSpec;
use crate::contract::{AcquireError, AcquiredSource, Acquirer};

/// Default acquirer: validates local paths, or clones a git repository into
/// a transient directory via the `git` binary.
pub struct GitAcquirer;

impl GitAcquirer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GitAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Acquirer for GitAcquirer {
    async fn acquire(&self, source: &SourceSpec) -> Result<AcquiredSource, AcquireError> {
        match source {
            SourceSpec::Local { path } => {
                if !path.exists() {
                    error!(path = %path.display(), "Local source path does not exist");
                    return Err(AcquireError::MissingLocalPath(path.clone()));
                }
                debug!(path = %path.display(), "Using pre-existing local source tree");
                Ok(AcquiredSource {
                    root: path.clone(),
                    transient: false,
                })
            }
            SourceSpec::Git {
                repo_url,
                reference,
                ..
            } => {
                let clone_dir = tempfile::Builder::new()
                    .prefix("repoprint-clone-")
                    .tempdir()
                    .map_err(AcquireError::CloneDir)?
                    .into_path();

                // `git clone <repo_url> <clone_dir>`
                let status = Command::new("git")
                    .arg("clone")
                    .arg(repo_url)
                    .arg(&clone_dir)
                    .status();
                match status {
                    Ok(s) if s.success() => {
                        info!(
                            repo_url = repo_url,
                            path = %clone_dir.display(),
                            "Successfully cloned git repository"
                        );
                    }
                    Ok(status) => {
                        error!(
                            repo_url = repo_url,
                            path = %clone_dir.display(),
                            "Git exited with non-zero code: {}", status
                        );
                        return Err(AcquireError::CloneFailed {
                            url: repo_url.clone(),
                            status,
                        });
                    }
                    Err(e) => {
                        error!(error = ?e, repo_url = repo_url, "Failed to launch git process");
                        return Err(AcquireError::GitLaunch(e));
                    }
                }

                // Check out the requested reference (branch, tag, or commit SHA).
                if let Some(reference) = reference {
                    let status = Command::new("git")
                        .arg("-C")
                        .arg(&clone_dir)
                        .arg("checkout")
                        .arg(reference)
                        .status();
                    match status {
                        Ok(s) if s.success() => {
                            info!(
                                reference = reference,
                                path = %clone_dir.display(),
                                "Checked out git reference"
                            );
                        }
                        Ok(status) => {
                            error!(
                                reference = reference,
                                path = %clone_dir.display(),
                                "Git checkout exited with non-zero code: {}", status
                            );
                            return Err(AcquireError::CheckoutFailed {
                                reference: reference.clone(),
                                status,
                            });
                        }
                        Err(e) => {
                            error!(error = ?e, reference = reference, "Failed to launch git checkout");
                            return Err(AcquireError::GitLaunch(e));
                        }
                    }
                }

                Ok(AcquiredSource {
                    root: clone_dir,
                    transient: true,
                })
            }
        }
    }

    async fn cleanup(&self, acquired: &AcquiredSource) -> Result<(), AcquireError> {
        if !acquired.transient {
            debug!(root = %acquired.root.display(), "Source is not transient, skipping cleanup");
            return Ok(());
        }
        remove_clone(&acquired.root)
    }
}

fn remove_clone(path: &Path) -> Result<(), AcquireError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!(path = %path.display(), "Removed transient clone");
            Ok(())
        }
        Err(source) => {
            error!(error = ?source, path = %path.display(), "Failed to remove transient clone");
            Err(AcquireError::Cleanup {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}
