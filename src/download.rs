//! Invocation of the external downloader, once per resolved uri.

use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    process::Stdio,
};

use crate::{resolver::DownloadItem, ResourceId};

pub const DEFAULT_PROGRAM: &str = "freyr";

#[derive(Debug, Clone)]
pub struct Downloader {
    program: PathBuf,
    output_dir: PathBuf,
    atomic_parsley: Option<PathBuf>,
    log_dir: PathBuf,
}

/// Append-only files receiving the downloader's stdout and stderr.
#[derive(Debug)]
pub struct DownloadLogs {
    pub out_path: PathBuf,
    pub err_path: PathBuf,
    out: File,
    err: File,
}

impl DownloadLogs {
    /// Open `<dir>/<unix time>.out` and `.err` in append mode.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let name = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string();
        let out_path = dir.join(&name).with_extension("out");
        let err_path = dir.join(&name).with_extension("err");
        let open = |path: &Path| OpenOptions::new().create(true).append(true).open(path);
        Ok(Self {
            out: open(&out_path)?,
            err: open(&err_path)?,
            out_path,
            err_path,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub succeeded: usize,
    pub failed: Vec<ResourceId>,
}

impl Downloader {
    pub fn new(program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
            atomic_parsley: None,
            log_dir: PathBuf::from("log"),
        }
    }

    pub fn with_atomic_parsley(self, path: Option<PathBuf>) -> Self {
        Self {
            atomic_parsley: path,
            ..self
        }
    }

    pub fn with_log_dir(self, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..self
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn args(&self, uri: &ResourceId) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            uri.to_uri().into(),
            "--no-bar".into(),
            "--no-logo".into(),
            "--no-header".into(),
            "--no-stats".into(),
            "-d".into(),
            self.output_dir.clone().into(),
        ];
        if let Some(atomic_parsley) = &self.atomic_parsley {
            args.push("--atomic-parsley".into());
            args.push(atomic_parsley.clone().into());
        }
        args
    }

    /// Run the downloader for a single item. A failed invocation is logged and reported as
    /// `false`, never as an error.
    pub async fn download(&self, logs: &DownloadLogs, item: &DownloadItem) -> bool {
        let uri = &item.uri;
        tracing::info!("downloading {} '{}'", uri.resource, item.name());

        let result: std::io::Result<std::process::ExitStatus> = async {
            let mut command = tokio::process::Command::new(&self.program);
            command
                .args(self.args(uri))
                .stdin(Stdio::null())
                .stdout(logs.out.try_clone()?)
                .stderr(logs.err.try_clone()?);
            tracing::debug!("executing {:?}", command);
            command.status().await
        }
        .await;

        match result {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::error!(
                    "{} exited with {} for {}, see {}",
                    self.program.display(),
                    status,
                    uri,
                    logs.err_path.display()
                );
                false
            }
            Err(err) => {
                tracing::error!("failed to run {}: {}", self.program.display(), err);
                false
            }
        }
    }

    /// Download every item in order, calling `progress` after each invocation.
    pub async fn download_all<F>(
        &self,
        items: &[DownloadItem],
        mut progress: F,
    ) -> std::io::Result<DownloadReport>
    where
        F: FnMut(usize, &DownloadItem),
    {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let logs = DownloadLogs::open(&self.log_dir)?;
        tracing::debug!(
            "downloader output goes to {} and {}",
            logs.out_path.display(),
            logs.err_path.display()
        );

        let mut report = DownloadReport::default();
        for (idx, item) in items.iter().enumerate() {
            if self.download(&logs, item).await {
                report.succeeded += 1;
            } else {
                report.failed.push(item.uri.clone());
            }
            progress(idx + 1, item);
        }
        Ok(report)
    }
}
