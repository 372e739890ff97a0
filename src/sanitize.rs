//! Turning free text into names that are safe to use as a single path component.

use std::path::PathBuf;

const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_LENGTH: usize = 100;

#[async_trait::async_trait]
pub trait Sanitizer: Send + Sync {
    async fn sanitize(&self, name: &str) -> String;
}

/// Replaces reserved and control characters, collapsing runs of replacements.
#[derive(Debug, Clone)]
pub struct FilenameSanitizer {
    replacement: String,
}

impl Default for FilenameSanitizer {
    fn default() -> Self {
        Self::new("_")
    }
}

impl FilenameSanitizer {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }

    /// Synchronous form of [`Sanitizer::sanitize`].
    pub fn sanitize_name(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut replaced = false;
        for c in name.chars() {
            if RESERVED.contains(&c) || c.is_control() {
                if !replaced {
                    out.push_str(&self.replacement);
                }
                replaced = true;
            } else {
                out.push(c);
                replaced = false;
            }
        }

        let mut out = out.trim_end_matches(['.', ' ']).to_owned();
        if out.chars().count() > MAX_LENGTH {
            out = out.chars().take(MAX_LENGTH).collect();
        }
        if out.is_empty() || out == "." || out == ".." {
            return self.replacement.clone();
        }
        out
    }
}

#[async_trait::async_trait]
impl Sanitizer for FilenameSanitizer {
    async fn sanitize(&self, name: &str) -> String {
        self.sanitize_name(name)
    }
}

/// Delegates to an external command, invoked as `<program> <args..> <name> --replacement <r>`.
///
/// Falls back to [`FilenameSanitizer`] when the command fails.
#[derive(Debug, Clone)]
pub struct CommandSanitizer {
    program: PathBuf,
    args: Vec<String>,
    fallback: FilenameSanitizer,
}

impl CommandSanitizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, replacement: &str) -> Self {
        Self {
            program: program.into(),
            args,
            fallback: FilenameSanitizer::new(replacement),
        }
    }
}

#[async_trait::async_trait]
impl Sanitizer for CommandSanitizer {
    async fn sanitize(&self, name: &str) -> String {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(name)
            .arg("--replacement")
            .arg(&self.fallback.replacement)
            .stdin(std::process::Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let sanitized = String::from_utf8_lossy(&output.stdout)
                    .trim_end_matches(['\r', '\n'])
                    .to_owned();
                if sanitized.is_empty() {
                    self.fallback.sanitize_name(name)
                } else {
                    sanitized
                }
            }
            Ok(output) => {
                tracing::error!(
                    "{}: error when sanitizing '{}': {}",
                    self.program.display(),
                    name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                self.fallback.sanitize_name(name)
            }
            Err(err) => {
                tracing::error!("failed to run {}: {}", self.program.display(), err);
                self.fallback.sanitize_name(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_sanitizer() {
        let sanitizer = FilenameSanitizer::default();
        let sanitizer = |name: &str| sanitizer.sanitize_name(name);
        assert_eq!(sanitizer("Night / Drive"), "Night _ Drive");
        assert_eq!(sanitizer("AC/DC"), "AC_DC");
        assert_eq!(sanitizer("What?: <Live>"), "What_ _Live_");
        assert_eq!(sanitizer("Sigur Rós"), "Sigur Rós");
        assert_eq!(sanitizer("()"), "()");
        assert_eq!(sanitizer("a\tb"), "a_b");
        assert_eq!(sanitizer("Vol. 2..."), "Vol. 2");
        assert_eq!(sanitizer(".."), "_");
        assert_eq!(sanitizer(""), "_");
        assert_eq!(sanitizer(&"x".repeat(300)).len(), MAX_LENGTH);
    }

    #[tokio::test]
    async fn test_custom_replacement() {
        let sanitizer = FilenameSanitizer::new("-");
        assert_eq!(sanitizer.sanitize("AC/DC").await, "AC-DC");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_sanitizer() {
        // echo prints its arguments: "<name> --replacement _"
        let sanitizer = CommandSanitizer::new("echo", Vec::new(), "_");
        assert_eq!(sanitizer.sanitize("AC/DC").await, "AC/DC --replacement _");

        let sanitizer = CommandSanitizer::new("/does/not/exist", Vec::new(), "_");
        assert_eq!(sanitizer.sanitize("AC/DC").await, "AC_DC");
    }
}
