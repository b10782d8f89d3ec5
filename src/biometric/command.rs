use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{BiometricError, Descriptor, FaceEncoder};

/// Runs an external encoder program: the image goes to stdin, a JSON array of
/// descriptors comes back on stdout.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEncoder {
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }

    /// Splits a command line such as `python3 encode.py --model hog`.
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), timeout))
    }

    async fn run(&self, image: &[u8]) -> Result<Vec<u8>, BiometricError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BiometricError::Unavailable(format!("{}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BiometricError::Unavailable("encoder stdin not captured".into()))?;
        stdin
            .write_all(image)
            .await
            .map_err(|e| BiometricError::Unavailable(e.to_string()))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BiometricError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BiometricError::Unavailable(format!(
                "encoder exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

pub(crate) fn parse_descriptors(stdout: &[u8]) -> Result<Vec<Descriptor>, BiometricError> {
    serde_json::from_slice(stdout).map_err(|e| BiometricError::Malformed(e.to_string()))
}

#[async_trait]
impl FaceEncoder for CommandEncoder {
    async fn extract(&self, image: &[u8]) -> Result<Vec<Descriptor>, BiometricError> {
        let stdout = tokio::time::timeout(self.timeout, self.run(image))
            .await
            .map_err(|_| {
                BiometricError::Unavailable(format!(
                    "encoder timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let descriptors = parse_descriptors(&stdout)?;
        tracing::debug!(faces = descriptors.len(), "Face encoder finished");
        Ok(descriptors)
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;

    #[test]
    fn splits_command_line() {
        let encoder =
            CommandEncoder::from_command_line("python3 encode.py --model hog", Duration::from_secs(5))
                .unwrap();
        assert_eq!(encoder.program, "python3");
        assert_eq!(encoder.args, vec!["encode.py", "--model", "hog"]);
        assert!(CommandEncoder::from_command_line("   ", Duration::from_secs(5)).is_none());
    }

    #[test]
    fn empty_array_means_no_face() {
        assert!(parse_descriptors(b"[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_output_is_malformed() {
        let err = parse_descriptors(b"Traceback (most recent call last)").unwrap_err();
        assert!(matches!(err, BiometricError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let encoder = CommandEncoder::new(
            "definitely-not-an-installed-face-encoder".into(),
            vec![],
            Duration::from_secs(5),
        );
        let err = encoder.extract(b"jpeg").await.unwrap_err();
        assert!(matches!(err, BiometricError::Unavailable(_)));
    }
}
