use crate::TeslalogError;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Where input lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    /// Follow a growing file via `tail -n <numlines> -F`.
    Follow { path: PathBuf, numlines: usize },
}

impl Source {
    /// Positional files in order, then the followed file if any.
    pub fn plan(files: &[PathBuf], follow: Option<&PathBuf>, numlines: usize) -> Vec<Source> {
        let mut sources: Vec<Source> = files.iter().cloned().map(Source::File).collect();
        if let Some(path) = follow {
            sources.push(Source::Follow {
                path: path.clone(),
                numlines,
            });
        }
        sources
    }
}

/// An open input. A followed file's `tail` child is killed on drop.
pub struct InputStream {
    reader: BufReader<Box<dyn Read>>,
    child: Option<Child>,
}

impl InputStream {
    pub fn open(source: &Source) -> Result<Self, TeslalogError> {
        match source {
            Source::File(path) => {
                let file = File::open(path).map_err(|e| {
                    TeslalogError::Config(format!("cannot open {}: {e}", path.display()))
                })?;
                Ok(Self {
                    reader: BufReader::new(Box::new(file)),
                    child: None,
                })
            }
            Source::Follow { path, numlines } => {
                let mut child = Command::new("tail")
                    .arg("-n")
                    .arg(numlines.to_string())
                    .arg("-F")
                    .arg(path)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .spawn()?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| TeslalogError::Config("tail produced no stdout".into()))?;
                log::info!("following {}", path.display());
                Ok(Self {
                    reader: BufReader::new(Box::new(stdout)),
                    child: Some(child),
                })
            }
        }
    }

    /// Next raw line including its newline, or `None` at end of input.
    /// Invalid UTF-8 is replaced rather than failing the stream.
    pub fn next_line(&mut self) -> Result<Option<String>, TeslalogError> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

impl Drop for InputStream {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn plan_puts_follow_last() {
        let files = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];
        let follow = PathBuf::from("live.json");
        let plan = Source::plan(&files, Some(&follow), 10);
        assert_eq!(
            plan,
            vec![
                Source::File("a.json".into()),
                Source::File("b.json".into()),
                Source::Follow {
                    path: "live.json".into(),
                    numlines: 10
                },
            ]
        );
        assert_eq!(Source::plan(&files, None, 10).len(), 2);
    }

    #[test]
    fn reads_lines_with_and_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.json");
        std::fs::write(&path, "one\ntwo\nthree").unwrap();

        let mut input = InputStream::open(&Source::File(path)).unwrap();
        assert_eq!(input.next_line().unwrap().as_deref(), Some("one\n"));
        assert_eq!(input.next_line().unwrap().as_deref(), Some("two\n"));
        assert_eq!(input.next_line().unwrap().as_deref(), Some("three"));
        assert_eq!(input.next_line().unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = InputStream::open(&Source::File(dir.path().join("nope.json")));
        assert!(result.is_err());
    }
}
