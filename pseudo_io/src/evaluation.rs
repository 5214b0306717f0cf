use glob::{glob, Pattern};
use nerview::{BatchEvaluation, FileFailure};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Content of every `*.txt` file of `dir`, keyed by file name and sorted by path. A file that
/// cannot be read or is not valid UTF-8 comes with the reason instead of its content.
pub fn read_evaluation_dir(
    dir: &Path,
) -> Result<Vec<(String, Result<String, FileFailure>)>, LoadError> {
    let pattern = Path::new(&Pattern::escape(&dir.to_string_lossy())).join("*.txt");
    let mut files = vec![];
    for entry in glob(&pattern.to_string_lossy())? {
        let file = match entry {
            Ok(path) => {
                let content = std::fs::read(&path)
                    .map_err(|e| FileFailure::Io(e.to_string()))
                    .and_then(|bytes| {
                        String::from_utf8(bytes).map_err(|e| FileFailure::Encoding(e.to_string()))
                    });
                (file_name(&path), content)
            }
            Err(e) => (file_name(e.path()), Err(FileFailure::Io(e.error().to_string()))),
        };
        files.push(file);
    }
    debug!("Found {} evaluation files in {}", files.len(), dir.display());
    Ok(files)
}

/// Evaluates every `*.txt` file of `dir`. Unreadable files end up in the failures of the batch.
pub fn evaluate_dir(dir: &Path) -> Result<BatchEvaluation, LoadError> {
    let mut batch = BatchEvaluation::default();
    for (name, content) in read_evaluation_dir(dir)? {
        match content {
            Ok(content) => batch.add_file(name, &content),
            Err(failure) => batch.add_failure(name, failure),
        }
    }
    Ok(batch)
}
