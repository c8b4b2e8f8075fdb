//! Plain-text extraction: fixed-size line-block chunking. This is also the
//! universal fallback for any file that isn't a recognized document format.

use std::fs;
use std::path::Path;

use crate::budget::Budget;
use crate::error::DslError;

pub fn extract_chunks(path: &Path, budget: &Budget, chunk_lines: usize) -> Result<Vec<String>, DslError> {
    let bytes = fs::read(path).map_err(|e| {
        DslError::runtime(format!("Failed to read '{}': {e}", path.display()))
    })?;
    let text = String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

    if text.is_empty() {
        return Ok(vec![String::new()]);
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Ok(vec![text]);
    }

    let mut chunks = Vec::new();
    for block in lines.chunks(chunk_lines.max(1)) {
        budget.check("extract:text")?;
        chunks.push(block.join("\n").trim().to_string());
    }

    if chunks.is_empty() {
        Ok(vec![text])
    } else {
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;

    #[test]
    fn single_short_file_is_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "alpha\nbeta\ngamma\n").unwrap();
        let chunks = extract_chunks(&path, &Budget::unbounded(), 80).unwrap();
        assert_eq!(chunks, vec!["alpha\nbeta\ngamma"]);
    }

    #[test]
    fn long_file_splits_into_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        let content: String = (0..200).map(|i| format!("line {i}\n")).collect();
        fs::write(&path, content).unwrap();
        let chunks = extract_chunks(&path, &Budget::unbounded(), 80).unwrap();
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn empty_file_is_single_empty_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();
        let chunks = extract_chunks(&path, &Budget::unbounded(), 80).unwrap();
        assert_eq!(chunks, vec![""]);
    }

    #[test]
    fn custom_chunk_lines_changes_split_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        let content: String = (0..200).map(|i| format!("line {i}\n")).collect();
        fs::write(&path, content).unwrap();
        let chunks = extract_chunks(&path, &Budget::unbounded(), 50).unwrap();
        assert_eq!(chunks.len(), 4);
    }
}
