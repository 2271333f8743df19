use crate::core::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;

/// 讀取輸入目錄、寫入輸出目錄的本機儲存
#[derive(Debug, Clone)]
pub struct LocalStorage {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.input_dir.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.output_dir.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_input_and_writes_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("students.csv"), "name\nAnn\n").unwrap();

        let storage = LocalStorage::new(input.path(), output.path().join("nested"));
        let data = storage.read_file("students.csv").await.unwrap();
        assert_eq!(data, b"name\nAnn\n");

        storage.write_file("plans.zip", b"zip").await.unwrap();
        assert!(output.path().join("nested/plans.zip").exists());
    }

    #[tokio::test]
    async fn test_absolute_paths_bypass_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("roster.csv");
        std::fs::write(&file, "name\n").unwrap();

        let storage = LocalStorage::new("/nonexistent", dir.path());
        let data = storage.read_file(file.to_str().unwrap()).await.unwrap();
        assert_eq!(data, b"name\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), dir.path());
        let err = storage.read_file("missing.csv").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::PlannerError::IoError(_)));
    }
}
