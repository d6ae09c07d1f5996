use crate::error::{ProcessingError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Sidecar extensions that belong to a shapefile bundle
const SHAPEFILE_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Scratch directory holding files extracted from a zipped shapefile.
///
/// The shapefile reader needs seekable files with matching stems side by
/// side, so archive members are flattened into one directory which lives as
/// long as the manager.
pub struct TempFileManager {
    temp_dir: TempDir,
    extracted_files: HashMap<String, PathBuf>,
}

impl TempFileManager {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().map_err(|e| {
            ProcessingError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create temporary directory: {}", e),
            ))
        })?;

        Ok(Self {
            temp_dir,
            extracted_files: HashMap::new(),
        })
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Extract every shapefile component and return the path of the `.shp`.
    ///
    /// When the archive holds several layers the first `.shp` in archive
    /// order wins and the others are logged.
    pub fn extract_shapefile(&mut self, zip_path: &Path) -> Result<PathBuf> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut shp_paths = Vec::new();

        for i in 0..archive.len() {
            let mut zip_file = archive.by_index(i)?;
            if zip_file.is_dir() {
                continue;
            }

            // Flatten directories; reject names that would escape the temp dir
            let Some(file_name) = zip_file
                .enclosed_name()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            else {
                tracing::warn!(member = zip_file.name(), "skipping unsafe archive member");
                continue;
            };

            let extension = Path::new(&file_name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            let Some(extension) = extension else {
                continue;
            };
            if !SHAPEFILE_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            // The shapefile reader finds sidecars by lower-case extension
            let stem = Path::new(&file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let normalized = format!("{}.{}", stem, extension);

            let dest_path = self.write_member(&mut zip_file, &normalized)?;
            if extension == "shp" {
                shp_paths.push(dest_path);
            }
        }

        let mut shp_paths = shp_paths.into_iter();
        let shp_path = shp_paths.next().ok_or_else(|| {
            ProcessingError::InvalidFormat(format!(
                "No .shp file found in archive '{}'",
                zip_path.display()
            ))
        })?;
        for ignored in shp_paths {
            tracing::warn!(layer = %ignored.display(), "ignoring additional shapefile layer");
        }

        tracing::debug!(
            archive = %zip_path.display(),
            shapefile = %shp_path.display(),
            files = self.extracted_files.len(),
            "extracted boundary shapefile"
        );
        Ok(shp_path)
    }

    fn write_member(&mut self, reader: &mut impl std::io::Read, file_name: &str) -> Result<PathBuf> {
        if let Some(path) = self.extracted_files.get(file_name) {
            return Ok(path.clone());
        }

        let dest_path = self.temp_dir.path().join(file_name);
        let mut dest_file = File::create(&dest_path)?;
        let mut writer = BufWriter::new(&mut dest_file);
        std::io::copy(reader, &mut writer)?;
        writer.flush()?;

        self.extracted_files
            .insert(file_name.to_string(), dest_path.clone());
        Ok(dest_path)
    }

    pub fn list_extracted_files(&self) -> Vec<&String> {
        self.extracted_files.keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::{CompressionMethod, ZipWriter};

    fn create_test_zip(members: &[(&str, &[u8])]) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        {
            let mut zip = ZipWriter::new(&file);
            for (name, content) in members {
                zip.start_file(
                    *name,
                    zip::write::FileOptions::default().compression_method(CompressionMethod::Stored),
                )?;
                zip.write_all(content)?;
            }
            zip.finish()?;
        }
        Ok(file)
    }

    #[test]
    fn test_temp_file_manager_creation() -> Result<()> {
        let manager = TempFileManager::new()?;
        assert!(manager.temp_dir_path().exists());
        Ok(())
    }

    #[test]
    fn test_extract_shapefile_flattens_directories() -> Result<()> {
        let test_zip = create_test_zip(&[
            ("boundary/MP14_PLNG_AREA_WEB_PL.shp", b"shp"),
            ("boundary/MP14_PLNG_AREA_WEB_PL.shx", b"shx"),
            ("boundary/MP14_PLNG_AREA_WEB_PL.DBF", b"dbf"),
            ("boundary/readme.txt", b"ignored"),
        ])?;
        let mut manager = TempFileManager::new()?;

        let shp_path = manager.extract_shapefile(test_zip.path())?;
        assert_eq!(shp_path.parent(), Some(manager.temp_dir_path()));
        assert_eq!(std::fs::read(&shp_path)?, b"shp");
        assert!(manager
            .temp_dir_path()
            .join("MP14_PLNG_AREA_WEB_PL.dbf")
            .exists());
        assert!(!manager
            .temp_dir_path()
            .join("MP14_PLNG_AREA_WEB_PL.DBF")
            .exists());
        assert_eq!(manager.list_extracted_files().len(), 3);
        Ok(())
    }

    #[test]
    fn test_archive_without_shapefile() -> Result<()> {
        let test_zip = create_test_zip(&[("notes.txt", b"nothing here")])?;
        let mut manager = TempFileManager::new()?;

        let result = manager.extract_shapefile(test_zip.path());
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
        Ok(())
    }

    #[test]
    fn test_repeated_extraction_reuses_files() -> Result<()> {
        let test_zip = create_test_zip(&[("a.shp", b"1"), ("a.dbf", b"2")])?;
        let mut manager = TempFileManager::new()?;

        let first = manager.extract_shapefile(test_zip.path())?;
        let second = manager.extract_shapefile(test_zip.path())?;
        assert_eq!(first, second);
        assert_eq!(manager.list_extracted_files().len(), 2);
        Ok(())
    }
}
