// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where each crop lands on disk.

use std::path::{Path, PathBuf};

use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::paths::{self, PathStyle};
use schnittwerk_core::types::{CropJob, OutputLayout};
use tracing::debug;

/// Builds destination paths under the output root.
#[derive(Debug, Clone)]
pub struct Destinations {
    root: String,
    layout: OutputLayout,
    style: PathStyle,
}

impl Destinations {
    pub fn new(root: impl AsRef<Path>, layout: OutputLayout, style: PathStyle) -> Self {
        Self {
            root: root.as_ref().to_string_lossy().into_owned(),
            layout,
            style,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Normalized destination for `job`. Pure: touches no filesystem.
    ///
    /// Hierarchical: `root/operativo/area/cod_item/filename`.
    /// Flat: `root/filename`.
    pub fn path_for(&self, job: &CropJob) -> String {
        match self.layout {
            OutputLayout::Hierarchical => paths::join(
                &[
                    &self.root,
                    &job.operational_unit,
                    &job.area,
                    &job.item_code,
                    &job.file_name,
                ],
                self.style,
            ),
            OutputLayout::Flat => paths::join(&[&self.root, &job.file_name], self.style),
        }
    }

    /// Destination for `job` with its parent directory (re)created.
    ///
    /// A file name that normalizes to nothing is a `WriteFailure`: the crop
    /// would otherwise land on the item directory itself.
    pub fn prepare(&self, job: &CropJob) -> Result<PathBuf> {
        let file_name = paths::normalize(&job.file_name, self.style);
        if matches!(file_name.as_str(), "" | "." | "..") {
            return Err(SchnittwerkError::WriteFailure {
                path: PathBuf::from(self.path_for(job)),
                reason: format!("field {} has no output file name", job.key),
            });
        }

        let path = PathBuf::from(self.path_for(job));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SchnittwerkError::WriteFailure {
                path: parent.to_path_buf(),
                reason: format!("cannot create destination directory: {e}"),
            })?;
            debug!(dir = %parent.display(), "destination directory ready");
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::job;

    #[test]
    fn hierarchical_layout_nests_naming_attributes() {
        let mut j = job("MAT001", 1, 7, "/scans/0001.tif");
        j.operational_unit = "Operativo Ñuble".into();
        j.area = "Matemática".into();
        j.item_code = "M-01".into();
        j.file_name = "00012 .tif".into();

        let dest = Destinations::new("/srv/recortes", OutputLayout::Hierarchical, PathStyle::Posix);
        assert_eq!(
            dest.path_for(&j),
            "/srv/recortes/Operativo_Nuble/Matematica/M-01/00012_.tif"
        );
    }

    #[test]
    fn flat_layout_ignores_naming_attributes() {
        let j = job("MAT001", 1, 7, "/scans/0001.tif");
        let dest = Destinations::new("/srv/recortes/", OutputLayout::Flat, PathStyle::Posix);
        assert_eq!(dest.path_for(&j), format!("/srv/recortes/{}", j.file_name));
    }

    #[test]
    fn windows_style_uses_backslashes() {
        let mut j = job("MAT001", 1, 7, "/scans/0001.tif");
        j.operational_unit = "OP".into();
        j.area = "Lengua".into();
        j.item_code = "L1".into();
        j.file_name = "a.tif".into();

        let dest = Destinations::new(r"D:\RECORTES", OutputLayout::Hierarchical, PathStyle::Windows);
        assert_eq!(dest.path_for(&j), r"D:\RECORTES\OP\Lengua\L1\a.tif");
    }

    #[test]
    fn empty_attributes_are_dropped() {
        let mut j = job("MAT001", 1, 7, "/scans/0001.tif");
        j.area = String::new();
        j.file_name = "x.tif".into();
        j.operational_unit = "OP".into();
        j.item_code = "I".into();

        let dest = Destinations::new("/out", OutputLayout::Hierarchical, PathStyle::Posix);
        assert_eq!(dest.path_for(&j), "/out/OP/I/x.tif");
    }

    #[test]
    fn prepare_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut j = job("MAT001", 1, 7, "/scans/0001.tif");
        j.operational_unit = "OP".into();
        j.area = "Area".into();
        j.item_code = "I1".into();
        j.file_name = "f.tif".into();

        let dest = Destinations::new(dir.path(), OutputLayout::Hierarchical, PathStyle::native());
        let path = dest.prepare(&j).expect("prepare");
        assert!(path.parent().expect("parent").is_dir());
        assert!(path.ends_with("f.tif"));
    }

    #[test]
    fn blank_file_name_is_rejected_without_touching_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut j = job("MAT001", 1, 7, "/scans/0001.tif");
        j.file_name = "   ".into();

        let dest = Destinations::new(dir.path(), OutputLayout::Hierarchical, PathStyle::native());
        assert!(matches!(
            dest.prepare(&j),
            Err(SchnittwerkError::WriteFailure { .. })
        ));
        assert!(!dir.path().join("OP").exists());
    }
}
