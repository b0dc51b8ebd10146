// Shared helpers; not every test file uses all of them.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use groupmaps::{GroupMapsError, Result, ToolCommand, ToolRunner};

/// Stands in for FSL and PALM: records every call and creates the file the real tool would write.
#[derive(Debug, Default)]
pub struct FakeTools {
    pub zmap_suffix: String,
    pub calls: Vec<ToolCommand>,
    /// Program name that fails instead of producing output.
    pub failing: Option<String>,
}

impl FakeTools {
    pub fn new(zmap_suffix: &str) -> FakeTools {
        FakeTools {
            zmap_suffix: zmap_suffix.to_string(),
            ..FakeTools::default()
        }
    }

    pub fn programs(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.program()).collect()
    }
}

impl ToolRunner for FakeTools {
    fn run(&mut self, command: &ToolCommand) -> Result<()> {
        self.calls.push(command.clone());
        if self.failing.as_deref() == Some(command.program()) {
            return Err(GroupMapsError::ExternalTool(command.program().to_string(), String::from("exit status: 1")));
        }
        let args = command.get_args();
        let output = match command.program() {
            "fslmerge" | "fslmaths" => PathBuf::from(&args[2]),
            "palm" => {
                let mut z = args[3].clone();
                z.push(&self.zmap_suffix);
                z.push(".nii");
                PathBuf::from(z)
            }
            other => panic!("unexpected tool {}", other),
        };
        fs::write(output, b"fake")?;
        Ok(())
    }
}

pub const RUN_NAMES: [&str; 3] = [
    "sub-01_ses-1_task-rest_run-1_maps.nii.gz",
    "sub-01_ses-1_task-rest_run-2_maps.nii.gz",
    "sub-02_ses-1_task-rest_run-1_maps.nii.gz",
];

/// A dual regression output directory with one (empty) map per entry of [`RUN_NAMES`].
pub fn write_catalog_dir(root: &Path) -> PathBuf {
    let dr = root.join("dual_regression");
    fs::create_dir_all(dr.join("nested")).unwrap();
    fs::write(dr.join(RUN_NAMES[0]), b"run 1").unwrap();
    fs::write(dr.join(RUN_NAMES[1]), b"run 2").unwrap();
    fs::write(dr.join("nested").join(RUN_NAMES[2]), b"sub 2").unwrap();
    dr
}
