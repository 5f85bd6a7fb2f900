//! FILENAME: app/tests/common/mod.rs
//! Test harness and fixtures for pivot-table integration tests.

#![allow(dead_code)]

use app_lib::Config;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch workspace with `input/` and `output/` folders and a config
/// pointing at them.
pub struct TestHarness {
    pub dir: TempDir,
    pub config: Config,
}

impl TestHarness {
    /// Destination/Anchor pivot with no filters.
    pub fn new() -> Self {
        app_lib::logging::set_console(false);
        let dir = TempDir::new().expect("temp dir");
        let text = format!(
            "input_folder = {:?}\noutput_folder = {:?}\nlog_file = {:?}\nmain_column = \"Destination\"\nsecondary_column = \"Anchor\"\nmerge_output_cells = false\n",
            dir.path().join("input"),
            dir.path().join("output"),
            dir.path().join("pivot_table.log"),
        );
        let config = Config::from_toml(&text).expect("harness config");
        fs::create_dir_all(dir.path().join("input")).expect("input dir");
        TestHarness { dir, config }
    }

    /// The UK link-export rules.
    pub fn with_uk_rules() -> Self {
        let mut harness = Self::new();
        harness.config.main_column_exclude = Some(r"14-carat\/|9-carat\/|925\/".to_string());
        harness.config.secondary_column_exclude = Some("Yes|No|Menu|Page Next".to_string());
        harness
            .config
            .additional_filters
            .insert("Follow".to_string(), "FALSE".to_string());
        harness
    }

    pub fn input_dir(&self) -> PathBuf {
        self.config.input_folder.clone()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_folder.clone()
    }

    /// Writes `content` to `input/<relative>`, creating subfolders.
    pub fn write_input(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.input_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("input subdir");
        }
        fs::write(&path, content).expect("write input");
        path
    }

    pub fn output_path(&self, relative: &str) -> PathBuf {
        self.output_dir().join(relative)
    }

    /// Rows of the first sheet of `output/<relative>`, rendered as strings.
    pub fn read_output(&self, relative: &str) -> Vec<Vec<String>> {
        read_sheet(&self.output_path(relative))
    }
}

pub fn read_sheet(path: &Path) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("open xlsx");
    let range = workbook.worksheet_range("Sheet1").expect("Sheet1");
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Builds one data row per tuple; fields containing commas are quoted.
pub struct LinkFixture;

impl LinkFixture {
    pub fn header() -> &'static str {
        "Source,Destination,Anchor,Follow"
    }

    pub fn rows() -> Vec<(&'static str, &'static str, &'static str, &'static str)> {
        vec![
            ("/home", "/rings/14-carat/gold", "Gold rings", "FALSE"),
            ("/home", "/rings", "Rings", "FALSE"),
            ("/home", "/rings", "Rings", "FALSE"),
            ("/sale", "/rings", "Rings", "TRUE"),
            ("/sale", "/rings", "Page Next", "FALSE"),
            ("/sale", "/rings", "   ", "FALSE"),
            ("/home", "/necklaces", "Necklaces, silver", "FALSE"),
            ("/home", "/necklaces/925/chain", "Chains", "FALSE"),
            ("/blog", "/necklaces", "Necklaces, silver", "FALSE"),
            ("/blog", "/rings", "Wedding rings", "FALSE"),
        ]
    }

    pub fn csv() -> String {
        let mut text = String::from(Self::header());
        text.push('\n');
        for (source, destination, anchor, follow) in Self::rows() {
            let anchor = if anchor.contains(',') {
                format!("\"{}\"", anchor)
            } else {
                anchor.to_string()
            };
            text.push_str(&format!("{},{},{},{}\n", source, destination, anchor, follow));
        }
        text
    }
}
