//! Bug reporter: persists divergence evidence as structured records.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::substate::{Alloc, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BugType {
    Env,
    Tod,
    Mani,
    Hook,
}

impl fmt::Display for BugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BugType::Env => "ENV",
            BugType::Tod => "TOD",
            BugType::Mani => "MANI",
            BugType::Hook => "HOOK",
        };
        write!(f, "{s}")
    }
}

/// One detected state-inconsistency, identified by `(contract_addr,
/// block_number)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecord {
    pub bug_type: BugType,
    pub contract_addr: String,
    pub block_number: u64,
    pub input_alloc: Alloc,
    pub output_alloc: Alloc,
    pub input_message: Message,
    pub addit_from: Option<String>,
    pub addit_to: Option<String>,
    pub addit_data: Option<String>,
    pub ori_alloc: Alloc,
    pub mut_alloc: Alloc,
}

impl BugRecord {
    fn output_path(&self, dir: &Path) -> std::path::PathBuf {
        dir.join(format!("{}_{}.json", self.contract_addr, self.block_number))
    }

    fn bug_log_line(&self) -> String {
        format!(
            "[SIBugLog] alloc differ under {} in {} in {}",
            self.bug_type, self.contract_addr, self.block_number
        )
    }
}

/// Appends a non-fatal task error to `errorLog.txt`.
pub fn log_error(ctx: &Context, message: &str) -> std::io::Result<()> {
    append_line(&ctx.error_log_path(), &format!("[ErrorLog] {message}"))
}

/// Appends a one-line summary to `SIbugLog.txt` and writes the full record
/// to `output/<addr>_<block>.json`.
pub fn write_bug(ctx: &Context, record: &BugRecord) -> std::io::Result<()> {
    append_line(&ctx.bug_log_path(), &record.bug_log_line())?;

    let output_dir = ctx.output_dir();
    fs::create_dir_all(&output_dir)?;
    let path = record.output_path(&output_dir);
    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, record)?;
    set_permissive_mode(&path);
    Ok(())
}

#[cfg(unix)]
fn set_permissive_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o777);
        let _ = fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_permissive_mode(_path: &Path) {}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
