//! Rules file: a JSON array of `{country_code, rate, dropped}`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tariffgate_core::error::{Result, TariffError};
use tariffgate_core::TariffRule;

/// Load persisted rules. A missing file is an empty table.
pub fn load_rules(path: &Path) -> Result<Vec<TariffRule>> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(TariffError::Internal(format!(
                "read rules file {} failed: {e}",
                path.display()
            )))
        }
    };

    let rules: Vec<TariffRule> = serde_json::from_str(&s)
        .map_err(|e| TariffError::BadRequest(format!("invalid rules file {}: {e}", path.display())))?;
    for rule in &rules {
        rule.validate()?;
    }
    Ok(rules)
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// Each write gets its own temp file so overlapping saves never share one.
fn temp_path(path: &Path) -> PathBuf {
    let n = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("json.{}.{n}.tmp", std::process::id()))
}

/// Write rules sorted by country code; goes through a sibling temp file and a rename.
///
/// Callers that save from several threads serialize the calls themselves
/// (see `AppState::save_rules`); this only guarantees the file is never torn.
pub fn save_rules(path: &Path, rules: &[TariffRule]) -> Result<()> {
    let mut sorted = rules.to_vec();
    sorted.sort_by(|a, b| a.country_code.cmp(&b.country_code));

    let body = serde_json::to_string_pretty(&sorted)
        .map_err(|e| TariffError::Internal(format!("encode rules failed: {e}")))?;

    let tmp = temp_path(path);
    fs::write(&tmp, body)
        .map_err(|e| TariffError::Internal(format!("write {} failed: {e}", tmp.display())))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(TariffError::Internal(format!("rename to {} failed: {e}", path.display())));
    }

    tracing::debug!(path = %path.display(), rules = sorted.len(), "rules file saved");
    Ok(())
}
