// src/stages/lockdown.rs

//! Automatic-upgrade lockdown
//!
//! A driver bumped behind our back by unattended-upgrades can desync from the
//! loaded module and take the fleet node offline. This stage inserts
//! package-name-prefix exclusions for the driver/toolkit families into the
//! unattended-upgrades blacklist, preserving whatever entries the node
//! already carries. Guarded by a marker entry so re-runs never duplicate.

use crate::error::{Error, Result};
use crate::guard;
use std::fs;
use std::path::Path;
use tracing::info;

/// Unattended-upgrades config, relative to the system root
const APT_CONF_DEST: &str = "etc/apt/apt.conf.d/50unattended-upgrades";

const BLACKLIST_BLOCK: &str = "Unattended-Upgrade::Package-Blacklist";

/// Prefix rules for the installed package families
const EXCLUDED_PREFIXES: &[&str] = &["nvidia-", "cuda-", "libnvidia-"];

/// Marker whose presence means the exclusions are already in place
const MARKER: &str = "\"nvidia-\";";

/// Insert the exclusion rules into existing config content.
///
/// Returns `None` when the marker is already present (nothing to do). When
/// the blacklist block exists its entries are preserved and ours are added at
/// the top of the block; otherwise a fresh block is appended. A blacklist
/// header with no opening brace is malformed and rejected rather than
/// shadowed by a second block.
pub fn add_exclusions(content: &str) -> Result<Option<String>> {
    if content.contains(MARKER) {
        return Ok(None);
    }

    let rules: String = EXCLUDED_PREFIXES
        .iter()
        .map(|prefix| format!("    \"{}\";\n", prefix))
        .collect();

    if let Some(block_start) = content.find(BLACKLIST_BLOCK) {
        let Some(brace) = content[block_start..].find('{') else {
            return Err(Error::Parse(format!(
                "malformed unattended-upgrades config: {} has no opening brace",
                BLACKLIST_BLOCK
            )));
        };
        let insert_at = block_start + brace + 1;
        let mut updated = String::with_capacity(content.len() + rules.len() + 1);
        updated.push_str(&content[..insert_at]);
        updated.push('\n');
        updated.push_str(&rules);
        updated.push_str(content[insert_at..].trim_start_matches('\n'));
        return Ok(Some(updated));
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(BLACKLIST_BLOCK);
    updated.push_str(" {\n");
    updated.push_str(&rules);
    updated.push_str("};\n");
    Ok(Some(updated))
}

/// Apply the lockdown to the node's unattended-upgrades config.
pub fn apply(root: &Path) -> Result<()> {
    let path = root.join(APT_CONF_DEST);
    let existing = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let changed = guard::ensure_with(
        "upgrade exclusion rules",
        || Ok(existing.contains(MARKER)),
        || {
            // add_exclusions only returns None when the marker is present,
            // which the guard has already ruled out
            if let Some(updated) = add_exclusions(&existing)? {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, updated)?;
            }
            Ok(())
        },
    )?;

    if changed {
        info!("excluded {:?} from automatic upgrades", EXCLUDED_PREFIXES);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING_CONF: &str = r#"// Automatically upgrade packages from these origin patterns
Unattended-Upgrade::Allowed-Origins {
    "${distro_id}:${distro_codename}-security";
};

Unattended-Upgrade::Package-Blacklist {
    "libc6";
    "linux-image-*";
};
"#;

    #[test]
    fn test_inserts_into_existing_block_preserving_entries() {
        let updated = add_exclusions(EXISTING_CONF).unwrap().unwrap();
        for prefix in EXCLUDED_PREFIXES {
            assert!(updated.contains(&format!("\"{}\";", prefix)));
        }
        // Pre-existing entries survive
        assert!(updated.contains("\"libc6\";"));
        assert!(updated.contains("\"linux-image-*\";"));
        // The unrelated block is untouched
        assert!(updated.contains("Allowed-Origins"));
    }

    #[test]
    fn test_second_pass_is_identity() {
        let updated = add_exclusions(EXISTING_CONF).unwrap().unwrap();
        assert!(add_exclusions(&updated).unwrap().is_none());
    }

    #[test]
    fn test_appends_block_when_missing() {
        let updated = add_exclusions("").unwrap().unwrap();
        assert!(updated.contains("Unattended-Upgrade::Package-Blacklist {"));
        assert!(updated.contains("\"cuda-\";"));
        assert!(updated.trim_end().ends_with("};"));
    }

    #[test]
    fn test_header_without_brace_is_rejected() {
        // A blacklist header with its brace missing must not gain a second,
        // shadowing block
        let malformed = "Unattended-Upgrade::Package-Blacklist\n";
        let err = add_exclusions(malformed).unwrap_err();
        assert!(err.to_string().contains("no opening brace"));
    }

    #[test]
    fn test_apply_is_idempotent_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let path = root.join(APT_CONF_DEST);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, EXISTING_CONF).unwrap();

        apply(root).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("\"nvidia-\";"));

        apply(root).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_apply_creates_file_when_absent() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();

        apply(root).unwrap();
        let content = fs::read_to_string(root.join(APT_CONF_DEST)).unwrap();
        assert!(content.contains("\"libnvidia-\";"));
    }
}
