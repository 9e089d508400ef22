use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::labels::{ClassLabel, NUM_CLASSES};

/// Reads a labels file exported next to the checkpoint (one class name per
/// line, in output order) and checks it against the built-in label order.
pub fn load_class_mapping(file_path: &Path) -> Result<Vec<ClassLabel>> {
    let file = File::open(file_path)
        .with_context(|| format!("opening label file {}", file_path.display()))?;
    let reader = BufReader::new(file);

    let mut mapping = Vec::with_capacity(NUM_CLASSES);
    for (id, line) in reader.lines().enumerate() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let label: ClassLabel = name
            .parse()
            .with_context(|| format!("{}:{}", file_path.display(), id + 1))?;
        mapping.push(label);
    }

    check_alignment(&mapping)?;
    Ok(mapping)
}

pub fn check_alignment(mapping: &[ClassLabel]) -> Result<()> {
    if mapping.len() != NUM_CLASSES {
        bail!("label file lists {} classes, model head has {}", mapping.len(), NUM_CLASSES);
    }
    for (index, (found, expected)) in mapping.iter().zip(ClassLabel::ALL.iter()).enumerate() {
        if found != expected {
            bail!("label order mismatch at index {index}: file has {found:?}, expected {expected:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_order_is_aligned() {
        assert!(check_alignment(&ClassLabel::ALL).is_ok());
    }

    #[test]
    fn swapped_labels_are_rejected() {
        let mut labels = ClassLabel::ALL.to_vec();
        labels.swap(0, 1);
        let err = check_alignment(&labels).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn truncated_mapping_is_rejected() {
        assert!(check_alignment(&ClassLabel::ALL[..16]).is_err());
    }

    #[test]
    fn reads_label_file_from_disk() {
        let path = std::env::temp_dir().join(format!("agrivision-labels-{}.txt", std::process::id()));
        let body: Vec<&str> = ClassLabel::ALL.iter().map(|l| l.name()).collect();
        std::fs::write(&path, body.join("\n") + "\n").unwrap();

        let mapping = load_class_mapping(&path).unwrap();
        assert_eq!(mapping, ClassLabel::ALL.to_vec());

        std::fs::remove_file(&path).unwrap();
    }
}
