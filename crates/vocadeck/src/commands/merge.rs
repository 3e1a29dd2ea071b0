//! CSV merge command.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use vocadeck_data::{load_dataset, write_merged, DataSource, Dataset, Format};

use crate::config::{config_root, load_config};

/// What merging one language produced.
#[derive(Debug, Default)]
struct LanguageMerge {
    /// Written file and row count
    written: Option<(PathBuf, usize)>,
    warnings: Vec<String>,
}

/// Merge one language and write `merged_<lang>.csv` next to the vocab file.
fn merge_language(source: &DataSource, dataset: &Dataset, lang: &str) -> Result<LanguageMerge> {
    let Some(report) = dataset.merge_report(lang) else {
        return Ok(LanguageMerge {
            written: None,
            warnings: vec![format!(
                "No translation file ({}), skipping",
                source.translation_path(lang).display()
            )],
        });
    };

    let mut warnings = report.warnings();
    if report.rows.is_empty() {
        warnings.push("Nothing to merge".to_string());
        return Ok(LanguageMerge {
            written: None,
            warnings,
        });
    }

    let path = source.base_dir().join(format!("merged_{}.csv", lang));
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_merged(file, &report.rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(LanguageMerge {
        written: Some((path, report.rows.len())),
        warnings,
    })
}

/// Run the merge command.
pub fn run(config_path: &Path, languages: Vec<String>) -> Result<()> {
    let file_config = load_config(config_path)?;
    let root = config_root(config_path);
    let source = file_config.data_source(&root);
    let languages = if languages.is_empty() {
        file_config.deck.languages.clone()
    } else {
        languages
    };

    let format = source.format.or_else(|| Format::from_path(&source.vocab));
    if format != Some(Format::Csv) {
        bail!(
            "merge needs CSV vocabulary data, {} is not a CSV file",
            source.vocab.display()
        );
    }

    let dataset = load_dataset(&source, &languages)
        .with_context(|| format!("Failed to load {}", source.vocab.display()))?;

    for lang in &languages {
        let outcome = merge_language(&source, &dataset, lang)?;
        for warning in &outcome.warnings {
            tracing::warn!("[{}] {}", lang, warning);
        }
        if let Some((path, rows)) = outcome.written {
            tracing::info!("Wrote {} ({} rows)", path.display(), rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_merged_file_per_language() {
        let temp = tempdir().unwrap();
        let data = temp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(
            data.join("vocab_jp.csv"),
            "expression,reading,sentence\n猫,ねこ,猫がいる。\n犬,いぬ,\n",
        )
        .unwrap();
        fs::write(
            data.join("translations_en.csv"),
            "expression,meaning,sentence_translation\n猫,cat,There is a cat.\n鳥,bird,\n",
        )
        .unwrap();
        let config = temp.path().join("vocadeck.toml");
        fs::write(&config, "[data]\nvocab = \"data/vocab_jp.csv\"\n").unwrap();

        run(&config, Vec::new()).unwrap();

        let merged = fs::read_to_string(data.join("merged_en.csv")).unwrap();
        assert!(merged.starts_with("expression,"));
        assert!(merged.contains("猫,ねこ"));
        assert!(merged.contains("There is a cat."));
        assert!(!merged.contains("鳥"));
        assert!(!data.join("merged_de.csv").exists());
    }

    #[test]
    fn warns_about_untranslated_vocabulary() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("vocab_jp.csv"),
            "expression,reading\n猫,ねこ\n犬,いぬ\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("translations_en.csv"),
            "expression,meaning\n猫,cat\n鳥,bird\n",
        )
        .unwrap();
        let source = DataSource::new(temp.path().join("vocab_jp.csv"));
        let languages = vec!["en".to_string(), "de".to_string()];
        let dataset = load_dataset(&source, &languages).unwrap();

        let en = merge_language(&source, &dataset, "en").unwrap();
        let de = merge_language(&source, &dataset, "de").unwrap();

        assert_eq!(
            en.written,
            Some((temp.path().join("merged_en.csv"), 1))
        );
        assert!(en
            .warnings
            .contains(&"Expressions in vocabulary but not in translations: 犬".to_string()));
        assert!(en
            .warnings
            .contains(&"Expressions in translations but not in vocabulary: 鳥".to_string()));
        assert_eq!(de.written, None);
        assert!(de.warnings[0].starts_with("No translation file"));
    }

    #[test]
    fn rejects_nested_data() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("vocadeck.toml");

        let err = run(&config, Vec::new()).unwrap_err();

        assert!(err.to_string().contains("not a CSV file"));
    }
}
