//! 提取 -> 翻译 完整流程测试
//!
//! 在临时目录中搭建 input/translate_json/output/temp 四个目录，
//! 用真实的 zip 容器走一遍提取与回注。

use std::path::{Path, PathBuf};

use idml_translator::archive::{extract_package, write_package};
use idml_translator::pipeline::{SkipReason, SkippedPackage};
use idml_translator::{Extractor, IdmlError, TranslationDictionary, Translator, TranslatorConfig};
use tempfile::TempDir;

const DESIGNMAP: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Document DOMVersion="15.0" Self="d">
	<idPkg:Spread src="Spreads/Spread_ua.xml" />
	<idPkg:Story src="Stories/Story_u10.xml" />
</Document>"#;

const SPREAD: &str = r#"<idPkg:Spread>
<Spread Self="ua">
	<TextFrame Self="tf1" ParentStory="u10" ContentType="TextType">
	</TextFrame>
</Spread>
</idPkg:Spread>"#;

const STORY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<idPkg:Story DOMVersion="15.0">
	<Story Self="u10">
		<ParagraphStyleRange>
			<CharacterStyleRange>
				<Content>Good morning</Content>
			</CharacterStyleRange>
			<CharacterStyleRange>
				<Content>See you soon</Content>
			</CharacterStyleRange>
		</ParagraphStyleRange>
	</Story>
</idPkg:Story>"#;

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// 在 `input/brochure/en.idml` 放一个最小的 IDML 包
fn setup(root: &Path) -> TranslatorConfig {
    let config = TranslatorConfig {
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        dictionary_dir: root.join("translate_json"),
        temp_dir: root.join("temp"),
    };

    let unpacked = root.join("fixture");
    write_file(&unpacked, "mimetype", "application/vnd.adobe.indesign-idml-package");
    write_file(&unpacked, "designmap.xml", DESIGNMAP);
    write_file(&unpacked, "Spreads/Spread_ua.xml", SPREAD);
    write_file(&unpacked, "Stories/Story_u10.xml", STORY);
    write_package(&unpacked, &config.input_dir.join("brochure").join("en.idml")).unwrap();

    config
}

fn read_story(idml: &Path, dest: &Path) -> String {
    extract_package(idml, dest).unwrap();
    std::fs::read_to_string(dest.join("Stories/Story_u10.xml")).unwrap()
}

#[test]
fn test_extract_then_translate() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());

    let run = Extractor::new(&config).run().unwrap();
    assert!(run.skipped.is_empty());
    let summaries = run.summaries;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].source_language, "en");
    assert_eq!(summaries[0].stats.entry_count, 2);
    assert!(summaries[0].backup_path.is_none());

    let source_path: PathBuf = config.dictionary_dir.join("brochure/en/translation.json");
    assert_eq!(summaries[0].dictionary_path, source_path);
    let source = TranslationDictionary::load(&source_path).unwrap();
    assert_eq!(
        source.page("page-1").unwrap().story("u10").unwrap().get("Good morning"),
        Some("Good morning")
    );

    write_file(
        &config.dictionary_dir,
        "brochure/it/translation.json",
        r#"{ "page-1": { "u10": { "Good morning": "Buongiorno", "See you soon": "A presto" } } }"#,
    );
    std::fs::create_dir_all(config.dictionary_dir.join("brochure/notes")).unwrap();

    let run = Translator::new(&config).run().unwrap();
    assert!(run.skipped.is_empty());
    let results = run.summaries;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].report.language, "it");
    assert_eq!(results[0].report.applied(), 2);

    let output = config.output_dir.join("brochure");
    assert_eq!(results[0].output_path, output.join("it.idml"));
    assert!(output.join("en.idml").is_file());

    let translated = read_story(&output.join("it.idml"), &temp_dir.path().join("check"));
    assert_eq!(
        translated,
        STORY
            .replace("Good morning", "Buongiorno")
            .replace("See you soon", "A presto")
    );
}

#[test]
fn test_second_extraction_backs_up_dictionary() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());

    Extractor::new(&config).run().unwrap();
    let summaries = Extractor::new(&config).run().unwrap().summaries;

    let backup = summaries[0].backup_path.clone().unwrap();
    assert!(backup.is_file());
}

#[test]
fn test_missing_dictionary_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());

    Extractor::new(&config).run().unwrap();
    std::fs::create_dir_all(config.dictionary_dir.join("brochure/de")).unwrap();

    match Translator::new(&config).run() {
        Err(IdmlError::MissingDictionary { package, language, .. }) => {
            assert_eq!(package, "brochure");
            assert_eq!(language, "de");
        }
        other => panic!("expected MissingDictionary, got {:?}", other),
    }
}

#[test]
fn test_directory_without_idml_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());
    std::fs::create_dir_all(config.input_dir.join("empty")).unwrap();

    let run = Extractor::new(&config).run().unwrap();
    assert_eq!(run.summaries.len(), 1);
    assert_eq!(run.summaries[0].package, "brochure");
    assert_eq!(
        run.skipped,
        vec![SkippedPackage {
            package: "empty".to_string(),
            reason: SkipReason::NoIdml(config.input_dir.join("empty")),
        }]
    );
}

#[test]
fn test_package_without_dictionaries_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());

    let run = Translator::new(&config).run().unwrap();
    assert!(run.summaries.is_empty());
    assert_eq!(
        run.skipped,
        vec![SkippedPackage {
            package: "brochure".to_string(),
            reason: SkipReason::NoDictionaries(config.dictionary_dir.join("brochure")),
        }]
    );
    assert!(!config.output_dir.join("brochure").exists());
}
