//! Pipeline integration tests driven through the public `convert` and
//! `convert_stream` entry points, with a fake PDF engine and the real docx
//! and zip providers.

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use docshift::capability::WordAuthor;
use docshift::capability::{DocxWriter, ZipArchiveReader};
use docshift::{
    convert, convert_stream, convert_sync, inspect, ArchiveReader, ConversionConfig,
    ConversionProgressCallback, ConvertError, MemoryEmitter, OperationKind, OutputEmitter,
    SplitMode, StagedFile, WordBlock, WordTextExtractor,
};
use futures::StreamExt;

fn split_config(range: &str) -> ConversionConfig {
    ConversionConfig::builder()
        .split_mode(SplitMode::Range(range.into()))
        .build()
        .unwrap()
}

// ── Merge ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_keeps_staging_order() {
    init_logs();
    let (caps, _) = fake_caps();
    let files = vec![
        pdf_file("a.pdf", &["a1", "a2"]),
        pdf_file("b.pdf", &["b1"]),
        pdf_file("c.pdf", &["c1", "c2", "c3"]),
    ];

    let out = convert(OperationKind::MergeDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["merged_document.pdf"]);
    assert_eq!(
        pages_of(&out.artifacts[0].bytes),
        vec!["a1", "a2", "b1", "c1", "c2", "c3"]
    );
    assert_eq!(out.stats.input_files, 3);
    assert_eq!(out.stats.units_processed, 3);
}

#[derive(Default)]
struct Units(Mutex<Vec<(usize, usize)>>);

impl ConversionProgressCallback for Units {
    fn on_unit_complete(&self, unit: usize, total: usize) {
        self.0.lock().unwrap().push((unit, total));
    }
}

#[tokio::test]
async fn merge_reports_progress_per_input_file() {
    let units = Arc::new(Units::default());
    let config = ConversionConfig::builder()
        .progress_callback(units.clone())
        .build()
        .unwrap();
    let (caps, engine) = fake_caps();
    let files = vec![
        pdf_file("a.pdf", &["a1", "a2"]),
        pdf_file("b.pdf", &["b1"]),
        pdf_file("c.pdf", &["c1"]),
        pdf_file("d.pdf", &["d1", "d2"]),
    ];

    convert(OperationKind::MergeDoc, files, &config, &caps)
        .await
        .unwrap();

    assert_eq!(*units.0.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    // Still a single copy into one output document.
    assert_eq!(engine.calls(), vec!["copy_pages"]);
}

// ── Split ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn split_all_emits_one_pdf_per_page() {
    let (caps, _) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3", "p4", "p5"])];

    let out = convert(OperationKind::SplitDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(
        out.filenames(),
        vec!["page_1.pdf", "page_2.pdf", "page_3.pdf", "page_4.pdf", "page_5.pdf"]
    );
    for (i, artifact) in out.artifacts.iter().enumerate() {
        assert_eq!(pages_of(&artifact.bytes), vec![format!("p{}", i + 1)]);
    }
}

#[tokio::test]
async fn split_range_extracts_selected_pages() {
    let (caps, _) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3", "p4", "p5"])];

    let out = convert(OperationKind::SplitDoc, files, &split_config("5, 1, 3, 3"), &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["extracted_pages.pdf"]);
    assert_eq!(pages_of(&out.artifacts[0].bytes), vec!["p1", "p3", "p5"]);
}

#[tokio::test]
async fn split_range_outside_document_fails_before_copy() {
    let (caps, engine) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3", "p4", "p5"])];

    let err = convert(OperationKind::SplitDoc, files, &split_config("9-12"), &caps)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConvertError::EmptyRange { total_pages: Some(5), .. }
    ));
    assert_eq!(engine.calls(), vec!["page_count"]);
}

#[tokio::test]
async fn tokenless_range_never_opens_the_document() {
    let (caps, engine) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["p1"])];

    let err = convert(OperationKind::SplitDoc, files, &split_config("first, last"), &caps)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(engine.calls().is_empty());
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_pages_become_numbered_jpegs() {
    let (caps, _) = fake_caps();
    let config = ConversionConfig::builder().render_scale(3.0).build().unwrap();
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3"])];

    let out = convert(OperationKind::DocToImage, files, &config, &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["page_1.jpg", "page_2.jpg", "page_3.jpg"]);
    for artifact in &out.artifacts {
        assert_eq!(artifact.mime_type, "image/jpeg");
        let img = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (30, 30));
    }
}

#[tokio::test]
async fn images_become_one_page_each_in_order() {
    let (caps, _) = fake_caps();
    let files = vec![jpeg_file("wide.jpg", 64, 32), jpeg_file("tall.jpg", 32, 64)];

    let out = convert(OperationKind::ImageToDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["converted_images.pdf"]);
    assert_eq!(
        pages_of(&out.artifacts[0].bytes),
        vec!["<img 64x32>", "<img 32x64>"]
    );
}

// ── Word ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_text_lands_in_word_document_page_by_page() {
    let (caps, _) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["first   page text", "second page"])];

    let out = convert(OperationKind::DocToWord, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    let docx = &out.artifacts[0];
    assert_eq!(docx.filename, "converted_document.docx");
    assert_eq!(
        docx.mime_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let text = caps.word_text.extract_raw_text(&docx.bytes).unwrap();
    let first = text.find("first page text").expect("first page missing");
    let second = text.find("second page").expect("second page missing");
    assert!(first < second);
}

fn recording_word_caps() -> (docshift::Capabilities, Arc<RecordingWordAuthor>) {
    let (mut caps, _) = fake_caps();
    let author = Arc::new(RecordingWordAuthor::default());
    caps.word_author = author.clone();
    (caps, author)
}

#[tokio::test]
async fn page_breaks_sit_between_pages_only() {
    let (caps, author) = recording_word_caps();

    for labels in [&["one", "two"][..], &["solo"][..]] {
        convert(
            OperationKind::DocToWord,
            vec![pdf_file("r.pdf", labels)],
            &ConversionConfig::default(),
            &caps,
        )
        .await
        .unwrap();
    }

    let documents = author.documents.lock().unwrap();
    assert_eq!(
        documents[0],
        vec![
            WordBlock::Paragraph("one".into()),
            WordBlock::PageBreak,
            WordBlock::Paragraph("two".into()),
        ]
    );
    assert_eq!(documents[1], vec![WordBlock::Paragraph("solo".into())]);
}

#[tokio::test]
async fn word_text_is_reflowed_into_pdf() {
    let (caps, engine) = fake_caps();
    let docx = DocxWriter
        .build(&[
            WordBlock::Paragraph("Dear reader,".into()),
            WordBlock::Paragraph("Thanks.".into()),
        ])
        .unwrap();
    let files = vec![StagedFile::new("letter.DOCX", None, docx)];

    let out = convert(OperationKind::WordToDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["converted_document.pdf"]);
    let pages = pages_of(&out.artifacts[0].bytes);
    assert_eq!(pages.len(), 1);
    let lines: Vec<&str> = pages[0].split('/').filter(|l| !l.is_empty()).collect();
    assert_eq!(lines, vec!["Dear reader,", "Thanks."]);
    assert!(engine.calls().contains(&"build:1".to_string()));
}

// ── Slides ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn slides_follow_numeric_order() {
    let (caps, _) = fake_caps();
    let (one, two, ten) = (slide_xml(&["one", "uno"]), slide_xml(&["two"]), slide_xml(&["ten"]));
    let layout = slide_xml(&["layout"]);
    let deck = zip_of(&[
        ("[Content_Types].xml", "<Types/>"),
        ("ppt/slides/slide10.xml", ten.as_str()),
        ("ppt/slides/slide2.xml", two.as_str()),
        ("ppt/slides/slide1.xml", one.as_str()),
        ("ppt/slideLayouts/slideLayout1.xml", layout.as_str()),
    ]);
    let files = vec![StagedFile::new("deck.pptx", None, deck)];

    let out = convert(OperationKind::SlidesToDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(out.filenames(), vec!["converted_presentation.pdf"]);
    assert_eq!(
        pages_of(&out.artifacts[0].bytes),
        vec!["Slide 1/one/uno", "Slide 2/two", "Slide 3/ten"]
    );
    assert_eq!(out.stats.units_processed, 3);
}

#[tokio::test]
async fn textless_deck_gets_placeholder_after_last_slide() {
    let (caps, _) = fake_caps();
    let blank = slide_xml(&[]);
    let deck = zip_of(&[
        ("ppt/slides/slide1.xml", blank.as_str()),
        ("ppt/slides/slide2.xml", blank.as_str()),
    ]);
    let files = vec![StagedFile::new("deck.pptx", None, deck)];

    let out = convert(OperationKind::SlidesToDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(
        pages_of(&out.artifacts[0].bytes),
        vec![
            "Slide 1",
            "Slide 2/No extractable text found in this presentation."
        ]
    );
}

#[tokio::test]
async fn deck_without_slides_is_one_blank_page() {
    let (caps, engine) = fake_caps();
    let deck = zip_of(&[("[Content_Types].xml", "<Types/>")]);
    let files = vec![StagedFile::new("empty.pptx", None, deck)];

    convert(OperationKind::SlidesToDoc, files, &ConversionConfig::default(), &caps)
        .await
        .unwrap();

    assert_eq!(engine.calls(), vec!["build:1"]);
}

#[tokio::test]
async fn slide_entry_with_inflated_declared_size_is_an_archive_error() {
    let (caps, engine) = fake_caps();
    let deck = zip_declaring("ppt/slides/slide1.xml", &slide_xml(&["hi"]), 0xFFFF_FFF0);

    let err = ZipArchiveReader
        .read_text(&deck, "ppt/slides/slide1.xml")
        .unwrap_err();
    assert!(matches!(err, ConvertError::Archive { .. }), "got {err:?}");

    let err = convert(
        OperationKind::SlidesToDoc,
        vec![StagedFile::new("deck.pptx", None, deck)],
        &ConversionConfig::default(),
        &caps,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ConvertError::Archive { .. }), "got {err:?}");
    assert!(engine.calls().is_empty());
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_artifacts_in_emission_order() {
    let (caps, _) = fake_caps();
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3", "p4"])];

    let names: Vec<String> = convert_stream(
        OperationKind::SplitDoc,
        files,
        &ConversionConfig::default(),
        &caps,
    )
    .unwrap()
    .map(|item| item.unwrap().filename)
    .collect()
    .await;

    assert_eq!(names, vec!["page_1.pdf", "page_2.pdf", "page_3.pdf", "page_4.pdf"]);
}

#[tokio::test]
async fn stream_ends_with_the_failure() {
    let (caps, _) = caps_with(FakePdfEngine {
        fail_render_at: Some(2),
        ..Default::default()
    });
    let files = vec![pdf_file("r.pdf", &["p1", "p2", "p3", "p4"])];

    let items: Vec<_> = convert_stream(
        OperationKind::DocToImage,
        files,
        &ConversionConfig::default(),
        &caps,
    )
    .unwrap()
    .collect()
    .await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().filename, "page_1.jpg");
    assert_eq!(items[1].as_ref().unwrap().filename, "page_2.jpg");
    assert!(matches!(items[2], Err(ConvertError::Render { page: 3, .. })));
}

#[test]
fn stream_rejects_invalid_staging_up_front() {
    let (caps, _) = fake_caps();
    let result = convert_stream(
        OperationKind::MergeDoc,
        vec![pdf_file("a.pdf", &["a1"])],
        &ConversionConfig::default(),
        &caps,
    );
    assert!(matches!(
        result,
        Err(ConvertError::NotEnoughInputs { staged: 1, .. })
    ));
}

// ── Failure reporting ────────────────────────────────────────────────────────

#[derive(Default)]
struct Notices(Mutex<Vec<String>>);

impl ConversionProgressCallback for Notices {
    fn on_conversion_failed(&self, _kind: OperationKind, notice: &str) {
        self.0.lock().unwrap().push(notice.to_string());
    }
}

#[tokio::test]
async fn pipeline_failure_reports_generic_notice() {
    let notices = Arc::new(Notices::default());
    let config = ConversionConfig::builder()
        .progress_callback(notices.clone())
        .build()
        .unwrap();
    let (caps, _) = fake_caps();
    let files = vec![StagedFile::new("x.pdf", Some("application/pdf"), b"garbage".to_vec())];

    let err = convert(OperationKind::DocToWord, files, &config, &caps)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::Decode { .. }));
    assert_eq!(*notices.0.lock().unwrap(), vec!["Error converting PDF to Word."]);
}

#[test]
fn stream_validation_failure_reports_generic_notice() {
    let notices = Arc::new(Notices::default());
    let config = ConversionConfig::builder()
        .progress_callback(notices.clone())
        .build()
        .unwrap();
    let (caps, engine) = fake_caps();

    let result = convert_stream(
        OperationKind::MergeDoc,
        vec![pdf_file("a.pdf", &["a1"])],
        &config,
        &caps,
    );

    assert!(result.is_err());
    assert_eq!(*notices.0.lock().unwrap(), vec!["Error merging PDFs."]);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn inspect_counts_pages_of_a_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("three.pdf");
    std::fs::write(&path, fake_pdf(&["p1", "p2", "p3"])).unwrap();
    let config = ConversionConfig::builder()
        .download_timeout_secs(5)
        .build()
        .unwrap();
    let (caps, _) = fake_caps();

    let pages = inspect(path.to_string_lossy(), &config, &caps).await.unwrap();
    assert_eq!(pages, 3);
}

// ── Emission ─────────────────────────────────────────────────────────────────

#[test]
fn artifacts_survive_data_url_emission() {
    let (caps, _) = fake_caps();
    let out = convert_sync(
        OperationKind::MergeDoc,
        vec![pdf_file("a.pdf", &["a1"]), pdf_file("b.pdf", &["b1"])],
        &ConversionConfig::default(),
        &caps,
    )
    .unwrap();

    let mut sink = MemoryEmitter::new();
    for artifact in &out.artifacts {
        sink.emit_data_url(&artifact.to_data_url(), &artifact.filename)
            .unwrap();
    }
    assert_eq!(sink.artifacts(), out.artifacts.as_slice());
}

#[test]
fn convert_can_be_driven_with_block_on() {
    let (caps, _) = fake_caps();
    let out = tokio_test::block_on(convert(
        OperationKind::DocToWord,
        vec![pdf_file("r.pdf", &["only page"])],
        &ConversionConfig::default(),
        &caps,
    ));
    assert_eq!(out.unwrap().stats.artifacts, 1);
}
