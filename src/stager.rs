//! File staging: which files are selected for an operation.
//!
//! Each [`OperationKind`] has an input filter and a cardinality. Single-file
//! operations keep only the most recently accepted file; multi-file operations
//! append in acceptance order, which is also the order pages are produced in.
//! A [`FileStager`] never holds a file its filter rejected.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::ConvertError;

/// The seven conversions docshift performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// JPEG images → one PDF, one page per image.
    ImageToDoc,
    /// PDF → one JPEG per page.
    DocToImage,
    /// PDF → Word document, one paragraph per page.
    DocToWord,
    /// Word document → PDF of reflowed plain text.
    WordToDoc,
    /// Several PDFs → one PDF.
    MergeDoc,
    /// PDF → one PDF per page, or one PDF of selected pages.
    SplitDoc,
    /// PowerPoint deck → PDF with one titled section per slide.
    SlidesToDoc,
}

/// How many files an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
}

/// How a file's type is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    /// Declared MIME type must be one of these.
    Mime(&'static [&'static str]),
    /// File name must end with this suffix (ASCII case-insensitive). Used for
    /// formats whose MIME type is unreliable.
    Extension(&'static str),
}

const JPEG_MIME: &[&str] = &["image/jpeg", "image/jpg"];
const PDF_MIME: &[&str] = &["application/pdf"];

impl InputFilter {
    pub fn accepts(&self, file: &StagedFile) -> bool {
        match self {
            InputFilter::Mime(types) => file
                .mime_hint
                .as_deref()
                .map(|m| types.iter().any(|t| t.eq_ignore_ascii_case(m)))
                .unwrap_or(false),
            InputFilter::Extension(suffix) => {
                let name = file.name.as_bytes();
                let suffix = suffix.as_bytes();
                name.len() >= suffix.len()
                    && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
            }
        }
    }
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::ImageToDoc,
        OperationKind::DocToImage,
        OperationKind::DocToWord,
        OperationKind::WordToDoc,
        OperationKind::MergeDoc,
        OperationKind::SplitDoc,
        OperationKind::SlidesToDoc,
    ];

    pub fn cardinality(self) -> Cardinality {
        match self {
            OperationKind::ImageToDoc | OperationKind::MergeDoc => Cardinality::Multiple,
            _ => Cardinality::Single,
        }
    }

    /// Staged files required before the trigger is enabled.
    pub fn min_inputs(self) -> usize {
        match self {
            OperationKind::MergeDoc => 2,
            _ => 1,
        }
    }

    pub fn input_filter(self) -> InputFilter {
        match self {
            OperationKind::ImageToDoc => InputFilter::Mime(JPEG_MIME),
            OperationKind::DocToImage
            | OperationKind::DocToWord
            | OperationKind::MergeDoc
            | OperationKind::SplitDoc => InputFilter::Mime(PDF_MIME),
            OperationKind::WordToDoc => InputFilter::Extension(".docx"),
            OperationKind::SlidesToDoc => InputFilter::Extension(".pptx"),
        }
    }

    /// Human description of accepted input, used in rejection messages.
    pub fn expected_input(self) -> &'static str {
        match self {
            OperationKind::ImageToDoc => "a JPEG image",
            OperationKind::WordToDoc => "a Word (.docx) file",
            OperationKind::SlidesToDoc => "a PowerPoint (.pptx) file",
            _ => "a PDF file",
        }
    }

    /// Label of the idle trigger control.
    pub fn trigger_label(self) -> &'static str {
        match self {
            OperationKind::ImageToDoc
            | OperationKind::WordToDoc
            | OperationKind::SlidesToDoc => "Convert to PDF",
            OperationKind::DocToImage => "Convert to JPEG",
            OperationKind::DocToWord => "Convert to Word",
            OperationKind::MergeDoc => "Merge PDFs",
            OperationKind::SplitDoc => "Split PDF",
        }
    }

    /// Label of the trigger while a run is in flight.
    pub fn busy_label(self) -> &'static str {
        match self {
            OperationKind::MergeDoc => "Merging...",
            OperationKind::SplitDoc => "Splitting...",
            _ => "Converting...",
        }
    }

    /// Generic notice shown when a run fails.
    pub fn failure_notice(self) -> &'static str {
        match self {
            OperationKind::ImageToDoc => "Error converting images.",
            OperationKind::DocToImage => "Error converting PDF.",
            OperationKind::DocToWord => "Error converting PDF to Word.",
            OperationKind::WordToDoc => "Error converting Word to PDF.",
            OperationKind::MergeDoc => "Error merging PDFs.",
            OperationKind::SplitDoc => "Error splitting PDF.",
            OperationKind::SlidesToDoc => "Error converting presentation.",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::ImageToDoc => "images-to-pdf",
            OperationKind::DocToImage => "pdf-to-images",
            OperationKind::DocToWord => "pdf-to-word",
            OperationKind::WordToDoc => "word-to-pdf",
            OperationKind::MergeDoc => "merge",
            OperationKind::SplitDoc => "split",
            OperationKind::SlidesToDoc => "slides-to-pdf",
        };
        f.write_str(name)
    }
}

/// A file selected by the user, held in memory until conversion or reset.
#[derive(Clone)]
pub struct StagedFile {
    pub name: String,
    /// MIME type as declared by the source (download header or content sniff).
    pub mime_hint: Option<String>,
    pub bytes: Bytes,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, mime_hint: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_hint: mime_hint.map(str::to_string),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("mime_hint", &self.mime_hint)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Outcome of a successful [`FileStager::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    /// Position of the file in the staged list.
    pub index: usize,
    /// A previously staged file was replaced (single-file operations).
    pub replaced: bool,
}

/// Why a file was not staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectedReason {
    WrongType {
        name: String,
        expected: &'static str,
    },
}

impl fmt::Display for RejectedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectedReason::WrongType { expected, .. } => write!(f, "Please upload {expected}."),
        }
    }
}

impl std::error::Error for RejectedReason {}

impl From<RejectedReason> for ConvertError {
    fn from(reason: RejectedReason) -> Self {
        match reason {
            RejectedReason::WrongType { name, expected } => {
                ConvertError::WrongInputType { name, expected }
            }
        }
    }
}

/// The files currently selected for one operation.
#[derive(Debug)]
pub struct FileStager {
    kind: OperationKind,
    files: Vec<StagedFile>,
}

impl FileStager {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Stage `file` if it passes the operation's filter.
    ///
    /// Rejected files leave the stager untouched.
    pub fn accept(&mut self, file: StagedFile) -> Result<Accepted, RejectedReason> {
        if !self.kind.input_filter().accepts(&file) {
            warn!(
                "Rejected '{}' for {} (declared type {:?})",
                file.name, self.kind, file.mime_hint
            );
            return Err(RejectedReason::WrongType {
                name: file.name,
                expected: self.kind.expected_input(),
            });
        }

        debug!("Staged '{}' ({} bytes) for {}", file.name, file.len(), self.kind);
        match self.kind.cardinality() {
            Cardinality::Single => {
                let replaced = !self.files.is_empty();
                self.files.clear();
                self.files.push(file);
                Ok(Accepted { index: 0, replaced })
            }
            Cardinality::Multiple => {
                self.files.push(file);
                Ok(Accepted {
                    index: self.files.len() - 1,
                    replaced: false,
                })
            }
        }
    }

    pub fn staged_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_ready(&self) -> bool {
        self.files.len() >= self.kind.min_inputs()
    }

    /// Error describing why the stager is not ready, if it is not.
    pub fn readiness_error(&self) -> Option<ConvertError> {
        if self.is_ready() {
            None
        } else if self.files.is_empty() {
            Some(ConvertError::NothingStaged { kind: self.kind })
        } else {
            Some(ConvertError::NotEnoughInputs {
                kind: self.kind,
                required: self.kind.min_inputs(),
                staged: self.files.len(),
            })
        }
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn reset(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> StagedFile {
        StagedFile::new(name, Some("application/pdf"), b"%PDF-1.7".to_vec())
    }

    fn jpeg(name: &str, mime: &str) -> StagedFile {
        StagedFile::new(name, Some(mime), vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn pdf_slot_rejects_other_types() {
        let mut stager = FileStager::new(OperationKind::DocToImage);
        let png = StagedFile::new("pic.png", Some("image/png"), vec![1, 2, 3]);
        let err = stager.accept(png).unwrap_err();
        assert_eq!(
            err,
            RejectedReason::WrongType {
                name: "pic.png".into(),
                expected: "a PDF file"
            }
        );
        assert_eq!(stager.staged_count(), 0);
        assert!(!stager.is_ready());
    }

    #[test]
    fn missing_mime_is_rejected_for_mime_filters() {
        let mut stager = FileStager::new(OperationKind::SplitDoc);
        let unknown = StagedFile::new("doc.pdf", None, b"%PDF".to_vec());
        assert!(stager.accept(unknown).is_err());
    }

    #[test]
    fn jpeg_accepts_both_spellings() {
        let mut stager = FileStager::new(OperationKind::ImageToDoc);
        stager.accept(jpeg("a.jpg", "image/jpeg")).unwrap();
        stager.accept(jpeg("b.jpg", "image/jpg")).unwrap();
        assert!(stager.accept(jpeg("c.png", "image/png")).is_err());
        assert_eq!(stager.staged_count(), 2);
        assert_eq!(stager.files()[1].name, "b.jpg");
    }

    #[test]
    fn single_slot_replaces() {
        let mut stager = FileStager::new(OperationKind::DocToWord);
        let first = stager.accept(pdf("one.pdf")).unwrap();
        assert!(!first.replaced);
        let second = stager.accept(pdf("two.pdf")).unwrap();
        assert!(second.replaced);
        assert_eq!(second.index, 0);
        assert_eq!(stager.staged_count(), 1);
        assert_eq!(stager.files()[0].name, "two.pdf");
    }

    #[test]
    fn merge_ready_exactly_at_two() {
        let mut stager = FileStager::new(OperationKind::MergeDoc);
        assert!(!stager.is_ready());
        stager.accept(pdf("a.pdf")).unwrap();
        assert!(!stager.is_ready());
        assert!(matches!(
            stager.readiness_error(),
            Some(ConvertError::NotEnoughInputs { staged: 1, required: 2, .. })
        ));
        stager.accept(pdf("b.pdf")).unwrap();
        assert!(stager.is_ready());
        assert!(stager.readiness_error().is_none());
    }

    #[test]
    fn extension_filter_ignores_case_and_mime() {
        let mut word = FileStager::new(OperationKind::WordToDoc);
        assert!(word
            .accept(StagedFile::new("Report.DOCX", None, vec![b'P', b'K']))
            .is_ok());
        assert!(word
            .accept(StagedFile::new("report.doc", Some("application/msword"), vec![1]))
            .is_err());

        let mut slides = FileStager::new(OperationKind::SlidesToDoc);
        assert!(slides
            .accept(StagedFile::new("deck.pptx", Some("application/zip"), vec![b'P']))
            .is_ok());
        assert!(slides
            .accept(StagedFile::new("pptx", None, vec![b'P']))
            .is_err());
    }

    #[test]
    fn reset_clears() {
        let mut stager = FileStager::new(OperationKind::MergeDoc);
        stager.accept(pdf("a.pdf")).unwrap();
        stager.accept(pdf("b.pdf")).unwrap();
        stager.reset();
        assert_eq!(stager.staged_count(), 0);
        assert!(matches!(
            stager.readiness_error(),
            Some(ConvertError::NothingStaged { .. })
        ));
    }

    #[test]
    fn rejection_converts_to_wrong_input_type() {
        let err: ConvertError = RejectedReason::WrongType {
            name: "x.txt".into(),
            expected: "a PDF file",
        }
        .into();
        assert!(matches!(err, ConvertError::WrongInputType { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn labels_and_notices() {
        assert_eq!(OperationKind::MergeDoc.busy_label(), "Merging...");
        assert_eq!(OperationKind::DocToImage.trigger_label(), "Convert to JPEG");
        assert_eq!(
            OperationKind::WordToDoc.failure_notice(),
            "Error converting Word to PDF."
        );
        assert_eq!(OperationKind::SlidesToDoc.to_string(), "slides-to-pdf");
    }
}
