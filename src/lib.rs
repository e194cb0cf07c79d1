//! # docshift
//!
//! Convert between images, PDF, Word and PowerPoint documents, and merge or
//! split PDFs.
//!
//! ## Why this crate?
//!
//! Each conversion is a short pipeline over libraries that already do the
//! hard part: PDFium renders, copies and authors PDFs, docx-rs writes Word
//! documents, and Office containers are plain ZIP archives of XML. This crate
//! is the orchestration between them: staging and validating inputs, driving
//! the libraries page by page, laying out text, and emitting the resulting
//! files in order.
//!
//! ## Operations
//!
//! | Kind | Input | Output |
//! |------|-------|--------|
//! | `ImageToDoc`  | ≥ 1 JPEG images | `converted_images.pdf`, one image per page |
//! | `DocToImage`  | 1 PDF | `page_1.jpg` … `page_N.jpg` |
//! | `DocToWord`   | 1 PDF | `converted_document.docx`, page text per page |
//! | `WordToDoc`   | 1 `.docx` | `converted_document.pdf`, raw text reflowed |
//! | `MergeDoc`    | ≥ 2 PDFs | `merged_document.pdf` |
//! | `SplitDoc`    | 1 PDF + optional range | `page_N.pdf` each, or `extracted_pages.pdf` |
//! | `SlidesToDoc` | 1 `.pptx` | `converted_presentation.pdf`, one section per slide |
//!
//! ## Pipeline Overview
//!
//! ```text
//! path / URL
//!  │
//!  ├─ 1. Input    load local file or download (pipeline::input)
//!  ├─ 2. Stage    type filter + cardinality (stager)
//!  ├─ 3. Run      per-kind pipeline on a blocking thread (pipeline)
//!  │              └─ capability traits: PDFium, docx-rs, zip + quick-xml
//!  └─ 4. Emit     artifacts in order (emit)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshift::{
//!     Capabilities, ConversionConfig, ConversionSession, DirectoryEmitter, OperationKind,
//! };
//! use docshift::pipeline::input::load_input;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = ConversionSession::new(
//!         OperationKind::MergeDoc,
//!         ConversionConfig::default(),
//!         Capabilities::native(),
//!     );
//!     session.stage(load_input("a.pdf", 120).await?)?;
//!     session.stage(load_input("b.pdf", 120).await?)?;
//!     assert!(session.trigger_enabled());
//!
//!     let mut out = DirectoryEmitter::new("out")?;
//!     let output = session.run(&mut out).await?;
//!     eprintln!("wrote {:?}", output.filenames());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docshift` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docshift = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capability;
pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod range;
pub mod session;
pub mod stager;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::{
    ArchiveReader, Capabilities, PageSource, PdfAuthor, PdfPageCopier, PdfReader, WordAuthor,
    WordBlock, WordTextExtractor,
};
pub use config::{ConversionConfig, ConversionConfigBuilder, SplitMode, TextLayout};
pub use convert::{convert, convert_sync, convert_to_dir, inspect, inspect_bytes, stage_all};
pub use emit::{decode_data_url, DirectoryEmitter, MemoryEmitter, OutputEmitter};
pub use error::ConvertError;
pub use output::{Artifact, ConversionOutput, ConversionStats};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use range::{parse_range, PageSelection};
pub use session::{ConversionSession, TriggerWatch};
pub use stager::{Accepted, FileStager, OperationKind, RejectedReason, StagedFile};
pub use stream::{convert_stream, ArtifactStream};
