// Compilation Cache & Compiler.
// HASH → CACHE_LOOKUP → hit, or COMPILE → STORE on a miss.
// Artifacts are keyed by the SHA-256 of the exact LaTeX source and never invalidated.

pub mod artifacts;
pub mod compiler;
pub mod handlers;
pub mod hash;
pub mod service;

pub use artifacts::{ArtifactStore, LocalArtifactStore, S3ArtifactStore};
pub use compiler::PdfLatex;
pub use service::{CompileOutcome, CompileService};
