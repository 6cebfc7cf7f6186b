// AI Edit Proposal Generator.
// Builds bounded-context prompts from part of a resume, sends them through a
// `TextGenerator`, and validates the reply into an `EditProposal`.
// Nothing here touches the stored document: applying a proposal is the patch gate's job.

pub mod bullet;
pub mod handlers;
pub mod prompts;
pub mod proposal;
pub mod section;
pub mod tailor;

pub use proposal::EditProposal;
