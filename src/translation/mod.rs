/*!
 * Text translation for extracted PDF blocks.
 *
 * This module turns block texts into translated texts. It is split into
 * several submodules:
 *
 * - `segmenter`: Translatable / protected partition of block text
 * - `masking`: Placeholders for acronyms embedded in translatable text
 * - `fixes`: Deterministic post-translation replacements
 * - `cache`: Provider clients cached per language pair
 * - `cancellation`: Cooperative cancellation flag
 * - `orchestrator`: Retry loop, unmasking and progress reporting
 */

// Re-export main types for easier usage
pub use self::cancellation::CancellationToken;
pub use self::fixes::ModernFixes;
pub use self::orchestrator::{Orchestrator, ProgressFn, RetryPolicy};
pub use self::segmenter::{Segment, segment, should_skip_translation};

// Submodules
pub mod cache;
pub mod cancellation;
pub mod fixes;
pub mod masking;
pub mod orchestrator;
pub mod segmenter;
