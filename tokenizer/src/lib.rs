//! Text-side preprocessing for the sentiment model: the bundled word→id
//! table, fixed-length sequence encoding, and training-batch construction.

pub mod batch;
pub mod error;
pub mod word_index;

pub use batch::{BatchEntry, LabeledSample, TrainingBatch, build_batch};
pub use error::{Result, TokenizerErr};
pub use word_index::WordIndex;

/// Every encoded sequence has exactly this many slots.
pub const SEQ_LEN: usize = 100;

/// A fixed-length, zero-padded sequence of token ids.
pub type TokenSequence = [i32; SEQ_LEN];

/// Encodes `text` into a [`TokenSequence`].
///
/// Lowercases, splits on whitespace (newlines included), maps each word
/// through the table and drops words the table does not know — there is no
/// out-of-vocabulary id. The first [`SEQ_LEN`] recognized ids are kept and
/// the tail is zero-padded.
///
/// Total and deterministic; a missing word table is the caller's
/// precondition, not this function's.
pub fn tokenize(text: &str, index: &WordIndex) -> TokenSequence {
    let mut seq = [0i32; SEQ_LEN];
    let lowered = text.to_lowercase();
    let ids = lowered.split_whitespace().filter_map(|w| index.id(w));

    for (slot, id) in seq.iter_mut().zip(ids) {
        *slot = id;
    }

    seq
}
