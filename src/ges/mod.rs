//! Index-disciplined graded encoding front end.
//!
//! Wraps any [`GradedEncoding`](ges_backend::GradedEncoding) backend and enforces
//! the level rules the backend itself does not check:
//! - `add` only at equal index vectors
//! - `mul` sums index vectors and must stay within the top index
//! - zero test / extraction only at the top index
//! - operands must come from the same, still-live context

mod context;
mod level;

pub use context::{Context, EncodingBlob, GradedElement};
pub use level::Level;
