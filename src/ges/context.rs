use core::fmt;
use std::sync::{Arc, Weak};

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use ges_backend::{GesParams, GradedEncoding};

use super::Level;
use crate::error::GesError;

struct Shared<B> {
    backend: B,
    params: GesParams,
    top: Level,
}

/// A graded encoding instance. Owns the backend state; every element it issues
/// keeps only a weak back-reference, so releasing the context invalidates them.
pub struct Context<B: GradedEncoding> {
    shared: Arc<Shared<B>>,
}

/// An immutable leveled element issued by a [`Context`].
pub struct GradedElement<B: GradedEncoding> {
    ctx: Weak<Shared<B>>,
    index: Level,
    raw: B::Encoding,
}

/// Persisted form of a graded element: its level and the backend's opaque bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingBlob {
    pub index: Level,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

impl<B: GradedEncoding> Context<B> {
    /// Set up fresh secret parameters.
    pub fn setup<R: RngCore + CryptoRng>(
        params: &GesParams,
        rng: &mut R,
    ) -> Result<Self, GesError> {
        params.check().map_err(GesError::ParameterError)?;
        let backend = B::setup(params, rng)?;
        tracing::debug!(
            slots = params.num_slots,
            top = ?params.top_index,
            "graded encoding context created"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                backend,
                params: params.clone(),
                top: Level::new(params.top_index.clone()),
            }),
        })
    }

    pub fn params(&self) -> &GesParams {
        &self.shared.params
    }

    pub fn top_index(&self) -> &Level {
        &self.shared.top
    }

    pub fn num_slots(&self) -> usize {
        self.shared.params.num_slots
    }

    /// Embed `value` at `index`.
    pub fn encode(&self, value: &B::Scalar, index: &Level) -> Result<GradedElement<B>, GesError> {
        if !index.fits_within(&self.shared.top) {
            return Err(GesError::InvalidIndex {
                index: index.clone(),
                top: self.shared.top.clone(),
            });
        }
        let raw = self.shared.backend.encode(value, index.components())?;
        Ok(GradedElement {
            ctx: Arc::downgrade(&self.shared),
            index: index.clone(),
            raw,
        })
    }

    /// Embed `value` directly at the top level.
    pub fn encode_top(&self, value: &B::Scalar) -> Result<GradedElement<B>, GesError> {
        let top = self.shared.top.clone();
        self.encode(value, &top)
    }

    /// Whether `e` was issued by this context.
    pub fn owns(&self, e: &GradedElement<B>) -> bool {
        core::ptr::eq(e.ctx.as_ptr(), Arc::as_ptr(&self.shared))
    }

    /// Rebuild an element from its persisted form.
    pub fn element_from_blob(&self, blob: &EncodingBlob) -> Result<GradedElement<B>, GesError> {
        if !blob.index.fits_within(&self.shared.top) {
            return Err(GesError::InvalidIndex {
                index: blob.index.clone(),
                top: self.shared.top.clone(),
            });
        }
        let raw = self.shared.backend.read_encoding(&blob.bytes)?;
        Ok(GradedElement {
            ctx: Arc::downgrade(&self.shared),
            index: blob.index.clone(),
            raw,
        })
    }

    /// Tear the context down. Elements it issued fail with `UseAfterRelease` afterwards.
    pub fn release(self) {
        tracing::debug!(
            live_refs = Arc::weak_count(&self.shared),
            "graded encoding context released"
        );
    }
}

impl<B: GradedEncoding> fmt::Debug for Context<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("params", &self.shared.params)
            .finish_non_exhaustive()
    }
}

impl<B: GradedEncoding> GradedElement<B> {
    pub fn index(&self) -> &Level {
        &self.index
    }

    fn shared(&self) -> Result<Arc<Shared<B>>, GesError> {
        self.ctx.upgrade().ok_or(GesError::UseAfterRelease)
    }

    fn joint(&self, other: &Self) -> Result<Arc<Shared<B>>, GesError> {
        let shared = self.shared()?;
        other.shared()?;
        if !Weak::ptr_eq(&self.ctx, &other.ctx) {
            return Err(GesError::ContextMismatch);
        }
        Ok(shared)
    }

    /// Sum of two elements at the same level.
    pub fn add(&self, other: &Self) -> Result<Self, GesError> {
        let shared = self.joint(other)?;
        if self.index != other.index {
            return Err(GesError::LevelMismatch {
                left: self.index.clone(),
                right: other.index.clone(),
            });
        }
        let raw = shared.backend.add(&self.raw, &other.raw)?;
        Ok(Self {
            ctx: self.ctx.clone(),
            index: self.index.clone(),
            raw,
        })
    }

    /// Product of two elements; levels add and must stay within the top index.
    pub fn mul(&self, other: &Self) -> Result<Self, GesError> {
        let shared = self.joint(other)?;
        let index = self
            .index
            .checked_add(&other.index)
            .filter(|sum| sum.fits_within(&shared.top))
            .ok_or_else(|| GesError::LevelOverflow {
                left: self.index.clone(),
                right: other.index.clone(),
                top: shared.top.clone(),
            })?;
        let raw = shared.backend.mul(&self.raw, &other.raw)?;
        Ok(Self {
            ctx: self.ctx.clone(),
            index,
            raw,
        })
    }

    /// Whether the element sits exactly at the top index.
    pub fn is_top(&self) -> Result<bool, GesError> {
        Ok(self.index == self.shared()?.top)
    }

    fn top_level(&self) -> Result<Arc<Shared<B>>, GesError> {
        let shared = self.shared()?;
        if self.index != shared.top {
            return Err(GesError::NotTopLevel(self.index.clone()));
        }
        Ok(shared)
    }

    /// Zero test; the only observable about an element's content.
    pub fn is_zero(&self) -> Result<bool, GesError> {
        let shared = self.top_level()?;
        Ok(shared.backend.is_zero(&self.raw)?)
    }

    /// Canonical bytes of a top-level element, for key derivation.
    pub fn extract(&self) -> Result<Vec<u8>, GesError> {
        let shared = self.top_level()?;
        Ok(shared.backend.extract(&self.raw)?)
    }

    pub fn to_blob(&self) -> Result<EncodingBlob, GesError> {
        let shared = self.shared()?;
        let mut bytes = Vec::new();
        shared.backend.write_encoding(&self.raw, &mut bytes)?;
        Ok(EncodingBlob {
            index: self.index.clone(),
            bytes,
        })
    }
}

impl<B: GradedEncoding> Clone for GradedElement<B> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            index: self.index.clone(),
            raw: self.raw.clone(),
        }
    }
}

impl<B: GradedEncoding> fmt::Debug for GradedElement<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradedElement")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
