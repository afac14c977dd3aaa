//! NoneStream trait and stream descriptors
//!
//! A none-stream is a family of individually persisted, rarely-changing
//! records (UI templates, alarm rules, ...). Each family is described once by
//! a [`StreamDefinition`] and routed by its [`NoneStream::KIND`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ContractError, JsonStorageBuilder, StorageBuilder, StreamName};

/// Identifier of the domain area owning a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const UI_TEMPLATE: ScopeId = ScopeId(10);
    pub const PROFILE_TASK: ScopeId = ScopeId(26);
    pub const ALARM_RULE: ScopeId = ScopeId(41);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Retention granularity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Downsampling {
    /// Finest interval; none-streams always use it
    #[default]
    Second,
    Minute,
    Hour,
    Day,
}

/// Descriptor of a record family: name, owning scope and retention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream name, used for disable matching and model naming
    pub name: StreamName,
    /// Owning scope
    pub scope_id: ScopeId,
    /// Retention granularity
    #[serde(default)]
    pub downsampling: Downsampling,
}

impl StreamDescriptor {
    /// Descriptor for a none-stream; downsampling is fixed to [`Downsampling::Second`]
    pub fn none_stream(name: impl Into<StreamName>, scope_id: ScopeId) -> Self {
        Self {
            name: name.into(),
            scope_id,
            downsampling: Downsampling::Second,
        }
    }
}

/// A none-stream record type
///
/// # Examples
/// ```
/// use contracts::NoneStream;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct DashboardLayout {
///     id: String,
///     bucket: i64,
/// }
///
/// impl NoneStream for DashboardLayout {
///     const KIND: &'static str = "dashboard_layout";
///
///     fn entity_id(&self) -> String {
///         self.id.clone()
///     }
///
///     fn time_bucket(&self) -> i64 {
///         self.bucket
///     }
/// }
/// ```
pub trait NoneStream: fmt::Debug + Send + Sync + 'static {
    /// Stable routing key; one worker binding per kind
    const KIND: &'static str;

    /// Storage identity of this entity
    fn entity_id(&self) -> String;

    /// Second-granularity bucket used for expiry
    fn time_bucket(&self) -> i64;
}

/// Factory producing the storage builder for a record type.
///
/// Supplied at compile time alongside the descriptor; a failure is a fatal
/// configuration error during registration.
pub type BuilderFactory<R> = fn() -> Result<Box<dyn StorageBuilder<R>>, ContractError>;

/// Everything needed to register a record type
pub struct StreamDefinition<R: NoneStream> {
    pub descriptor: StreamDescriptor,
    pub builder: BuilderFactory<R>,
}

impl<R: NoneStream> StreamDefinition<R> {
    pub fn new(descriptor: StreamDescriptor, builder: BuilderFactory<R>) -> Self {
        Self {
            descriptor,
            builder,
        }
    }

    /// Definition converting records through serde
    pub fn json(descriptor: StreamDescriptor) -> Self
    where
        R: Serialize + serde::de::DeserializeOwned,
    {
        Self::new(descriptor, JsonStorageBuilder::<R>::factory)
    }
}

impl<R: NoneStream> Clone for StreamDefinition<R> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            builder: self.builder,
        }
    }
}

impl<R: NoneStream> fmt::Debug for StreamDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDefinition")
            .field("kind", &R::KIND)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
