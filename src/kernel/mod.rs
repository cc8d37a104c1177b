//! Input resolution kernel: decoding, mappings, typeahead and the resolver loop.

pub mod decoder;
pub mod dispatch;
pub mod keymap;
pub mod notation;
pub mod resolver;
pub mod services;
pub mod session;
pub mod typeahead;

pub use decoder::{decode, Decoded, KeyDecoder, StreamDecoder};
pub use dispatch::{Dispatcher, ModeKeys};
pub use keymap::{
    BufferId, LocalPrecedence, Lookup, LookupContext, MapError, MapRhs, MapScope, MappingEntry,
    MappingSpec, MappingTable, Remap, MAXMAPLEN,
};
pub use notation::{render, Notation, NotationError};
pub use resolver::{CancelReason, Resolution, Resolver, ResolverConfig, ResolverState};
pub use session::{ChannelSource, InputSession, InputSource, SessionConfig, SessionError};
pub use typeahead::{Origin, QueuedKey, RemapPolicy, Typeahead};
