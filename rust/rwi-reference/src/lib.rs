//! Word references of a reverse word index.
//!
//! A word reference (posting) records that a document contains a term, together
//! with the statistics used for ranking. It exists in two forms:
//!
//! - [`ReferenceRow`]: the compact, fixed 40-byte stored form.
//! - [`ReferenceVars`]: the expanded form used while merging and ranking. It keeps
//!   every occurrence position and supports the [`join`](ReferenceVars::join),
//!   [`min_with`](ReferenceVars::min_with) and [`max_with`](ReferenceVars::max_with)
//!   merge operations.
//!
//! A [`ReferenceContainer`] holds the references of one term in document key order.
//! [`index_abstract`] summarizes a container for exchange with other peers, and
//! [`Materializer`] expands a container into a stream of expanded references,
//! spreading large containers over worker threads.

pub mod config;
pub mod container;
pub mod index_abstract;
pub mod layout;
pub mod materialize;
pub mod reference;
pub mod row;
pub mod vars;

pub use config::{AbstractConfig, MaterializeConfig};
pub use container::ReferenceContainer;
pub use index_abstract::{AbstractConsensus, EncodedAbstract};
pub use materialize::{Materializer, ReferenceStream, StreamItem};
pub use reference::Reference;
pub use row::{ReferenceRow, ReferenceRowBuilder};
pub use vars::ReferenceVars;
