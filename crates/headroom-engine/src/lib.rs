//! headroom-engine — the placement engine.
//!
//! Consumes unplaced workload instances from the synthetic cluster's change
//! feed, decides a placement target for each via a pluggable
//! [`PlacementAlgorithm`], and terminates each decision through the injected
//! [`PlacementAcceptor`] capability (on success) or a terminal condition
//! write on the instance (on failure). The engine never commits anything to
//! real infrastructure; what "accepting" a placement means is entirely up
//! to the acceptor.
//!
//! # Components
//!
//! - **`scorer`** — node scoring and feasibility (bin-packing, affinity, balance)
//! - **`algorithm`** — the `PlacementAlgorithm` trait and default bin-packing impl
//! - **`bind`** — the `PlacementAcceptor` capability and rejection signal
//! - **`engine`** — the run loop (event intake, bind retry policy, shutdown)

pub mod algorithm;
pub mod bind;
pub mod engine;
pub mod scorer;

pub use algorithm::{BinPackingAlgorithm, Placement, PlacementAlgorithm};
pub use bind::{BindRejection, PlacementAcceptor};
pub use engine::{EngineConfig, PlacementEngine};
pub use scorer::{NodeScore, ScoringWeights, rank_nodes, score_node};
