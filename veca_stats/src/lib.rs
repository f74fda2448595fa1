#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
mod adjacency;
mod kde;
mod kernel;
mod linkage;
mod moran;

pub use adjacency::{kth_median_distance, SampleGraph};
pub use kde::{weighted_kde, KdeGrid};
pub use kernel::{Kernel, UnknownKernelError};
pub use linkage::{complete_linkage, Dendrogram, Merge};
pub use moran::{morans_i, morans_i_many};

/// A point in the 2D embedding
pub type Point = [f64; 2];

#[inline]
pub(crate) fn euclidean(a: &Point, b: &Point) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}
