pub mod compress;
pub mod hamming;
pub mod huffman;
pub mod intoxicate;
pub mod plan;
pub mod tag;
pub mod timelock;
pub mod traits;

pub use compress::*;
pub use hamming::*;
pub use huffman::*;
pub use intoxicate::*;
pub use plan::*;
pub use tag::*;
pub use timelock::*;
pub use traits::*;
