//! 가격 수집을 위한 도메인 모델.

mod classification;
mod price;
mod profile;

pub use classification::*;
pub use price::*;
pub use profile::*;
