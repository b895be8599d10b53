pub mod carbon;
pub mod mutation;
pub mod pickup;
pub mod shipping;

pub use crate::domain::model::{Cart, CarbonEstimate};
pub use crate::domain::ports::{
    CarbonEstimateCache, CarbonEstimateClient, CartStateClient, LogisticsClient,
};
pub use crate::utils::error::Result;
