//! # thawslope-forcing
//!
//! Climate forcing for permafrost hillslope runs.
//!
//! The simulation core only ever asks two narrow questions of its climate
//! inputs, and this crate answers both:
//!
//! - [`ForcingLookup`] - "what were the temperature mean, temperature amplitude
//!   and snow thickness in year Y?" ([`ForcingSeries`] implements it)
//! - [`ActiveLayerSolver`] - "how deep does the ground thaw under that
//!   forcing?" ([`StefanSolver`] implements it)
//!
//! Annual series can be loaded directly from JSON, or aggregated from a monthly
//! series of air temperature and snow water equivalent with
//! [`MonthlyForcing::aggregate_annual`].
//!
//! ## Example
//!
//! ```no_run
//! use thawslope_forcing::{ActiveLayerSolver, ForcingLookup, MonthlyForcing, StefanSolver};
//!
//! let monthly = MonthlyForcing::from_json_file("forcing/era5_monthly.json")?;
//! let series = monthly.aggregate_annual(0.3)?;
//! let forcing = series.forcing_for_year(2010)?;
//! let alt = StefanSolver::default().active_layer_thickness(&forcing)?;
//! println!("2010 active layer: {:.2} m", alt);
//! # Ok::<(), thawslope_forcing::ForcingError>(())
//! ```

mod alt;
mod error;
mod monthly;
mod series;

pub use alt::{thawing_index, ActiveLayerSolver, StefanSolver};
pub use error::ForcingError;
pub use monthly::{MonthlyForcing, MonthlyRecord, DEFAULT_SNOW_DENSITY_RATIO};
pub use series::{Forcing, ForcingLookup, ForcingRecord, ForcingSeries};

/// Result type for forcing operations.
pub type Result<T> = std::result::Result<T, ForcingError>;
