pub mod body;
pub mod bond;
pub mod cell_list;
pub mod config;
pub mod error;
pub mod gradient;
pub mod init_config;
pub mod io;
pub mod profiler;
pub mod random;
pub mod scenario;
pub mod simulation;
pub mod species;
pub mod trafficking;
pub mod units;

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
