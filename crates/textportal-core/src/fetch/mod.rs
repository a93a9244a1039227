mod fetcher;
mod retry;
mod weather;

pub use fetcher::ResilientFetcher;
pub use retry::{BusyPhrase, NoSoftFailure, RetryPolicy, SoftFailure};
pub use weather::{strip_ansi, WeatherFetcher};
