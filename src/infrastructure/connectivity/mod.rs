pub mod probe;

pub use probe::HttpConnectivityProbe;
