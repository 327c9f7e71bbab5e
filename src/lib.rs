pub mod config {
    pub mod settings;
}
pub mod middleware {
    pub mod metrics;
    pub mod path_logger;
}
pub mod routes {
    pub mod boxes;
    pub mod health;
    pub mod instruments;
}
pub mod services {
    pub mod boxes;
    pub mod candles;
    pub mod instruments;
}
pub mod utils {
    pub mod errors;
    pub mod types;
}
