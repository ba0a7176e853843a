pub mod errors;
pub mod logging;
pub mod shutdown;

pub use errors::{ApiError, ApiResult};
pub use logging::init_logging;
pub use shutdown::ShutdownCoordinator;
