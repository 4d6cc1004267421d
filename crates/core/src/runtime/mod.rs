mod shutdown;

pub use shutdown::ShutdownGuard;
