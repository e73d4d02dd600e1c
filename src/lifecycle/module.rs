//! Application modules.

use crate::app::Application;
use crate::error::BoxError;

/// A unit of application functionality driven through the lifecycle phases.
///
/// Every callback defaults to doing nothing.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Called once, before any module is started. Register plugins and
    /// shared services here.
    fn init(&self, _app: &Application) -> Result<(), BoxError> {
        Ok(())
    }

    fn start(&self, _app: &Application) -> Result<(), BoxError> {
        Ok(())
    }

    fn stop(&self, _app: &Application) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after the logger tree has picked up a new configuration.
    fn reload(&self, _app: &Application) -> Result<(), BoxError> {
        Ok(())
    }
}
